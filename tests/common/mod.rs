//! Shared fixtures: file-backed stores in a temp directory, seeded owners.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use consulate_store::{Session, SessionOptions};
use consulate_types::{KeyPair, NetworkUid, NewNetwork, NodeUid};
use tempfile::TempDir;

pub const EMAIL: &str = "owner@example.com";
pub const PASSWORD: &str = "hunter2";
pub const APIKEY: &str = "k1";

/// A database file that outlives the sessions opened on it.
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Self { dir };
        // Create the schema once so later sessions only attach.
        store.open().close().expect("close bootstrap session");
        store
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("store").join("consulate.db")
    }

    pub fn open(&self) -> Session {
        open_at(&self.path())
    }
}

pub fn open_at(path: &Path) -> Session {
    Session::open(path, SessionOptions::default()).expect("open session")
}

pub fn network_uid(uid: &str) -> NetworkUid {
    NetworkUid::new(uid).expect("network uid")
}

pub fn node_uid(uid: &str) -> NodeUid {
    NodeUid::new(uid).expect("node uid")
}

pub fn new_network(uid: &str, description: &str) -> NewNetwork {
    NewNetwork {
        uid: network_uid(uid),
        description: description.to_string(),
        subnet: "10.1.0.0".to_string(),
        netmask: "255.255.0.0".to_string(),
        embassy: KeyPair::new("embassy-cert", "embassy-key"),
        passport: KeyPair::new("passport-cert", "passport-key"),
    }
}

/// Active owner `EMAIL` (key `APIKEY`) with network `n1` "home".
pub fn seed_owner(session: &Session) {
    let accounts = session.accounts();
    accounts.create(EMAIL, PASSWORD, APIKEY).expect("create account");
    accounts.activate(EMAIL, APIKEY).expect("activate account");
    session
        .networks()
        .create(EMAIL, &new_network("n1", "home"))
        .expect("create network");
}
