use std::time::Duration;

use consulate_store::{OwnerProof, Session, SessionOptions, StoreError};
use consulate_types::RecoveryWindow;

use crate::common::{APIKEY, EMAIL, PASSWORD, TestStore, new_network, open_at, seed_owner};

#[test]
fn key_rotation_invalidates_previous_keys() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let accounts = session.accounts();

    accounts.set_apikey(EMAIL, PASSWORD, "k2").unwrap();
    accounts.reset_apikey(EMAIL, "k2", "k3").unwrap();

    let err = accounts.reset_apikey(EMAIL, "k2", "k4").unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized { .. }));

    let networks = session.networks();
    assert!(networks.list(OwnerProof::new(EMAIL, APIKEY)).unwrap().is_empty());
    assert!(networks.list(OwnerProof::new(EMAIL, "k2")).unwrap().is_empty());
    assert_eq!(networks.list(OwnerProof::new(EMAIL, "k3")).unwrap().len(), 1);
}

#[test]
fn state_survives_reopen() {
    let store = TestStore::new();
    {
        let session = store.open();
        seed_owner(&session);
        session.accounts().reset_apikey(EMAIL, APIKEY, "k2").unwrap();
        session.close().unwrap();
    }

    let session = store.open();
    let listed = session
        .networks()
        .list(OwnerProof::new(EMAIL, "k2"))
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "home");

    let err = session
        .accounts()
        .create("Owner@Example.com", "pw", "k9")
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[test]
fn pending_account_cannot_rotate_or_recover() {
    let store = TestStore::new();
    let session = store.open();
    let accounts = session.accounts();
    accounts.create(EMAIL, PASSWORD, APIKEY).unwrap();

    assert!(accounts.set_apikey(EMAIL, PASSWORD, "k2").is_err());
    assert!(accounts.reset_apikey(EMAIL, APIKEY, "k2").is_err());
    assert!(accounts.begin_recovery(EMAIL, "r1").is_err());

    accounts.activate(EMAIL, APIKEY).unwrap();
    let err = accounts.activate(EMAIL, APIKEY).unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized { op: "activate" }));
}

#[test]
fn recovery_round_trip_replaces_password() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let accounts = session.accounts();

    accounts.begin_recovery(EMAIL, "r1").unwrap();
    assert!(accounts.begin_recovery(EMAIL, "r2").is_err());
    assert!(accounts.complete_recovery(EMAIL, "new-pw", "r2").is_err());

    accounts.complete_recovery(EMAIL, "new-pw", "r1").unwrap();
    assert!(accounts.complete_recovery(EMAIL, "newer-pw", "r1").is_err());

    assert!(accounts.set_apikey(EMAIL, PASSWORD, "k2").is_err());
    accounts.set_apikey(EMAIL, "new-pw", "k2").unwrap();
}

#[test]
fn expired_recovery_key_is_rejected_and_can_be_reissued() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let accounts = session.accounts();
    accounts.begin_recovery(EMAIL, "r1").unwrap();

    let raw = rusqlite::Connection::open(store.path()).unwrap();
    raw.execute(
        "UPDATE account SET recover_date = datetime('now', '-25 hours')",
        [],
    )
    .unwrap();

    let err = accounts
        .complete_recovery(EMAIL, "new-pw", "r1")
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized { .. }));

    accounts.begin_recovery(EMAIL, "r2").unwrap();
    accounts.complete_recovery(EMAIL, "new-pw", "r2").unwrap();
}

#[test]
fn configured_window_controls_reissue() {
    let store = TestStore::new();
    let options = SessionOptions {
        recovery: RecoveryWindow::new(Duration::from_secs(60), Duration::from_secs(600)),
        ..SessionOptions::default()
    };
    let session = Session::open(store.path(), options).unwrap();
    seed_owner(&session);
    let accounts = session.accounts();
    accounts.begin_recovery(EMAIL, "r1").unwrap();

    let raw = rusqlite::Connection::open(store.path()).unwrap();
    raw.execute(
        "UPDATE account SET recover_date = datetime('now', '-2 minutes')",
        [],
    )
    .unwrap();

    // Past the one minute interval, inside the default hour.
    assert!(open_at(&store.path()).accounts().begin_recovery(EMAIL, "r2").is_err());
    accounts.begin_recovery(EMAIL, "r2").unwrap();
}

#[test]
fn networks_of_other_owners_are_invisible() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let accounts = session.accounts();
    accounts.create("other@example.com", "pw", "ok").unwrap();
    accounts.activate("other@example.com", "ok").unwrap();
    session
        .networks()
        .create("other@example.com", &new_network("n2", "home"))
        .unwrap();

    let mine = session
        .networks()
        .list(OwnerProof::new(EMAIL, APIKEY))
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].uid.as_str(), "n1");

    assert!(
        session
            .networks()
            .list(OwnerProof::new(EMAIL, "ok"))
            .unwrap()
            .is_empty()
    );
}
