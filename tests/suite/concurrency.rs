//! Racing sessions on one database file, one session per thread.

use std::collections::BTreeSet;
use std::sync::Barrier;
use std::thread;

use consulate_store::{OwnerProof, StoreError, StoreResult};
use consulate_types::EmbassySerial;

use crate::common::{APIKEY, EMAIL, PASSWORD, TestStore, network_uid, node_uid, open_at, seed_owner};

const WORKERS: usize = 8;
const ADVANCES_PER_WORKER: usize = 25;

#[test]
fn concurrent_advances_yield_distinct_serials() {
    let store = TestStore::new();
    seed_owner(&store.open());
    let path = store.path();
    let barrier = Barrier::new(WORKERS);

    let serials: Vec<i64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                scope.spawn(|| {
                    let session = open_at(&path);
                    let networks = session.networks();
                    let uid = network_uid("n1");
                    barrier.wait();
                    (0..ADVANCES_PER_WORKER)
                        .map(|_| networks.advance_embassy_serial(&uid).unwrap().value())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    let total = WORKERS * ADVANCES_PER_WORKER;
    let distinct: BTreeSet<_> = serials.iter().copied().collect();
    assert_eq!(distinct.len(), total);

    let base = EmbassySerial::BASE.value();
    let expected: BTreeSet<_> = (base + 1..=base + total as i64).collect();
    assert_eq!(distinct, expected);

    let final_serial = store
        .open()
        .networks()
        .embassy(&network_uid("n1"))
        .unwrap()
        .serial;
    assert_eq!(final_serial.value(), base + total as i64);
}

#[test]
fn concurrent_deletes_have_one_winner() {
    let store = TestStore::new();
    {
        let session = store.open();
        seed_owner(&session);
        session
            .nodes()
            .create(&network_uid("n1"), &node_uid("u1"), "prov-1", "laptop")
            .unwrap();
    }
    let path = store.path();
    let barrier = Barrier::new(WORKERS);

    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                scope.spawn(|| {
                    let session = open_at(&path);
                    barrier.wait();
                    session
                        .nodes()
                        .delete("laptop", "home", OwnerProof::new(EMAIL, APIKEY))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(outcomes.iter().all(|outcome| match outcome {
        Ok(deleted) => deleted.node_uid == node_uid("u1"),
        Err(err) => matches!(err, StoreError::Unauthorized { .. }),
    }));
}

#[test]
fn concurrent_key_rotations_from_one_key_have_one_winner() {
    let store = TestStore::new();
    seed_owner(&store.open());
    let path = store.path();
    let barrier = Barrier::new(WORKERS);

    let outcomes: Vec<(String, StoreResult<()>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let path = &path;
                let barrier = &barrier;
                scope.spawn(move || {
                    let session = open_at(path);
                    let new_key = format!("k-{worker}");
                    barrier.wait();
                    let outcome = session.accounts().reset_apikey(EMAIL, APIKEY, &new_key);
                    (new_key, outcome)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let mut winners = Vec::new();
    for (key, outcome) in outcomes {
        match outcome {
            Ok(()) => winners.push(key),
            Err(err) => assert!(
                matches!(err, StoreError::Unauthorized { op: "reset_apikey" }),
                "{err:?}"
            ),
        }
    }
    assert_eq!(winners.len(), 1);
    let session = store.open();
    session
        .accounts()
        .reset_apikey(EMAIL, &winners[0], "k-final")
        .unwrap();
    assert!(session.accounts().set_apikey(EMAIL, PASSWORD, "k-again").is_ok());
}
