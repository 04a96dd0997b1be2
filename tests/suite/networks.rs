use consulate_store::{OwnerProof, StoreError};
use consulate_types::EmbassySerial;

use crate::common::{APIKEY, EMAIL, TestStore, network_uid, new_network, seed_owner};

#[test]
fn lookup_by_owner_and_description() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let networks = session.networks();

    let home = networks.get(EMAIL, "home").unwrap();
    assert_eq!(home.uid, network_uid("n1"));
    assert_eq!(home.subnet, "10.1.0.0");

    let err = networks.get(EMAIL, "office").unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            op: "get_network",
            entity: "network"
        }
    ));
}

#[test]
fn listing_is_ordered_by_description() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let networks = session.networks();
    networks.create(EMAIL, &new_network("n3", "office")).unwrap();
    networks.create(EMAIL, &new_network("n2", "cabin")).unwrap();

    let descriptions: Vec<_> = networks
        .list(OwnerProof::new(EMAIL, APIKEY))
        .unwrap()
        .into_iter()
        .map(|summary| summary.description)
        .collect();
    assert_eq!(descriptions, ["cabin", "home", "office"]);
}

#[test]
fn uid_is_unique_across_owners() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);

    let err = session
        .networks()
        .create("other@example.com", &new_network("n1", "elsewhere"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[test]
fn embassy_serial_advances_from_base() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let networks = session.networks();
    let uid = network_uid("n1");

    let before = networks.embassy(&uid).unwrap();
    assert_eq!(before.serial, EmbassySerial::BASE);
    assert_eq!(before.keys.certificate, "embassy-cert");

    let advanced = networks.advance_embassy_serial(&uid).unwrap();
    assert_eq!(advanced.value(), EmbassySerial::BASE.value() + 1);
    assert_eq!(networks.embassy(&uid).unwrap().serial, advanced);

    let err = networks
        .advance_embassy_serial(&network_uid("n404"))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn last_address_is_visible_to_lookup_and_overwritten() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let networks = session.networks();
    let uid = network_uid("n1");

    networks.record_ipv4_last(&uid, "10.1.0.2").unwrap();
    networks.record_ipv4_last(&uid, "10.1.0.3").unwrap();
    assert_eq!(
        networks.get(EMAIL, "home").unwrap().ipv4_last.as_deref(),
        Some("10.1.0.3")
    );
}
