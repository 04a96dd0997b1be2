use consulate_store::{OwnerProof, StoreError};
use consulate_types::NodeStatus;

use crate::common::{APIKEY, EMAIL, PASSWORD, TestStore, network_uid, node_uid, seed_owner};

#[test]
fn delete_succeeds_once_then_is_unauthorized() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let nodes = session.nodes();
    nodes
        .create(&network_uid("n1"), &node_uid("u1"), "prov-1", "laptop")
        .unwrap();

    let deleted = nodes
        .delete("laptop", "home", OwnerProof::new(EMAIL, APIKEY))
        .unwrap();
    assert_eq!(deleted.node_uid, node_uid("u1"));
    assert_eq!(deleted.network_uid, network_uid("n1"));

    let err = nodes
        .delete("laptop", "home", OwnerProof::new(EMAIL, APIKEY))
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized { op: "delete_node" }));
}

#[test]
fn rotated_key_loses_node_access() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let nodes = session.nodes();
    nodes
        .create(&network_uid("n1"), &node_uid("u1"), "prov-1", "laptop")
        .unwrap();
    session.accounts().set_apikey(EMAIL, PASSWORD, "k2").unwrap();

    assert!(
        nodes
            .list("home", OwnerProof::new(EMAIL, APIKEY))
            .unwrap()
            .is_empty()
    );
    assert!(
        nodes
            .delete("laptop", "home", OwnerProof::new(EMAIL, APIKEY))
            .is_err()
    );

    let listed = nodes.list("home", OwnerProof::new(EMAIL, "k2")).unwrap();
    assert_eq!(listed.len(), 1);
    nodes
        .delete("laptop", "home", OwnerProof::new(EMAIL, "k2"))
        .unwrap();
}

#[test]
fn provisioned_node_registers_through_status_update() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let nodes = session.nodes();
    nodes
        .create(&network_uid("n1"), &node_uid("u1"), "prov-1", "laptop")
        .unwrap();

    let found = nodes.resolve_provision_key("prov-1").unwrap();
    assert_eq!(found.status, NodeStatus::UNREGISTERED);
    nodes
        .set_status(
            NodeStatus::REGISTERED,
            "198.51.100.7",
            &found.node_uid,
            &found.network_uid,
        )
        .unwrap();

    let listed = nodes.list("home", OwnerProof::new(EMAIL, APIKEY)).unwrap();
    assert_eq!(listed[0].status, NodeStatus::REGISTERED);
    assert_eq!(listed[0].ipsrc.as_deref(), Some("198.51.100.7"));
}

#[test]
fn status_update_requires_matching_network() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let nodes = session.nodes();
    nodes
        .create(&network_uid("n1"), &node_uid("u1"), "prov-1", "laptop")
        .unwrap();

    let err = nodes
        .set_status(NodeStatus::REGISTERED, "198.51.100.7", &node_uid("u1"), &network_uid("n2"))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "node", .. }));
}

#[test]
fn node_listing_is_ordered_by_description() {
    let store = TestStore::new();
    let session = store.open();
    seed_owner(&session);
    let nodes = session.nodes();
    for (uid, key, description) in [("u1", "p1", "zeta"), ("u2", "p2", "alpha"), ("u3", "p3", "mid")] {
        nodes
            .create(&network_uid("n1"), &node_uid(uid), key, description)
            .unwrap();
    }

    let descriptions: Vec<_> = nodes
        .list("home", OwnerProof::new(EMAIL, APIKEY))
        .unwrap()
        .into_iter()
        .map(|node| node.description)
        .collect();
    assert_eq!(descriptions, ["alpha", "mid", "zeta"]);
}
