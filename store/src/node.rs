//! Node membership under a network.
//!
//! Deletion and owner listings embed the ownership predicate in the same
//! statement. Status updates and provisioning-key lookups are trusted-caller
//! paths with no ownership check in the statement.

use rusqlite::{ToSql, named_params};

use consulate_types::{
    DeletedNode, NetworkUid, NodeStatus, NodeSummary, NodeUid, ProvisionedNode,
};

use crate::authz::OwnerProof;
use crate::error::{Rejection, StoreResult};
use crate::session::{Session, network_uid_column, node_uid_column};
use crate::statements::Statement;

const NODE: Rejection = Rejection::NotFound("node");

pub struct NodeManager<'s> {
    session: &'s Session,
}

impl<'s> NodeManager<'s> {
    #[must_use]
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Add an unregistered node to a network.
    ///
    /// `Conflict` on a duplicate uid, provisioning key or description within
    /// the network; `NotFound` if the network does not exist.
    pub fn create(
        &self,
        network_uid: &NetworkUid,
        uid: &NodeUid,
        provision_key: &str,
        description: &str,
    ) -> StoreResult<()> {
        self.session.execute_one(
            Statement::CreateNode,
            named_params! {
                ":network_uid": network_uid.as_str(),
                ":uid": uid.as_str(),
                ":provision_key": provision_key,
                ":description": description,
                ":status": NodeStatus::UNREGISTERED.code(),
            },
            Rejection::Unauthorized,
        )
    }

    /// Delete a node of a network owned by the active account holding `proof`.
    ///
    /// Ownership check and deletion are one statement, so two racing callers
    /// cannot both succeed. A missing node, a foreign network and a bad key
    /// are all `Unauthorized`.
    pub fn delete(
        &self,
        node_description: &str,
        network_description: &str,
        proof: OwnerProof<'_>,
    ) -> StoreResult<DeletedNode> {
        let mut params: Vec<(&str, &dyn ToSql)> = vec![
            (":node_description", &node_description as &dyn ToSql),
            (":network_description", &network_description as &dyn ToSql),
        ];
        params.extend(proof.active_params());

        let deleted = self.session.query_one(
            Statement::DeleteNode,
            params.as_slice(),
            Rejection::Unauthorized,
            |row| {
                Ok(DeletedNode {
                    node_uid: node_uid_column(row, 0)?,
                    network_uid: network_uid_column(row, 1)?,
                })
            },
        )?;
        tracing::debug!(node = %deleted.node_uid, network = %deleted.network_uid, "Node deleted");
        Ok(deleted)
    }

    /// Update status and last-seen source address.
    ///
    /// The caller must already have authorized this node; the statement
    /// checks only that (`uid`, `network_uid`) exists.
    pub fn set_status(
        &self,
        status: NodeStatus,
        ipsrc: &str,
        uid: &NodeUid,
        network_uid: &NetworkUid,
    ) -> StoreResult<()> {
        self.session.execute_one(
            Statement::SetNodeStatus,
            named_params! {
                ":status": status.code(),
                ":ipsrc": ipsrc,
                ":uid": uid.as_str(),
                ":network_uid": network_uid.as_str(),
            },
            NODE,
        )
    }

    /// Stream the nodes of an owned network. Bad credentials yield no rows.
    pub fn visit(
        &self,
        network_description: &str,
        proof: OwnerProof<'_>,
        visit: impl FnMut(NodeSummary),
    ) -> StoreResult<usize> {
        let mut params: Vec<(&str, &dyn ToSql)> =
            vec![(":network_description", &network_description as &dyn ToSql)];
        params.extend(proof.active_params());

        self.session.query_each(
            Statement::ListNodes,
            params.as_slice(),
            |row| {
                Ok(NodeSummary {
                    uid: node_uid_column(row, 0)?,
                    description: row.get(1)?,
                    status: NodeStatus::new(row.get(2)?),
                    ipsrc: row.get(3)?,
                })
            },
            visit,
        )
    }

    pub fn list(
        &self,
        network_description: &str,
        proof: OwnerProof<'_>,
    ) -> StoreResult<Vec<NodeSummary>> {
        let mut nodes = Vec::new();
        self.visit(network_description, proof, |node| nodes.push(node))?;
        Ok(nodes)
    }

    /// Find the node a provisioning key was issued for.
    pub fn resolve_provision_key(&self, provision_key: &str) -> StoreResult<ProvisionedNode> {
        self.session.query_one(
            Statement::ResolveProvisionKey,
            named_params! { ":provision_key": provision_key },
            NODE,
            |row| {
                Ok(ProvisionedNode {
                    node_uid: node_uid_column(row, 0)?,
                    network_uid: network_uid_column(row, 1)?,
                    description: row.get(2)?,
                    status: NodeStatus::new(row.get(3)?),
                })
            },
        )
    }
}
