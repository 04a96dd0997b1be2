//! Statement set compiled into each session.
//!
//! One variant per store operation. All text is static so the whole set can
//! be prepared when a session opens and served from the connection's
//! statement cache afterwards.

use crate::authz::{owned_network_uids, owner_key_match};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Statement {
    CreateAccount,
    ActivateAccount,
    SetApikey,
    ResetApikey,
    BeginRecovery,
    CompleteRecovery,
    CreateNetwork,
    GetNetwork,
    ListNetworks,
    GetEmbassy,
    AdvanceEmbassySerial,
    RecordIpv4Last,
    CreateNode,
    DeleteNode,
    SetNodeStatus,
    ListNodes,
    ResolveProvisionKey,
}

impl Statement {
    pub(crate) const ALL: [Statement; 17] = [
        Statement::CreateAccount,
        Statement::ActivateAccount,
        Statement::SetApikey,
        Statement::ResetApikey,
        Statement::BeginRecovery,
        Statement::CompleteRecovery,
        Statement::CreateNetwork,
        Statement::GetNetwork,
        Statement::ListNetworks,
        Statement::GetEmbassy,
        Statement::AdvanceEmbassySerial,
        Statement::RecordIpv4Last,
        Statement::CreateNode,
        Statement::DeleteNode,
        Statement::SetNodeStatus,
        Statement::ListNodes,
        Statement::ResolveProvisionKey,
    ];

    /// Operation name used in errors and logs.
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Statement::CreateAccount => "create_account",
            Statement::ActivateAccount => "activate",
            Statement::SetApikey => "set_apikey",
            Statement::ResetApikey => "reset_apikey",
            Statement::BeginRecovery => "begin_recovery",
            Statement::CompleteRecovery => "complete_recovery",
            Statement::CreateNetwork => "create_network",
            Statement::GetNetwork => "get_network",
            Statement::ListNetworks => "list_networks",
            Statement::GetEmbassy => "get_embassy",
            Statement::AdvanceEmbassySerial => "advance_embassy_serial",
            Statement::RecordIpv4Last => "record_ipv4_last",
            Statement::CreateNode => "create_node",
            Statement::DeleteNode => "delete_node",
            Statement::SetNodeStatus => "set_node_status",
            Statement::ListNodes => "list_nodes",
            Statement::ResolveProvisionKey => "resolve_provision_key",
        }
    }

    /// Entity a rejected foreign key points at.
    pub(crate) const fn parent(self) -> &'static str {
        match self {
            Statement::CreateNode => "network",
            _ => "parent record",
        }
    }

    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Statement::CreateAccount => {
                "INSERT INTO account (email, password, apikey, status)
                 VALUES (LOWER(:email), :password, :apikey, :pending)"
            }
            Statement::ActivateAccount => {
                "UPDATE account SET status = :active
                 WHERE email = LOWER(:email)
                 AND apikey = :apikey
                 AND status = :pending"
            }
            Statement::SetApikey => {
                "UPDATE account SET apikey = :new_apikey
                 WHERE email = LOWER(:email)
                 AND password = :password
                 AND status = :active"
            }
            Statement::ResetApikey => {
                "UPDATE account SET apikey = :new_apikey
                 WHERE email = LOWER(:email)
                 AND apikey = :apikey
                 AND status = :active"
            }
            Statement::BeginRecovery => {
                "UPDATE account SET recover_key = :recover_key, recover_date = datetime('now')
                 WHERE email = LOWER(:email)
                 AND (recover_date IS NULL OR recover_date <= datetime('now', :reissue_after))
                 AND status = :active"
            }
            Statement::CompleteRecovery => {
                "UPDATE account SET password = :password, recover_key = NULL, recover_date = NULL
                 WHERE email = LOWER(:email)
                 AND recover_key = :recover_key
                 AND recover_date >= datetime('now', :redeem_within)
                 AND status = :active"
            }
            Statement::CreateNetwork => {
                "INSERT INTO network (email, uid, description, subnet, netmask,
                                      embassy_certificate, embassy_privatekey, embassy_serial,
                                      passport_certificate, passport_privatekey)
                 VALUES (LOWER(:email), :uid, :description, :subnet, :netmask,
                         :embassy_certificate, :embassy_privatekey, :embassy_serial,
                         :passport_certificate, :passport_privatekey)"
            }
            Statement::GetNetwork => {
                "SELECT uid, subnet, netmask, ipv4_last FROM network
                 WHERE email = LOWER(:email)
                 AND description = :description"
            }
            Statement::ListNetworks => concat!(
                "SELECT network.uid, network.description FROM network \
                 JOIN account ON account.email = network.email \
                 WHERE ",
                owner_key_match!(),
                " ORDER BY network.description"
            ),
            Statement::GetEmbassy => {
                "SELECT embassy_certificate, embassy_privatekey, embassy_serial
                 FROM network
                 WHERE uid = :uid"
            }
            Statement::AdvanceEmbassySerial => {
                "UPDATE network SET embassy_serial = embassy_serial + 1
                 WHERE uid = :uid
                 RETURNING embassy_serial"
            }
            Statement::RecordIpv4Last => {
                "UPDATE network SET ipv4_last = :ipv4_last
                 WHERE uid = :uid"
            }
            Statement::CreateNode => {
                "INSERT INTO node (network_uid, uid, provision_key, description, status)
                 VALUES (:network_uid, :uid, :provision_key, :description, :status)"
            }
            Statement::DeleteNode => concat!(
                "DELETE FROM node \
                 WHERE description = :node_description \
                 AND network_uid IN (",
                owned_network_uids!(),
                ") RETURNING uid, network_uid"
            ),
            Statement::SetNodeStatus => {
                "UPDATE node SET status = :status, ipsrc = :ipsrc
                 WHERE uid = :uid
                 AND network_uid = :network_uid"
            }
            Statement::ListNodes => concat!(
                "SELECT uid, description, status, ipsrc FROM node \
                 WHERE network_uid IN (",
                owned_network_uids!(),
                ") ORDER BY description"
            ),
            Statement::ResolveProvisionKey => {
                "SELECT uid, network_uid, description, status FROM node
                 WHERE provision_key = :provision_key"
            }
        }
    }
}
