//! Subcommands, one per store operation.

use std::fs;
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;

use consulate_store::{OwnerProof, Session};
use consulate_types::{
    KeyPair, NetworkSummary, NetworkUid, NewNetwork, NodeStatus, NodeSummary, NodeUid,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and schema if missing
    Init,
    #[command(subcommand)]
    Account(AccountCommand),
    #[command(subcommand)]
    Network(NetworkCommand),
    #[command(subcommand)]
    Node(NodeCommand),
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Register a pending account
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSULATE_PASSWORD")]
        password: String,
        #[arg(long, env = "CONSULATE_APIKEY")]
        apikey: String,
    },
    /// Activate a pending account with its API key
    Activate {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSULATE_APIKEY")]
        apikey: String,
    },
    /// Replace the API key, proving the password
    SetApikey {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSULATE_PASSWORD")]
        password: String,
        #[arg(long)]
        new_apikey: String,
    },
    /// Replace the API key, proving the current key
    ResetApikey {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSULATE_APIKEY")]
        apikey: String,
        #[arg(long)]
        new_apikey: String,
    },
    /// Issue a password recovery key
    BeginRecovery {
        #[arg(long)]
        email: String,
        #[arg(long)]
        recover_key: String,
    },
    /// Redeem a recovery key for a new password
    CompleteRecovery {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSULATE_PASSWORD")]
        password: String,
        #[arg(long)]
        recover_key: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Register a network with caller-generated key material
    Create(CreateNetworkArgs),
    /// Show a network by owner and description
    Get {
        #[arg(long)]
        email: String,
        #[arg(long)]
        description: String,
    },
    /// List an account's networks, one JSON object per line
    List(OwnerArgs),
    /// Show embassy key material and serial
    Embassy {
        #[arg(long)]
        uid: String,
    },
    /// Advance the embassy serial by one
    AdvanceSerial {
        #[arg(long)]
        uid: String,
    },
    /// Record the last assigned IPv4 address
    SetIpv4Last {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        address: String,
    },
}

#[derive(Debug, Args)]
pub struct CreateNetworkArgs {
    #[arg(long)]
    email: String,
    /// Network uid (generated when omitted)
    #[arg(long)]
    uid: Option<String>,
    #[arg(long)]
    description: String,
    #[arg(long)]
    subnet: String,
    #[arg(long)]
    netmask: String,
    #[arg(long, value_name = "FILE")]
    embassy_cert: PathBuf,
    #[arg(long, value_name = "FILE")]
    embassy_key: PathBuf,
    #[arg(long, value_name = "FILE")]
    passport_cert: PathBuf,
    #[arg(long, value_name = "FILE")]
    passport_key: PathBuf,
}

#[derive(Debug, Args)]
pub struct OwnerArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "CONSULATE_APIKEY")]
    apikey: String,
}

#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// Add a node to a network
    Create {
        #[arg(long)]
        network_uid: String,
        /// Node uid (generated when omitted)
        #[arg(long)]
        uid: Option<String>,
        /// Provisioning key (generated when omitted)
        #[arg(long)]
        provision_key: Option<String>,
        #[arg(long)]
        description: String,
    },
    /// Delete a node from a network the account owns
    Delete {
        #[arg(long)]
        node: String,
        #[arg(long)]
        network: String,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Update node status and last-seen source address
    Status {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        network_uid: String,
        #[arg(long)]
        status: i64,
        #[arg(long)]
        ipsrc: String,
    },
    /// List the nodes of an owned network, one JSON object per line
    List {
        #[arg(long)]
        network: String,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Find the node a provisioning key belongs to
    Resolve {
        #[arg(long)]
        provision_key: String,
    },
}

pub fn run(command: Command, session: &Session, path: &Path) -> Result<()> {
    match command {
        Command::Init => print_json(&json!({ "initialized": path.display().to_string() })),
        Command::Account(command) => run_account(command, session),
        Command::Network(command) => run_network(command, session),
        Command::Node(command) => run_node(command, session),
    }
}

fn run_account(command: AccountCommand, session: &Session) -> Result<()> {
    let accounts = session.accounts();
    match command {
        AccountCommand::Create {
            email,
            password,
            apikey,
        } => accounts.create(&email, &password, &apikey)?,
        AccountCommand::Activate { email, apikey } => accounts.activate(&email, &apikey)?,
        AccountCommand::SetApikey {
            email,
            password,
            new_apikey,
        } => accounts.set_apikey(&email, &password, &new_apikey)?,
        AccountCommand::ResetApikey {
            email,
            apikey,
            new_apikey,
        } => accounts.reset_apikey(&email, &apikey, &new_apikey)?,
        AccountCommand::BeginRecovery { email, recover_key } => {
            accounts.begin_recovery(&email, &recover_key)?;
        }
        AccountCommand::CompleteRecovery {
            email,
            password,
            recover_key,
        } => accounts.complete_recovery(&email, &password, &recover_key)?,
    }
    print_ok()
}

fn run_network(command: NetworkCommand, session: &Session) -> Result<()> {
    let networks = session.networks();
    match command {
        NetworkCommand::Create(args) => {
            let network = NewNetwork {
                uid: NetworkUid::new(args.uid.unwrap_or_else(generated_id))?,
                description: args.description,
                subnet: args.subnet,
                netmask: args.netmask,
                embassy: KeyPair::new(
                    read_material(&args.embassy_cert)?,
                    read_material(&args.embassy_key)?,
                ),
                passport: KeyPair::new(
                    read_material(&args.passport_cert)?,
                    read_material(&args.passport_key)?,
                ),
            };
            networks.create(&args.email, &network)?;
            print_json(&json!({ "uid": network.uid }))
        }
        NetworkCommand::Get { email, description } => {
            print_json(&networks.get(&email, &description)?)
        }
        NetworkCommand::List(owner) => {
            let proof = OwnerProof::new(&owner.email, &owner.apikey);
            print_lines::<NetworkSummary, _>(|emit| networks.visit(proof, emit))
        }
        NetworkCommand::Embassy { uid } => print_json(&networks.embassy(&NetworkUid::new(uid)?)?),
        NetworkCommand::AdvanceSerial { uid } => {
            let serial = networks.advance_embassy_serial(&NetworkUid::new(uid)?)?;
            print_json(&json!({ "serial": serial }))
        }
        NetworkCommand::SetIpv4Last { uid, address } => {
            networks.record_ipv4_last(&NetworkUid::new(uid)?, &address)?;
            print_ok()
        }
    }
}

fn run_node(command: NodeCommand, session: &Session) -> Result<()> {
    let nodes = session.nodes();
    match command {
        NodeCommand::Create {
            network_uid,
            uid,
            provision_key,
            description,
        } => {
            let uid = NodeUid::new(uid.unwrap_or_else(generated_id))?;
            let provision_key = provision_key.unwrap_or_else(generated_id);
            nodes.create(
                &NetworkUid::new(network_uid)?,
                &uid,
                &provision_key,
                &description,
            )?;
            print_json(&json!({ "uid": uid, "provision_key": provision_key }))
        }
        NodeCommand::Delete {
            node,
            network,
            owner,
        } => {
            let proof = OwnerProof::new(&owner.email, &owner.apikey);
            print_json(&nodes.delete(&node, &network, proof)?)
        }
        NodeCommand::Status {
            uid,
            network_uid,
            status,
            ipsrc,
        } => {
            nodes.set_status(
                NodeStatus::new(status),
                &ipsrc,
                &NodeUid::new(uid)?,
                &NetworkUid::new(network_uid)?,
            )?;
            print_ok()
        }
        NodeCommand::List { network, owner } => {
            let proof = OwnerProof::new(&owner.email, &owner.apikey);
            print_lines::<NodeSummary, _>(|emit| nodes.visit(&network, proof, emit))
        }
        NodeCommand::Resolve { provision_key } => {
            print_json(&nodes.resolve_provision_key(&provision_key)?)
        }
    }
}

fn generated_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn read_material(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read key material from {}", path.display()))
}

fn print_ok() -> Result<()> {
    print_json(&json!({ "ok": true }))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to write output")?;
    writeln!(out).context("Failed to write output")?;
    Ok(())
}

/// Write each streamed row as one JSON line while the query is stepped.
fn print_lines<T, F>(stream: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&mut dyn FnMut(T)) -> consulate_store::StoreResult<usize>,
{
    let mut out = stdout().lock();
    let mut write_error = None;
    let count = stream(&mut |row: T| {
        if write_error.is_some() {
            return;
        }
        let written = serde_json::to_writer(&mut out, &row)
            .map_err(anyhow::Error::from)
            .and_then(|()| writeln!(out).map_err(anyhow::Error::from));
        if let Err(err) = written {
            write_error = Some(err);
        }
    })?;
    if let Some(err) = write_error {
        return Err(err.context("Failed to write output"));
    }
    tracing::debug!(count, "Rows streamed");
    Ok(())
}
