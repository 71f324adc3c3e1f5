//! Interface Relationship Manager entry point.
//!
//! Each invocation loads the inventory snapshot, runs one command against it
//! and, for mutating commands, writes the snapshot back.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use sonic_intfrelmgrd::tables::DEFAULT_CONFIG_PATH;
use sonic_intfrelmgrd::{init_logging, snapshot, IntfRelConfig, IntfRelMgr, RelationshipStore};
use sonic_inventory::{DeviceId, InterfaceId, InterfaceType, Inventory, NewInterface};
use tracing::{debug, error};

/// SONiC Interface Relationship Manager
#[derive(Parser, Debug)]
#[command(name = "intfrelmgrd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Inventory state file (overrides the configuration file)
    #[arg(short = 's', long)]
    state: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List devices
    Devices,

    /// Add a device
    AddDevice {
        #[arg(long)]
        name: String,
    },

    /// Add an interface to a device
    AddInterface {
        #[arg(long)]
        device: DeviceId,

        #[arg(long)]
        name: String,

        /// Interface type, e.g. 1000base-t
        #[arg(long = "type", default_value = InterfaceType::VIRTUAL)]
        kind: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Parent interface id
        #[arg(long)]
        parent: Option<InterfaceId>,
    },

    /// List interfaces of a device that can still be split
    Candidates {
        #[arg(long)]
        device: DeviceId,
    },

    /// Split an interface into RX/TX interfaces
    Split(SplitArgs),

    /// List relationships
    Relationships,

    /// Delete an interface and any relationship referencing it
    DeleteInterface {
        #[arg(long)]
        id: InterfaceId,
    },
}

#[derive(ClapArgs, Debug)]
struct SplitArgs {
    #[arg(long)]
    device: DeviceId,

    /// Interface name
    #[arg(
        long,
        conflicts_with = "interface_id",
        required_unless_present = "interface_id"
    )]
    interface: Option<String>,

    /// Interface id, as listed by `candidates`
    #[arg(long)]
    interface_id: Option<InterfaceId>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = IntfRelConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.validate()?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, args.json_logs || config.logging.json);

    let state = args.state.unwrap_or(config.state.path);
    debug!("Using state file {}", state.display());

    let (inventory, relationships) = snapshot::load_or_empty(&state)?;
    let mut mgr = IntfRelMgr::new(inventory, relationships);

    let mutated = match args.command {
        Command::Devices => {
            for device in mgr.devices() {
                println!("{}\t{}", device.id, device.name);
            }
            false
        }
        Command::AddDevice { name } => {
            let id = mgr.add_device(name);
            println!("{}", id);
            true
        }
        Command::AddInterface {
            device,
            name,
            kind,
            description,
            parent,
        } => {
            let mut new = NewInterface::new(device, name, InterfaceType::new(kind))
                .with_description(description);
            if let Some(parent) = parent {
                new = new.with_parent(parent);
            }
            let id = mgr.add_interface(new)?;
            println!("{}", id);
            true
        }
        Command::Candidates { device } => {
            for intf in mgr.candidates(device)? {
                println!("{}\t{}\t{}", intf.id, intf.name, intf.kind);
            }
            false
        }
        Command::Split(split) => {
            let message = match (split.interface, split.interface_id) {
                (_, Some(id)) => mgr.split_selected(split.device, id)?,
                (Some(name), None) => {
                    mgr.split_interface(split.device, &name)?;
                    let device = mgr
                        .inventory()
                        .device(split.device)
                        .map(|d| d.name.clone())
                        .unwrap_or_default();
                    format!(
                        "Successfully split interface '{}' for device '{}'.",
                        name, device
                    )
                }
                (None, None) => anyhow::bail!("either --interface or --interface-id is required"),
            };
            println!("{}", message);
            true
        }
        Command::Relationships => {
            let mut rows = mgr.relationships().list_all();
            rows.sort_by_key(|r| r.id);
            for rel in rows {
                println!("{}\t{}\t{}", rel.id, mgr.describe(rel), rel.created_at);
            }
            false
        }
        Command::DeleteInterface { id } => {
            let removed = mgr.delete_interface(id)?;
            println!("Deleted interface '{}'.", removed.name);
            true
        }
    };

    if mutated {
        let (inventory, relationships) = mgr.into_parts();
        snapshot::save(&state, &inventory, &relationships)?;
    }

    Ok(())
}
