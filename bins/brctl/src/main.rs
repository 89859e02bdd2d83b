//! brctl - Ethernet bridge administration.
//!
//! Creates and deletes bridges over rtnetlink and lists them from sysfs.

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use brlink::bridge::{BridgeControl, IfaceKind, Outcome, SysfsScanner, select_named};
use brlink::netlink::BridgeLink;
use brlink::output::{BridgeTable, OutputFormat, OutputOptions, Printable};
use brlink::util::ifname;

#[derive(Parser)]
#[command(name = "brctl", version, about = "Ethernet bridge administration")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    /// Log netlink traffic to stderr.
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a bridge.
    Addbr {
        /// Bridge name.
        bridge: String,

        /// Enable spanning tree protocol.
        #[arg(long)]
        stp: bool,

        /// Enable VLAN filtering.
        #[arg(long)]
        vlan_filtering: bool,

        /// MAC address ageing time in seconds.
        #[arg(long, value_name = "SECONDS")]
        ageing_time: Option<u32>,

        /// Bridge priority.
        #[arg(long)]
        priority: Option<u16>,

        /// MTU.
        #[arg(long)]
        mtu: Option<u32>,
    },

    /// Delete a bridge.
    Delbr {
        /// Bridge name.
        bridge: String,
    },

    /// Show a list of bridges.
    Show {
        /// Only show these bridges.
        bridges: Vec<String>,
    },

    /// Add an interface to a bridge.
    Addif {
        /// Bridge name.
        bridge: String,
        /// Interface to attach.
        device: String,
    },

    /// Remove an interface from a bridge.
    Delif {
        /// Bridge name.
        bridge: String,
        /// Interface to detach.
        device: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Addbr { .. } => "addbr",
            Command::Delbr { .. } => "delbr",
            Command::Show { .. } => "show",
            Command::Addif { .. } => "addif",
            Command::Delif { .. } => "delif",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let opts = OutputOptions { pretty: cli.pretty };

    let name = cli.command.name();
    match run(cli.command, format, &opts) {
        Ok(Outcome::Done) => Ok(()),
        Ok(Outcome::NotSupported) => {
            eprintln!("operation not supported: {}", name);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(command: Command, format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<Outcome> {
    match command {
        Command::Addbr {
            bridge,
            stp,
            vlan_filtering,
            ageing_time,
            priority,
            mtu,
        } => {
            ifname::validate(&bridge)?;

            let mut link = BridgeLink::new(bridge);
            if stp {
                link = link.stp(true);
            }
            if vlan_filtering {
                link = link.vlan_filtering(true);
            }
            if let Some(seconds) = ageing_time {
                link = link.ageing_time(seconds);
            }
            if let Some(priority) = priority {
                link = link.priority(priority);
            }
            if let Some(mtu) = mtu {
                link = link.mtu(mtu);
            }

            Ok(BridgeControl::new()?.add_bridge(&link)?)
        }
        Command::Delbr { bridge } => {
            ifname::validate(&bridge)?;
            Ok(BridgeControl::new()?.del_bridge(&bridge)?)
        }
        Command::Show { bridges } => {
            show(&bridges, format, opts)?;
            Ok(Outcome::Done)
        }
        Command::Addif { bridge, device } => Ok(BridgeControl::add_interface(&bridge, &device)?),
        Command::Delif { bridge, device } => Ok(BridgeControl::del_interface(&bridge, &device)?),
    }
}

fn show(names: &[String], format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<()> {
    let scanner = SysfsScanner::new();

    for name in names {
        match scanner.classify(name) {
            IfaceKind::Missing => eprintln!("interface not found: {}", name),
            IfaceKind::NotBridge => eprintln!("interface is not bridge: {}", name),
            IfaceKind::Bridge => {}
        }
    }

    // The header depends on bridges existing at all, not on the selection
    let all = scanner.scan()?;
    let has_bridges = !all.is_empty();
    let bridges = if names.is_empty() {
        all
    } else {
        select_named(&all, names)
    };

    let mut stdout = io::stdout().lock();
    BridgeTable::new(&bridges)
        .header(has_bridges)
        .print(&mut stdout, format, opts)?;
    stdout.flush()?;
    Ok(())
}
