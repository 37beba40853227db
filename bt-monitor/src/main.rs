use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use qnx_bluetooth::{BluetoothConfig, BluetoothSystem, CacheEvent, FsTransport, PpsTransport};

pub mod output;

use output::{render_snapshot, render_watch_line, WatchLine};

/// QNX Bluetooth monitor
///
/// Shows the devices paired with the head unit, follows pairing changes
/// and sends connect requests to the Bluetooth manager.
#[derive(Parser, Debug)]
#[command(name = "bt-monitor")]
#[command(about = "Inspect and drive the QNX Bluetooth manager over PPS")]
#[command(version)]
pub struct Args {
    /// Mount point of the PPS server
    #[arg(long, global = true)]
    pub pps_root: Option<String>,

    /// Read and write a plain directory mirroring the PPS tree instead
    #[arg(long, global = true, conflicts_with = "pps_root")]
    pub mirror: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print the paired devices as JSON
    List {
        /// Time to let the initial feed reads settle, in milliseconds
        #[arg(long, default_value = "500")]
        settle_ms: u64,
    },
    /// Print one JSON line per paired-device change
    Watch {
        /// Exit after this many seconds without a change
        #[arg(long)]
        idle_timeout: Option<u64>,
    },
    /// Ask the Bluetooth manager to connect a service ("ALL" for every service)
    Connect { service: String, mac: String },
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        if let Command::Watch {
            idle_timeout: Some(0),
        } = self.command
        {
            return Err(anyhow::anyhow!("Idle timeout must be positive"));
        }

        Ok(())
    }

    /// Object paths after applying `--pps-root`
    pub fn bluetooth_config(&self) -> BluetoothConfig {
        match &self.pps_root {
            Some(root) => BluetoothConfig::default().with_pps_mount(root),
            None => BluetoothConfig::default(),
        }
    }

    pub fn transport(&self) -> Arc<dyn PpsTransport> {
        match &self.mirror {
            Some(dir) => Arc::new(FsTransport::mirrored(dir)),
            None => Arc::new(FsTransport::new()),
        }
    }
}

/// Initialize tracing on stderr; `RUST_LOG` takes precedence over `level`
fn init_tracing(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_lowercase())),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn list(system: &BluetoothSystem, settle: Duration) -> Result<()> {
    std::thread::sleep(settle);
    println!("{}", render_snapshot(system.get_paired())?);
    Ok(())
}

fn watch(system: &BluetoothSystem, idle_timeout: Option<Duration>) -> Result<()> {
    let events = system.iter();
    let emit = |event: CacheEvent| -> Result<()> {
        let line = WatchLine::new(&event, system.paired_device(event.mac.as_str()));
        println!("{}", render_watch_line(&line)?);
        Ok(())
    };

    match idle_timeout {
        Some(timeout) => {
            for event in events.timeout_iter(timeout) {
                emit(event)?;
            }
            info!("No changes for {}s, exiting", timeout.as_secs());
        }
        None => {
            for event in events {
                emit(event)?;
            }
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = args.bluetooth_config();
    info!(
        "Opening Bluetooth manager objects (paired={}, control={}, status={})",
        config.paired_devices_path, config.control_path, config.status_path
    );

    let mut system = BluetoothSystem::init(args.transport(), config)
        .context("Failed to open Bluetooth manager PPS objects")?;

    let result = match args.command {
        Command::List { settle_ms } => list(&system, Duration::from_millis(settle_ms)),
        Command::Watch { idle_timeout } => watch(&system, idle_timeout.map(Duration::from_secs)),
        Command::Connect { service, mac } => system
            .connect_service(&service, &mac)
            .map(|()| info!("Sent connect request for {} on {}", service, mac))
            .with_context(|| format!("Failed to connect {} on {}", service, mac)),
    };

    system.shutdown();
    result
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;
    init_tracing(&args.log_level)?;

    if let Err(e) = run(args) {
        error!("bt-monitor failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_connect() {
        let args = Args::try_parse_from(["bt-monitor", "connect", "OBEX", "00:11:22:33:44:55"])
            .unwrap();
        assert_eq!(
            args.command,
            Command::Connect {
                service: "OBEX".to_string(),
                mac: "00:11:22:33:44:55".to_string()
            }
        );
    }

    #[test]
    fn test_pps_root_relocates_paths() {
        let args =
            Args::try_parse_from(["bt-monitor", "list", "--pps-root", "/mnt/pps"]).unwrap();
        assert_eq!(args.command, Command::List { settle_ms: 500 });
        assert_eq!(
            args.bluetooth_config().status_path,
            "/mnt/pps/services/bluetooth/status"
        );
    }

    #[test]
    fn test_pps_root_conflicts_with_mirror() {
        let result = Args::try_parse_from([
            "bt-monitor",
            "--pps-root",
            "/mnt/pps",
            "--mirror",
            "/tmp/pps",
            "list",
        ]);
        assert!(result.is_err());
    }

    #[rstest]
    #[case(&["bt-monitor", "list"], true)]
    #[case(&["bt-monitor", "--log-level", "DEBUG", "list"], true)]
    #[case(&["bt-monitor", "--log-level", "loud", "list"], false)]
    #[case(&["bt-monitor", "watch", "--idle-timeout", "5"], true)]
    #[case(&["bt-monitor", "watch", "--idle-timeout", "0"], false)]
    fn test_validate(#[case] argv: &[&str], #[case] valid: bool) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.validate().is_ok(), valid);
    }
}
