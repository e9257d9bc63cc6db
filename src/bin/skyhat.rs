//! Command-line control of a SkyHat shutter.
//!
//! ```bash
//! skyhat ports
//! skyhat --port /dev/ttyUSB0 status --json
//! skyhat open --wait
//! skyhat config set --timeout 5 --policy left
//! ```
//!
//! The serial port and controller config are kept in a TOML settings file
//! (`skyhat.toml` by default). `RUST_LOG` or `-v` turns on wire tracing.

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use skyhat::serial::{self, SerialChannel};
use skyhat::settings::{Settings, SettingsError};
use skyhat::{ConfigRecord, Dome, Leaf, MovePolicy, ShutterState, StatusSnapshot};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Slack on top of the controller move timeout before `--wait` gives up.
const WAIT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "skyhat")]
#[command(about = "Control a SkyHat two-leaf dome shutter", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = "skyhat.toml")]
    settings: PathBuf,

    /// Serial port, overriding the settings file
    #[arg(long, global = true)]
    port: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports on this machine
    Ports,

    /// Read the shutter state
    Status {
        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Open the shutter
    Open {
        /// Poll until the shutter stops moving
        #[arg(long)]
        wait: bool,
    },

    /// Close the shutter
    Close {
        /// Poll until the shutter stops moving
        #[arg(long)]
        wait: bool,
    },

    /// Stop both motors
    Abort,

    /// Read or write the controller configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the controller configuration
    Get {
        #[arg(long)]
        json: bool,
    },

    /// Write changed fields to the controller and save them to the settings file
    Set(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Move timeout (s)
    #[arg(long)]
    timeout: Option<u8>,

    /// Light brightness
    #[arg(long)]
    brightness: Option<u8>,

    /// Motor current threshold (ADU)
    #[arg(long)]
    threshold: Option<u8>,

    /// Max motor PWM
    #[arg(long)]
    max_speed: Option<u8>,

    /// Acceleration step
    #[arg(long)]
    velocity: Option<u8>,

    /// Leaf or leaves driven by open/close
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Leaf that moves first
    #[arg(long, value_enum)]
    first: Option<LeafArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Left,
    Right,
    Both,
}

impl From<PolicyArg> for MovePolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Left => MovePolicy::Left,
            PolicyArg::Right => MovePolicy::Right,
            PolicyArg::Both => MovePolicy::Both,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LeafArg {
    Left,
    Right,
}

impl From<LeafArg> for Leaf {
    fn from(l: LeafArg) -> Self {
        match l {
            LeafArg::Left => Leaf::Left,
            LeafArg::Right => Leaf::Right,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Dome(#[from] skyhat::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("cannot list serial ports: {0}")]
    Ports(#[source] std::io::Error),

    #[error("cannot encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no serial port configured; pass --port or set `port` in the settings file")]
    NoPort,

    #[error("controller did not confirm the written configuration")]
    NotConfirmed,

    #[error("shutter still moving after {0:?}")]
    WaitTimeout(Duration),
}

#[derive(Serialize)]
struct StatusReport {
    state: ShutterState,
    #[serde(flatten)]
    snapshot: StatusSnapshot,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "skyhat=debug",
        _ => "skyhat=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Ports = cli.command {
        for name in serial::available_ports().map_err(CliError::Ports)? {
            println!("{name}");
        }
        return Ok(());
    }

    let mut settings = Settings::load(&cli.settings)?;
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if settings.port.is_empty() {
        return Err(CliError::NoPort);
    }

    let dome = Dome::new(SerialChannel::new(&settings.port), settings.dome_options()?);
    dome.connect()?;
    // The settings file mirrors the controller EEPROM after every connect.
    if let Some(active) = dome.config() {
        if settings.sync_device(&active, &cli.settings)? {
            info!(path = %cli.settings.display(), "settings updated from controller");
        }
    }
    let result = dispatch(&dome, &mut settings, cli.settings, cli.command);
    dome.disconnect();
    result
}

fn dispatch(
    dome: &Dome<SerialChannel>,
    settings: &mut Settings,
    path: PathBuf,
    command: Commands,
) -> Result<(), CliError> {
    match command {
        Commands::Ports => Ok(()),
        Commands::Status { json, watch } => loop {
            print_status(dome, json)?;
            if !watch {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        },
        Commands::Open { wait } => {
            dome.open()?;
            if wait { wait_stopped(dome) } else { Ok(()) }
        }
        Commands::Close { wait } => {
            dome.close()?;
            if wait { wait_stopped(dome) } else { Ok(()) }
        }
        Commands::Abort => {
            if !dome.status()?.is_moving() {
                warn!("shutter not moving; controller will flag the abort");
            }
            dome.abort()?;
            Ok(())
        }
        Commands::Config(ConfigCommand::Get { json }) => {
            let rec = dome.read_config()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rec)?);
            } else {
                print_config(&rec);
            }
            Ok(())
        }
        Commands::Config(ConfigCommand::Set(args)) => {
            let mut rec = dome.read_config()?;
            args.merge_into(&mut rec);
            let confirmed = dome.write_config(rec)?;
            // Persist what the controller actually holds.
            if let Some(active) = dome.config() {
                if settings.sync_device(&active, &path)? {
                    info!(path = %path.display(), "settings saved");
                }
            }
            if !confirmed {
                return Err(CliError::NotConfirmed);
            }
            print_config(&rec);
            Ok(())
        }
    }
}

impl ConfigArgs {
    fn merge_into(&self, rec: &mut ConfigRecord) {
        if let Some(v) = self.timeout {
            rec.timeout_secs = v;
        }
        if let Some(v) = self.brightness {
            rec.brightness = v;
        }
        if let Some(v) = self.threshold {
            rec.current_threshold = v;
        }
        if let Some(v) = self.max_speed {
            rec.max_speed_pwm = v;
        }
        if let Some(v) = self.velocity {
            rec.acceleration = v;
        }
        if let Some(p) = self.policy {
            rec.move_policy = p.into();
        }
        if let Some(l) = self.first {
            rec.first_leaf = l.into();
        }
    }
}

fn wait_stopped(dome: &Dome<SerialChannel>) -> Result<(), CliError> {
    let move_timeout = dome
        .config()
        .map_or(Duration::ZERO, |c| Duration::from_secs(c.timeout_secs.into()));
    let limit = move_timeout + WAIT_MARGIN;
    let start = Instant::now();
    loop {
        thread::sleep(POLL_INTERVAL);
        let state = dome.status()?;
        if !state.is_moving() {
            println!("{state}");
            return Ok(());
        }
        if start.elapsed() > limit {
            return Err(CliError::WaitTimeout(limit));
        }
    }
}

// ---------------------------------------------------------------------------
// Pretty-printers
// ---------------------------------------------------------------------------

fn print_status(dome: &Dome<SerialChannel>, json: bool) -> Result<(), CliError> {
    let state = dome.status()?;
    let Some(snapshot) = dome.last_snapshot() else {
        println!("{state}");
        return Ok(());
    };
    if json {
        let report = StatusReport { state, snapshot };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }
    println!(
        "{state}  left={:?}/{:?} right={:?}/{:?} current={} light={} timeout={}s",
        snapshot.move_left,
        snapshot.status_left,
        snapshot.move_right,
        snapshot.status_right,
        snapshot.current_adu,
        if snapshot.light_on { "on" } else { "off" },
        snapshot.timeout_remaining,
    );
    Ok(())
}

fn print_config(rec: &ConfigRecord) {
    println!("first leaf:   {}", rec.first_leaf);
    println!("move policy:  {}", rec.move_policy);
    println!("timeout:      {}s", rec.timeout_secs);
    println!("brightness:   {}", rec.brightness);
    println!("threshold:    {}", rec.current_threshold);
    println!("max speed:    {}", rec.max_speed_pwm);
    println!("acceleration: {}", rec.acceleration);
}
