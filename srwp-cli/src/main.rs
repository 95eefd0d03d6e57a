//! srwp CLI - Command-line tool for FRAM devices speaking SRWP.
//!
//! ## Features
//!
//! - Echo, read and write single regions
//! - Back up, restore, verify and clear the whole device
//! - Device auto-discovery
//! - Configuration files and environment variables
//! - Shell completion generation

use {
    anyhow::Result,
    clap::{Parser, Subcommand},
    clap_complete::Shell,
    console::style,
    env_logger::Env,
    log::debug,
    srwp::{Session, SessionConfig},
    std::{
        env,
        path::PathBuf,
        process::ExitCode,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    },
};

mod commands;
mod config;

use config::Config;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Set by the Ctrl-C handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check if animations should be used (TTY and colors enabled).
pub(crate) fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// Whether Ctrl-C was pressed.
pub(crate) fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

fn ensure_not_interrupted() -> Result<()> {
    if was_interrupted() {
        Err(CliError::Cancelled("interrupted".to_string()).into())
    } else {
        Ok(())
    }
}

/// Errors that carry their own exit code.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Bad invocation or setup (exit 2).
    #[error("{0}")]
    Usage(String),
    /// The operation ran but its result is a failure (exit 1).
    #[error("{0}")]
    Failed(String),
    /// Stopped by the user (exit 130).
    #[error("{0}")]
    Cancelled(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Failed(_) => 1,
            Self::Cancelled(_) => 130,
        }
    }
}

/// Map an error to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    match err.downcast_ref::<srwp::Error>() {
        Some(srwp::Error::Interrupted) => 130,
        Some(srwp::Error::NotFound { .. } | srwp::Error::Ambiguous { .. }) => 2,
        _ => 1,
    }
}

/// srwp - Back up, restore and inspect FRAM devices over SRWP.
///
/// Environment variables:
///   SRWP_DEVICE       - Device path (auto-detected if not set)
///   SRWP_FRAM_SIZE    - FRAM size in bytes (queried from the device if not set)
#[derive(Parser)]
#[command(name = "srwp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Device path (auto-detected if not specified).
    #[arg(short, long, global = true, env = "SRWP_DEVICE")]
    pub(crate) device: Option<String>,

    /// FRAM size in bytes (queried from the device if not specified).
    #[arg(short = 's', long, global = true, env = "SRWP_FRAM_SIZE", value_parser = parse_u32)]
    pub(crate) fram_size: Option<u32>,

    /// Read timeout in milliseconds.
    #[arg(long, global = true, value_name = "MS")]
    pub(crate) timeout_ms: Option<u64>,

    /// Bytes per read request during whole-device transfers.
    #[arg(long, global = true, value_parser = parse_u32)]
    pub(crate) chunk_size: Option<u32>,

    /// Attempts per chunk before a transfer fails.
    #[arg(long, global = true)]
    pub(crate) max_retries: Option<u32>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Path to a configuration file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub(crate) config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Send a message and print what the device echoes back.
    Echo {
        /// ASCII message to send.
        message: String,
    },

    /// Read a region and print it as a hex dump.
    Read {
        /// Start address (decimal or 0x hex).
        #[arg(value_parser = parse_u32)]
        address: u32,

        /// Number of bytes (decimal or 0x hex).
        #[arg(value_parser = parse_u32)]
        size: u32,
    },

    /// Write ASCII data at an address.
    Write {
        /// Start address (decimal or 0x hex).
        #[arg(value_parser = parse_u32)]
        address: u32,

        /// Data to write.
        data: String,
    },

    /// Show device size, model and port.
    Info {
        /// Output information as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Fill the whole device with zeros.
    Clear,

    /// Check whether the device is empty (all zeros).
    Check,

    /// Save the whole device to a file.
    Backup {
        /// Output file.
        file: PathBuf,
    },

    /// Write a file to the device, zero-padded to the device size.
    Restore {
        /// Input file.
        file: PathBuf,

        /// Write in independent chunks (experimental; failed chunks leave gaps).
        #[arg(long)]
        chunked: bool,
    },

    /// Compare the device against a file.
    Verify {
        /// Reference file.
        file: PathBuf,
    },

    /// Put the device into firmware update mode.
    Dfu,

    /// List candidate device paths.
    ListPorts {
        /// Output port list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (detected from $SHELL if not specified).
        #[arg(value_enum)]
        shell: Option<Shell>,
    },
}

/// Parse a number given in decimal or with a 0x prefix (underscores allowed).
pub(crate) fn parse_u32(s: &str) -> Result<u32, String> {
    let s: String = s
        .trim()
        .chars()
        .filter(|c| *c != '_')
        .collect();

    let parsed = match s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("Invalid number '{s}': {e}"))
}

impl Cli {
    /// Resolve session settings: CLI and environment first, then config files.
    pub(crate) fn session_config(&self, config: &Config) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            device: self
                .device
                .clone()
                .or_else(|| config.device.path.clone()),
            fram_size: self
                .fram_size
                .or(config.device.fram_size),
            timeout: self
                .timeout_ms
                .or(config.device.timeout_ms)
                .map_or(defaults.timeout, Duration::from_millis),
            chunk_size: self
                .chunk_size
                .or(config.transfer.chunk_size)
                .unwrap_or(defaults.chunk_size),
            max_retries: self
                .max_retries
                .or(config.transfer.max_retries)
                .unwrap_or(defaults.max_retries),
        }
    }
}

/// Open the device described by the merged settings.
pub(crate) fn open_session(cli: &Cli, config: &Config) -> Result<Session<srwp::NativePort>> {
    let settings = cli.session_config(config);
    if settings.chunk_size == 0 {
        return Err(CliError::Usage("chunk size must be greater than zero".to_string()).into());
    }
    debug!("Session settings: {settings:?}");

    let session = Session::open(&settings)?;
    ensure_not_interrupted()?;
    if !cli.quiet {
        eprintln!(
            "{} Using {} ({} bytes)",
            style("🔌").cyan(),
            style(session.port_name()).green(),
            session.device_size()
        );
    }
    Ok(session)
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();
}

fn install_interrupt_handler() {
    if let Err(e) = ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::Relaxed)) {
        debug!("Could not install Ctrl-C handler: {e}");
    }
    srwp::set_interrupt_checker(was_interrupted);
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    match &cli.command {
        Commands::Echo { message } => commands::device::cmd_echo(cli, &config, message),
        Commands::Read { address, size } => commands::device::cmd_read(cli, &config, *address, *size),
        Commands::Write { address, data } => {
            commands::device::cmd_write(cli, &config, *address, data)
        },
        Commands::Info { json } => commands::device::cmd_info(cli, &config, *json),
        Commands::Dfu => commands::device::cmd_dfu(cli, &config),
        Commands::Clear => commands::memory::cmd_clear(cli, &config),
        Commands::Check => commands::memory::cmd_check(cli, &config),
        Commands::Backup { file } => commands::memory::cmd_backup(cli, &config, file),
        Commands::Restore { file, chunked } => {
            commands::memory::cmd_restore(cli, &config, file, *chunked)
        },
        Commands::Verify { file } => commands::memory::cmd_verify(cli, &config, file),
        Commands::ListPorts { json } => commands::ports::cmd_list_ports(*json),
        Commands::Completions { shell } => commands::completions::cmd_completions(*shell),
    }
}

fn main() -> ExitCode {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);

    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();
    init_logging(&cli);
    install_interrupt_handler();

    debug!(
        "srwp v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("Error:").red().bold());
            ExitCode::from(exit_code_for(&err))
        },
    }
}
