use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use multicam::{Launcher, MulticamConfig, Services, SourceKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "multicam")]
#[command(about = "Supervisor for multi-camera monitoring workers")]
#[command(version)]
#[command(long_about = "Loads per-camera configuration from an operator prompt, the database, \
a JSON file or built-in defaults, validates the environment, and supervises one monitoring \
worker per camera. Also runs dependency diagnostics and bootstraps the database schema.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "multicam.toml", help = "Path to TOML configuration file")]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = LogLevel::Info, help = "Logging level")]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, help = "Log output format")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Load cameras and supervise them (default)
    Run {
        #[arg(long, value_enum, default_value_t = SourceKind::Interactive)]
        source: SourceKind,

        /// Stop automatically after this many seconds
        #[arg(long, value_name = "SECONDS")]
        run_time: Option<u64>,
    },
    /// Enter cameras interactively and save them to the camera file
    Config,
    /// Probe every external dependency
    Diagnostics,
    /// Apply the database schema script
    InitDb {
        #[arg(long, value_name = "PATH")]
        schema: Option<PathBuf>,
    },
    /// Run the preflight checks and exit
    ValidateOnly,
    /// Print the default configuration in TOML format
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.clone().unwrap_or(Command::Run {
        source: SourceKind::Interactive,
        run_time: None,
    });

    // Handle special modes that don't require full initialization
    if let Command::PrintConfig = command {
        print_default_config()?;
        return Ok(());
    }

    let config = match MulticamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&args, &config.paths.log_dir)?;
    info!("Configuration file: {}", args.config.display());

    let services = Services::production(&config);
    let launcher = Launcher::new(Arc::new(config), services);
    launcher.banner();

    let outcome = match command {
        Command::Run { source, run_time } => {
            launcher
                .run(source, run_time.map(Duration::from_secs))
                .await
        }
        Command::Config => launcher.configure().await,
        Command::Diagnostics => Ok(launcher.diagnostics().await),
        Command::InitDb { schema } => Ok(launcher.init_db(schema.as_deref()).await),
        Command::ValidateOnly => Ok(launcher.validate_only().await),
        Command::PrintConfig => Ok(0),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("✗ Application error: {}", e);
            1
        }
    };

    info!("Multicam exited with code: {}", exit_code);
    drop(_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args, log_dir: &Path) -> Result<WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let verbose = args.log_level == LogLevel::Debug;

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("multicam={}", args.log_level.as_str())));

    let console_layer = match args.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(verbose)
            .with_file(verbose)
            .with_line_number(verbose)
            .boxed(),
    };

    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, "multicam.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .boxed();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Multicam Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Any value can be overridden with MULTICAM_<SECTION>__<KEY> environment variables");
    println!();
    println!("{}", toml::to_string_pretty(&MulticamConfig::default())?);
    Ok(())
}
