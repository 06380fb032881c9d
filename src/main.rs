//! Condensate Monitor CLI
//!
//! Temperature trend forecasting and breach alarms for tank sensors.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use condensate_monitor::{
    config::Config,
    core::{run_from_source, DashboardReport},
    source::{self, FileSource, RowSource},
    VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "condensate-monitor")]
#[command(version = VERSION)]
#[command(about = "Temperature trend forecasting and breach alarms for tank sensors", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and print the report
    Run {
        /// Read rows from this JSON file instead of the configured source
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Re-run the pipeline periodically until Ctrl+C
    Watch {
        /// Read rows from this JSON file instead of the configured source
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Seconds between runs
        #[arg(long, default_value = "60")]
        interval: u64,
    },

    /// Serve the dashboard report over HTTP (requires server feature)
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,

        /// Listen on all interfaces instead of localhost
        #[arg(long)]
        public: bool,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { input, format } => cmd_run(cli.config, input, format),
        Commands::Watch { input, interval } => cmd_watch(cli.config, input, interval),
        Commands::Serve { port, public } => cmd_serve(cli.config, port, public),
        Commands::Config => cmd_config(cli.config),
        Commands::InitConfig { force } => cmd_init_config(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Load configuration from an explicit path or the default location.
fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load_from(&p).with_context(|| format!("loading {}", p.display())),
        None => Ok(Config::load().unwrap_or_else(|e| {
            tracing::warn!("Could not load config, using defaults: {}", e);
            Config::default()
        })),
    }
}

/// Pick the row source: an explicit input file wins over the configuration.
fn open_source(
    config: &Config,
    input: Option<PathBuf>,
) -> anyhow::Result<Box<dyn RowSource + Send + Sync>> {
    match input {
        Some(path) => Ok(Box::new(FileSource::new(path))),
        None => Ok(source::from_config(&config.source)?),
    }
}

fn print_report(report: &DashboardReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", report.summary()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn cmd_run(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let source = open_source(&config, input)?;

    let report = run_from_source(source.as_ref(), &config.pipeline)?;
    print_report(&report, format)
}

fn cmd_watch(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    interval: u64,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let source = open_source(&config, input)?;
    let interval = Duration::from_secs(interval.max(1));

    println!("Condensate Monitor v{VERSION}");
    println!("Watching '{}' every {}s", source.name(), interval.as_secs());
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    while running.load(Ordering::SeqCst) {
        // A failed fetch only skips this round; the next tick retries.
        match run_from_source(source.as_ref(), &config.pipeline) {
            Ok(report) => print_report(&report, OutputFormat::Text)?,
            Err(e) => eprintln!("Run failed: {e}"),
        }

        let started = Instant::now();
        while running.load(Ordering::SeqCst) && started.elapsed() < interval {
            thread::sleep(Duration::from_millis(100));
        }
    }

    println!("Stopped.");
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(config_path: Option<PathBuf>, port: Option<u16>, public: bool) -> anyhow::Result<()> {
    use condensate_monitor::server::{run, ServerConfig};
    use std::net::{IpAddr, Ipv4Addr};

    let config = load_config(config_path)?;
    let source: Arc<dyn RowSource + Send + Sync> = Arc::from(source::from_config(&config.source)?);

    let mut server_config =
        ServerConfig::new(port.unwrap_or(config.port), config.pipeline.clone(), source);
    if public {
        server_config.host = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (addr, shutdown_tx) = run(server_config).await?;
        println!("Condensate monitor serving on http://{addr}");
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_config_path: Option<PathBuf>, _port: Option<u16>, _public: bool) -> anyhow::Result<()> {
    anyhow::bail!("the serve command requires the `server` feature")
}

fn cmd_config(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path.clone())?;

    println!("Configuration");
    println!("=============");
    println!();
    println!(
        "Config file: {:?}",
        config_path.unwrap_or_else(Config::config_path)
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

fn cmd_init_config(force: bool) -> anyhow::Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save()?;
    println!("Wrote default configuration to {path:?}");
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
