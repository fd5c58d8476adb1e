//! espwatch - ESP32 telemetry relay and dashboard viewer.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use espwatch::config::CONFIG_ENV_VAR;
use espwatch::{AppConfig, Application};
use espwatch_viewer::Transport;
use tracing::info;

/// ESP32 telemetry relay and dashboard viewer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (can also be set via ESPWATCH_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the telemetry relay.
    Serve(ServeArgs),
    /// Run the headless dashboard against a relay.
    Watch(WatchArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
    /// Address to bind
    #[arg(long)]
    bind: Option<String>,
    /// Forward every accepted snapshot to this ingestion URL
    #[arg(long)]
    mirror_url: Option<String>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Relay origin, e.g. http://127.0.0.1:3000
    #[arg(short, long)]
    base_url: Option<String>,
    /// Snapshot transport
    #[arg(short, long, value_parser = parse_transport)]
    transport: Option<Transport>,
    /// Render interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

fn parse_transport(s: &str) -> Result<Transport, String> {
    match s.to_ascii_lowercase().as_str() {
        "poll" => Ok(Transport::Poll),
        "push" => Ok(Transport::Push),
        other => Err(format!("unknown transport {other:?} (expected poll or push)")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before any HTTPS/WSS connection
    espwatch_viewer::init_crypto();

    let cli = Cli::parse();

    espwatch_telemetry::init_logging()?;

    info!("Starting espwatch v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > ESPWATCH_CONFIG > default path
    let config_path = cli.config.or_else(|| std::env::var(CONFIG_ENV_VAR).ok());
    info!(config_path = ?config_path, "Loading configuration");

    let mut config = AppConfig::load(config_path.as_deref())?;

    match cli.command {
        Command::Serve(args) => {
            if let Some(port) = args.port {
                config.relay.port = port;
            }
            if let Some(bind) = args.bind {
                config.relay.bind_addr = bind;
            }
            if args.mirror_url.is_some() {
                config.relay.mirror_url = args.mirror_url;
            }

            let app = Application::new(config);
            app.install_signal_handler();
            app.serve().await?;
        }
        Command::Watch(args) => {
            if let Some(base_url) = args.base_url {
                config.viewer.base_url = base_url;
            }
            if let Some(transport) = args.transport {
                config.viewer.transport = transport;
            }
            if let Some(interval_ms) = args.interval_ms {
                config.viewer.tick_interval_ms = interval_ms;
            }

            let app = Application::new(config);
            app.install_signal_handler();
            app.watch().await?;
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
