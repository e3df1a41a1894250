use clap::Parser;
use log::info;
use server::config::RelayConfig;
use server::network::Server;
use server::rate_limiter::RateLimitScope;
use std::path::PathBuf;

/// Command line arguments
///
/// Flags override values from `--config`, which override built-in defaults.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IP address to bind to [default: 0.0.0.0]
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on [default: 5000]
    #[arg(short, long)]
    port: Option<u16>,

    /// Minimum milliseconds between rate-limited broadcasts [default: 200]
    #[arg(long)]
    broadcast_interval_ms: Option<u64>,

    /// Which broadcasts share a rate-limit timestamp [default: global]
    #[arg(long, value_enum)]
    rate_limit: Option<RateLimitScope>,

    /// Milliseconds between dispatches while messages are queued [default: 50]
    #[arg(long)]
    dispatch_pacing_ms: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut RelayConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.broadcast_interval_ms {
            config.broadcast_interval_ms = interval;
        }
        if let Some(scope) = self.rate_limit {
            config.rate_limit = scope;
        }
        if let Some(pacing) = self.dispatch_pacing_ms {
            config.dispatch_pacing_ms = pacing;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=debug for detailed logging");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            RelayConfig::load(path).await?
        }
        None => RelayConfig::default(),
    };
    args.apply(&mut config);

    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
