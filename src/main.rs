use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linebot_runtime::config::Cli;

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=debug for per-write pin traces)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Mode: {:?}, hardware {}",
        config.mode,
        if config.hardware.enabled { "enabled" } else { "simulated" }
    );

    if let Err(e) = linebot_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
