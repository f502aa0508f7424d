/// ota-server - hand firmware.bin to devices on the local network
use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use ota_server::{router, AppState, FIRMWARE_ROUTE};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ota-server")]
#[command(about = "Serve a firmware image for over-the-air updates", long_about = None)]
struct Cli {
    /// TCP port to listen on
    #[arg(short, long, env = "OTA_SERVER_PORT", default_value_t = 8000)]
    port: u16,

    /// Firmware image to serve
    #[arg(short, long, env = "OTA_SERVER_FIRMWARE", default_value = "firmware.bin")]
    firmware: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ota_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if !cli.firmware.exists() {
        tracing::warn!(
            "{} does not exist yet; requests will get 404 until it does",
            cli.firmware.display()
        );
    }

    let app = router(AppState::new(cli.firmware.clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        "Starting OTA server on {} (GET {} -> {})",
        addr,
        FIRMWARE_ROUTE,
        cli.firmware.display()
    );
    axum::serve(listener, app).await?;

    Ok(())
}
