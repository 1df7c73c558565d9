use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fontdeck::api;
use fontdeck::catalog::{CatalogService, GoogleFontsClient};
use fontdeck::config::Config;
use fontdeck::middleware::Cors;
use fontdeck::server::Server;

#[derive(Parser, Debug)]
#[command(name = "fontdeck")]
#[command(about = "Caching, filtering proxy over the Google Fonts catalog")]
#[command(version)]
struct Args {
    /// Address to listen on (overrides FONTDECK_ADDR)
    #[arg(short, long)]
    addr: Option<String>,

    /// JSON file with self-hosted font records (overrides FONTDECK_LOCAL_FONTS)
    #[arg(short, long)]
    local_fonts: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fontdeck=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(path) = args.local_fonts {
        config.local_fonts = Some(path);
    }

    let local = config.local_font_records()?;
    let client = GoogleFontsClient::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.upstream_timeout,
    )?;
    let catalog = Arc::new(CatalogService::new(
        Arc::new(client),
        config.cache_ttl,
        local,
    ));
    let cors = Cors::for_origins(config.cors_origins.iter().cloned());

    let service = api::router(catalog, cors).into_service();
    let server = Server::bind(&config.addr).await?;
    server.run_until(service, shutdown_signal()).await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
