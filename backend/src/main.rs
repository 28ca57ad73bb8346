//! Backend entry-point: configuration, tracing, and server bootstrap.

use actix_web::web;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use fest_backend::inbound::http::health::HealthState;
use fest_backend::server::{Cli, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let config = ServerConfig::resolve(cli).map_err(std::io::Error::other)?;
    let bind_addr = config.bind_addr();

    let health_state = web::Data::new(HealthState::new());
    let server = fest_backend::server::create_server(health_state, config).await?;
    info!(%bind_addr, "listening");
    server.await
}
