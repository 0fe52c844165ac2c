//! `shopfloord`: the shop-floor machine tracker server.
//!
//! Usage:
//!   shopfloord -c <name-or-path> [--listen <addr>]
//!
//! A bare name resolves to `/etc/shopfloor/<name>.toml`.
//! Anything containing `/` or `.` is used as a path.

mod bootstrap;
mod config;
mod routes;

use std::path::PathBuf;

use clap::Parser;
use shopfloor_core::Module;
use tracing::info;

use config::ServerConfig;

/// Shop-floor machine tracker server.
#[derive(Parser, Debug)]
#[command(name = "shopfloord", about = "Shop-floor machine tracker server")]
struct Cli {
    /// Config name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides `[server] listen`, default 0.0.0.0:8080).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let defaults = shopfloor_core::ServiceConfig::default();
    let core_config = shopfloor_core::ServiceConfig {
        data_dir: Some(PathBuf::from(&server_config.storage.data_dir)),
        listen: cli
            .listen
            .clone()
            .or_else(|| server_config.server.listen.clone())
            .unwrap_or(defaults.listen),
        ..Default::default()
    };

    let service = bootstrap::open_service(&server_config, &core_config)?;
    let machine_module = shopfloor_machine::MachineModule::new(service);
    info!("Machine module initialized");

    let module_routes = vec![(machine_module.name(), machine_module.routes())];
    let app = routes::build_router(module_routes);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("shopfloord listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
