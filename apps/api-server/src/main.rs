//! # Folio API Server
//!
//! The actix-web binary behind the Folio portfolio site: the batched RPC
//! endpoint, session sign-in/sign-out, and the server-rendered pages.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod api;
mod config;
mod handlers;
mod middleware;
mod pages;
mod state;

use config::AppConfig;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Folio API server on {}:{}",
        config.host,
        config.port
    );
    if config.dev_delay {
        tracing::info!("Development mode: artificial procedure latency enabled");
    }

    // Build application state
    let state = AppState::new(&config).await;

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,api_server=debug,folio_rpc=debug,folio_infra=debug")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
