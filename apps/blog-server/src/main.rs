//! # Folio Blog Server
//!
//! Actix-web front end over the post repository: JSON reads, live SSE feeds
//! and token-gated admin writes.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Folio blog server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(config.store.as_ref()).await;

    #[cfg(feature = "auth")]
    let token_service: std::sync::Arc<dyn folio_core::ports::TokenService> =
        std::sync::Arc::new(folio_infra::JwtTokenService::from_env());

    #[cfg(feature = "auth")]
    let owners = {
        if config.owners.is_open() {
            tracing::warn!("OWNER_EMAILS is empty. Any valid token may write posts.");
        }
        web::Data::new(config.owners.clone())
    };

    HttpServer::new(move || {
        let app = App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()));

        #[cfg(feature = "auth")]
        let app = app
            .app_data(web::Data::new(token_service.clone()))
            .app_data(owners.clone());

        app.configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
