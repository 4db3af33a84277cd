//! Server mode
//!
//! Assembles the HTTP server, starts the expiry sweeper and flushes the
//! key store once the server has stopped.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::middleware::RequestLogMiddleware;
use crate::api::services::{KeyApi, json_config, key_routes};
use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::services::ExpirySweeper;

/// Warn about CORS settings that are probably not what the operator meant.
fn validate_cors_config(allowed_origins: &[String]) {
    if allowed_origins.is_empty() {
        warn!(
            "cors.allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }
}

/// Build CORS middleware from the origin allow-list
pub fn build_cors_middleware(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        // Empty list = same-origin only
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let sweep_period = lifetime::startup::sweep_period(&config)?;
    let startup = lifetime::startup::prepare_server_startup(&config).map_err(|e| {
        tracing::error!("Server startup failed: {:#}", e);
        e
    })?;

    let store = startup.store.clone();
    let key_service = startup.key_service.clone();
    let api_settings = startup.api_settings.clone();

    let sweeper = ExpirySweeper::new(
        store.clone(),
        key_service.expiry(),
        sweep_period,
    )
    .spawn();

    let allowed_origins = config.cors.allowed_origins.clone();
    validate_cors_config(&allowed_origins);

    let max_body_size = config.server.max_body_size;
    let workers = config.server.workers.clamp(1, 32);

    let bind_address = (config.server.host.clone(), config.server.port);
    warn!(
        "Starting server at http://{}:{}",
        bind_address.0, bind_address.1
    );

    let server = HttpServer::new(move || {
        let cors = build_cors_middleware(&allowed_origins);

        App::new()
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(RequestLogMiddleware)
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-store")))
            .app_data(web::Data::new(key_service.clone()))
            .app_data(web::Data::new(api_settings.clone()))
            .app_data(json_config(max_body_size))
            .service(key_routes())
            .default_service(web::to(KeyApi::not_found))
    })
    .workers(workers)
    .disable_signals()
    .bind(bind_address)?
    .run();

    // actix signal handling is disabled: stop gracefully, then flush
    let handle = server.handle();
    tokio::spawn(async move {
        lifetime::shutdown::wait_for_signal().await;
        handle.stop(true).await;
    });

    server.await?;

    sweeper.abort();
    lifetime::shutdown::flush_store(&store);
    info!("Server stopped");

    Ok(())
}
