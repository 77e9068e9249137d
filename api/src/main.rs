use std::sync::Arc;

use actix_web::{web, HttpServer};
use wh_api::telemetry::init_tracing;
use wh_api::{create_app, AppState};
use wh_core::services::{AuthService, TokenService, TokenServiceConfig};
use wh_infra::database::{evaluate_startup, ConnectionManager, StartupDecision};
use wh_infra::MySqlStudentRepository;
use wh_shared::config::required_variables;
use wh_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {error}");
            eprintln!("Required environment variables:");
            for variable in required_variables() {
                eprintln!("  {variable}");
            }
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);
    tracing::info!(
        environment = config.environment.as_str(),
        "Starting Wirahusada API server"
    );

    let manager = Arc::new(ConnectionManager::connect(
        &config.databases,
        config.environment,
    ));

    let results = manager.test_connections().await;
    for (database, result) in results.iter() {
        tracing::debug!(database = database.as_str(), ?result, "Connection probe");
    }

    match evaluate_startup(&results, &config.startup) {
        StartupDecision::Ready => {
            tracing::info!(
                databases = results.total(),
                average_ms = ?results.average_response_time_ms(),
                "All databases connected"
            );
        }
        StartupDecision::Degraded { unavailable } => {
            let names: Vec<&str> = unavailable.iter().map(|name| name.as_str()).collect();
            tracing::warn!(
                unavailable = ?names,
                "Starting with reduced database availability"
            );
        }
        StartupDecision::Abort { reason } => {
            tracing::error!(%reason, "Startup aborted");
            manager.close_database_connections().await;
            std::process::exit(1);
        }
    }

    let token_service = Arc::new(TokenService::new(TokenServiceConfig::from(&config.jwt))?);
    let repository = Arc::new(MySqlStudentRepository::new(Arc::clone(&manager)));
    let auth_service = Arc::new(AuthService::new(repository, token_service));

    let state = web::Data::new(
        AppState::new(auth_service, Arc::clone(&manager), config.environment)
            .with_server(config.server.clone())
            .with_cookie(config.cookie.clone()),
    );

    let bind_address = config.server.bind_address();
    tracing::info!(%bind_address, "Server listening");

    // HttpServer stops on SIGINT/SIGTERM and lets in-flight requests finish
    HttpServer::new(move || create_app(state.clone()))
        .bind(&bind_address)?
        .run()
        .await?;

    tracing::info!("Server stopped, closing database connections");
    let summary = manager.close_database_connections().await;
    if summary.is_clean() {
        tracing::info!(closed = summary.closed.len(), "Database connections closed");
    } else {
        for (database, error) in &summary.failed {
            tracing::error!(database = database.as_str(), %error, "Failed to close pool");
        }
    }

    Ok(())
}
