//! Health check endpoints
//!
//! `/health` answers without touching the databases; the database endpoints
//! probe all five pools on every call.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use wh_infra::database::{ConnectionManager, DatabaseHealth, HealthStatus};
use wh_shared::config::DatabaseConfigSummary;
use wh_shared::{DatabaseName, Environment};

/// Process facts reported by the health endpoints
#[derive(Debug, Clone, Copy)]
pub struct ServiceInfo {
    pub environment: Environment,
    pub version: &'static str,
    started_at: Instant,
}

impl ServiceInfo {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            version: env!("CARGO_PKG_VERSION"),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Seconds since startup
    pub uptime: f64,
    pub timestamp: DateTime<Utc>,
    pub environment: Environment,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealthResponse {
    #[serde(flatten)]
    pub health: DatabaseHealth,
    pub check_duration: String,
}

#[derive(Debug, Serialize)]
pub struct DatabaseConfigResponse {
    pub status: &'static str,
    pub configurations: BTreeMap<DatabaseName, DatabaseConfigSummary>,
    pub timestamp: DateTime<Utc>,
    pub note: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub uptime: f64,
    pub environment: Environment,
    pub version: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
    pub pid: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub check_duration: String,
    pub system: SystemInfo,
    pub database: DatabaseHealth,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(health))
        .route("/database", web::get().to(database_health))
        .route("/database/config", web::get().to(database_config))
        .route("/detailed", web::get().to(detailed_health));
}

/// GET /health
pub async fn health(info: web::Data<ServiceInfo>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        uptime: info.uptime().as_secs_f64(),
        timestamp: Utc::now(),
        environment: info.environment,
        version: info.version,
    })
}

/// GET /health/database, 503 when no database answers
pub async fn database_health(manager: web::Data<ConnectionManager>) -> HttpResponse {
    let started = Instant::now();
    let health = manager.get_database_health().await;
    let check_duration = format_duration(started.elapsed());

    tracing::debug!(status = health.status.as_str(), %check_duration, "Database health checked");
    let mut response = status_response(&health);
    response.json(DatabaseHealthResponse {
        health,
        check_duration,
    })
}

/// GET /health/database/config, connection settings without credentials
pub async fn database_config(manager: web::Data<ConnectionManager>) -> HttpResponse {
    HttpResponse::Ok().json(DatabaseConfigResponse {
        status: "success",
        configurations: manager.configurations().clone(),
        timestamp: Utc::now(),
        note: "Sensitive credentials are not exposed in this endpoint",
    })
}

/// GET /health/detailed
pub async fn detailed_health(
    manager: web::Data<ConnectionManager>,
    info: web::Data<ServiceInfo>,
) -> HttpResponse {
    let started = Instant::now();
    let database = manager.get_database_health().await;

    let mut response = status_response(&database);
    response.json(DetailedHealthResponse {
        status: database.status,
        timestamp: Utc::now(),
        check_duration: format_duration(started.elapsed()),
        system: SystemInfo {
            uptime: info.uptime().as_secs_f64(),
            environment: info.environment,
            version: info.version,
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            pid: std::process::id(),
        },
        database,
    })
}

fn status_response(health: &DatabaseHealth) -> actix_web::HttpResponseBuilder {
    if health.is_unhealthy() {
        HttpResponse::ServiceUnavailable()
    } else {
        HttpResponse::Ok()
    }
}

fn format_duration(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}
