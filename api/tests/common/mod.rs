//! Shared fixtures for the API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use wh_api::AppState;
use wh_core::domain::Student;
use wh_core::repositories::InMemoryStudentRepository;
use wh_core::services::{AuthService, RetryPolicy, TokenService, TokenServiceConfig};
use wh_infra::database::testing::ScriptedPool;
use wh_infra::database::{ConnectionManager, DatabasePool};
use wh_shared::{DatabaseName, Environment, JwtConfig, ServerConfig};

pub const NRM: &str = "2021-001";
pub const NIM: &str = "1234567890";
pub const NAMAM: &str = "Siti Aminah";

pub const BROWSER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
pub const MOBILE_AGENT: &str = "okhttp/4.12.0";

pub fn token_service() -> Arc<TokenService> {
    let jwt = JwtConfig::new(
        "api-tests-access-secret-0123456789abcdef",
        "api-tests-refresh-secret-0123456789abcdef",
    )
    .unwrap();
    Arc::new(TokenService::new(TokenServiceConfig::from(&jwt)).unwrap())
}

pub fn repository() -> InMemoryStudentRepository {
    let mut student = Student::new(NRM, NIM, NAMAM);
    student.tplahir = Some("Malang".to_string());
    student.email = Some("siti@example.ac.id".to_string());
    student.phone = Some(String::new());
    InMemoryStudentRepository::with_students(vec![student])
}

/// Manager over five scripted pools, probing once per health check
pub fn manager(pool: impl Fn() -> ScriptedPool) -> Arc<ConnectionManager> {
    let pools = DatabaseName::ALL.iter().map(|name| {
        let pool: Arc<dyn DatabasePool> = Arc::new(pool());
        (*name, pool)
    });
    Arc::new(
        ConnectionManager::new(pools, Environment::Development)
            .with_probe_policy(RetryPolicy::query(false)),
    )
}

pub struct TestContext {
    pub state: web::Data<AppState<InMemoryStudentRepository>>,
    pub repository: InMemoryStudentRepository,
    pub tokens: Arc<TokenService>,
}

pub fn context(environment: Environment) -> TestContext {
    context_with(environment, manager(ScriptedPool::healthy))
}

pub fn context_with(environment: Environment, manager: Arc<ConnectionManager>) -> TestContext {
    context_with_server(environment, manager, ServerConfig::default())
}

pub fn context_with_server(
    environment: Environment,
    manager: Arc<ConnectionManager>,
    server: ServerConfig,
) -> TestContext {
    let repository = repository();
    let tokens = token_service();
    let auth_service = Arc::new(AuthService::new(
        Arc::new(repository.clone()),
        Arc::clone(&tokens),
    ));
    let state = web::Data::new(
        AppState::new(auth_service, manager, environment).with_server(server),
    );
    TestContext {
        state,
        repository,
        tokens,
    }
}

pub fn login_body() -> serde_json::Value {
    serde_json::json!({ "namam_nim": NIM, "nrm": NRM })
}

/// Same secrets as [`token_service`], but every token is already expired
pub fn expired_token_service() -> TokenService {
    let jwt = JwtConfig::new(
        "api-tests-access-secret-0123456789abcdef",
        "api-tests-refresh-secret-0123456789abcdef",
    )
    .unwrap()
    .with_expiry(-60, -60);
    TokenService::new(TokenServiceConfig::from(&jwt)).unwrap()
}

pub fn student() -> Student {
    Student::new(NRM, NIM, NAMAM)
}
