//! Integration tests for the health endpoints and application fallbacks

mod common;

use actix_web::test;
use serde_json::Value;
use wh_api::create_app;
use wh_infra::database::testing::ScriptedPool;
use wh_shared::Environment;

use common::{context, context_with, manager};

#[actix_web::test]
async fn test_basic_health() {
    let ctx = context_with(Environment::Development, manager(ScriptedPool::unreachable));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    // The basic check never touches the databases
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "development");
    assert!(body["uptime"].as_f64().is_some());
}

#[actix_web::test]
async fn test_database_health_all_connected() {
    let ctx = context(Environment::Development);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health/database").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["checkDuration"].as_str().unwrap().ends_with("ms"));
}

#[actix_web::test]
async fn test_database_health_unreachable() {
    let ctx = context_with(Environment::Development, manager(ScriptedPool::unreachable));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health/database").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 503);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unhealthy");
}

#[actix_web::test]
async fn test_detailed_health() {
    let ctx = context(Environment::Development);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health/detailed").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["system"]["environment"], "development");
    assert!(body["system"]["pid"].as_u64().is_some());
    assert!(body["database"].is_object());
}

#[actix_web::test]
async fn test_database_config_hides_credentials() {
    let ctx = context(Environment::Development);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/health/database/config")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("password"));
}

#[actix_web::test]
async fn test_index_lists_endpoints() {
    let ctx = context(Environment::Development);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["endpoints"]["auth"]["login"], "POST /api/auth/login");
}

#[actix_web::test]
async fn test_unknown_endpoint() {
    let ctx = context(Environment::Development);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/unknown").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Endpoint not found");
    assert_eq!(body["errors"][0]["message"], "GET /api/unknown not found");
}
