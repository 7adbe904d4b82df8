use std::sync::Arc;

use actix_web::{test, App, web};
use chrono::DateTime;
use tutorly_server::{
    configure_routes, health_check, AppState, SigningSecret, StaticCredentials, SystemClock,
};

#[actix_web::test]
async fn test_health_check() {
    // Create test app
    let app = test::init_service(
        App::new()
            .route("/health", web::get().to(health_check))
    ).await;

    // Send request
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    // Assert response
    assert!(resp.status().is_success());

    // Parse response body
    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    // Verify response format
    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(
        json["timestamp"].as_str().unwrap()
    ).is_ok());
}

#[actix_web::test]
async fn test_health_check_needs_no_token() {
    let state = AppState::with_components(
        &SigningSecret::new("test_secret"),
        Arc::new(SystemClock),
        Arc::new(StaticCredentials::default()),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure_routes(cfg, state.auth_gate()))
    ).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
