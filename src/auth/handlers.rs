use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::auth::AuthenticatedSubject;
use crate::error::{AppError, AuthError};
use tracing::{info, warn, error};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for user: {}", req.username);

    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::ValidationError("username and password are required".into()));
    }

    if !state.credentials.verify(&req.username, &req.password).await? {
        warn!("Login failed for user: {}", req.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    match state.issuer.issue(&req.username) {
        Ok(token) => {
            info!("Login successful for user: {}", req.username);
            Ok(HttpResponse::Ok().json(AuthResponse { token }))
        }
        Err(e) => {
            error!("Token issuance failed for user: {}: {}", req.username, e);
            Err(e.into())
        }
    }
}

/// Echoes the identity the auth gate attached to the request.
pub async fn whoami(subject: AuthenticatedSubject) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "subject": subject.0
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::MockCredentialVerifier;
    use crate::auth::token::{FixedClock, SigningSecret};
    use actix_web::{http::StatusCode, test, App};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(credentials: MockCredentialVerifier) -> AppState {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()));
        AppState::with_components(&SigningSecret::new("test_secret"), clock, Arc::new(credentials))
    }

    #[actix_web::test]
    async fn test_login_issues_verifiable_token() {
        let mut credentials = MockCredentialVerifier::new();
        credentials
            .expect_verify()
            .with(eq("alice"), eq("password123"))
            .times(1)
            .returning(|_, _| Ok(true));
        let state = state_with(credentials);
        let verifier = state.verifier.clone();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/auth/login", web::post().to(login)),
        )
        .await;

        let resp = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "username": "alice", "password": "password123" }))
            .send_request(&app)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(verifier.verify(&body.token).unwrap().subject, "alice");
    }

    #[actix_web::test]
    async fn test_login_rejected_credentials() {
        let mut credentials = MockCredentialVerifier::new();
        credentials.expect_verify().returning(|_, _| Ok(false));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(credentials)))
                .route("/auth/login", web::post().to(login)),
        )
        .await;

        let resp = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "username": "alice", "password": "nope" }))
            .send_request(&app)
            .await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_login_requires_both_fields() {
        let mut credentials = MockCredentialVerifier::new();
        credentials.expect_verify().never();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(credentials)))
                .route("/auth/login", web::post().to(login)),
        )
        .await;

        let resp = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "username": "alice", "password": "" }))
            .send_request(&app)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_credential_backend_failure_is_internal_error() {
        let mut credentials = MockCredentialVerifier::new();
        credentials
            .expect_verify()
            .returning(|_, _| Err(AppError::InternalError("backend down".into())));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(credentials)))
                .route("/auth/login", web::post().to(login)),
        )
        .await;

        let resp = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "username": "alice", "password": "pw" }))
            .send_request(&app)
            .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
