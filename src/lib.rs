pub mod auth;
pub mod config;
pub mod error;
pub mod proxy;

use std::sync::Arc;
use actix_web::{web, HttpResponse};
use tracing::warn;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{
    AuthGate, AuthenticatedSubject, Claims, Clock, CredentialVerifier, SigningSecret,
    StaticCredentials, SystemClock, TokenIssuer, TokenVerifier,
};
pub use proxy::{CompletionClient, OpenAiClient, UnconfiguredCompletions};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub verifier: Arc<TokenVerifier>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub completions: Arc<dyn CompletionClient>,
    pub completion_model: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self> {
        let secret = SigningSecret::new(&settings.auth.jwt_secret);
        if secret.is_empty() {
            warn!(
                "JWT signing secret is empty; tokens can be forged. Set {} or APP_AUTH__JWT_SECRET",
                crate::config::LEGACY_SECRET_VAR
            );
        }

        if settings.openai.api_key.as_deref().map_or(true, str::is_empty) {
            warn!(
                "No completion API key configured; /chat-completion will fail. Set {} or APP_OPENAI__API_KEY",
                crate::config::LEGACY_OPENAI_KEY_VAR
            );
        }

        let credentials = StaticCredentials::new(settings.auth.users.clone());
        let completions = OpenAiClient::new(&settings.openai)?;

        Ok(Self::with_components(&secret, Arc::new(SystemClock), Arc::new(credentials))
            .with_completions(Arc::new(completions), &settings.openai.model))
    }

    pub fn with_components(
        secret: &SigningSecret,
        clock: Arc<dyn Clock>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            issuer: Arc::new(TokenIssuer::new(secret, clock.clone())),
            verifier: Arc::new(TokenVerifier::new(secret, clock)),
            credentials,
            completions: Arc::new(UnconfiguredCompletions),
            completion_model: String::new(),
        }
    }

    pub fn with_completions(mut self, completions: Arc<dyn CompletionClient>, model: &str) -> Self {
        self.completions = completions;
        self.completion_model = model.to_string();
        self
    }

    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(self.verifier.clone())
    }
}

/// Public routes, then everything guarded by the auth gate.
pub fn configure_routes(cfg: &mut web::ServiceConfig, gate: AuthGate) {
    cfg.route("/health", web::get().to(health_check))
        .route("/auth/login", web::post().to(auth::handlers::login))
        .service(
            web::resource("/chat-completion")
                .wrap(gate.clone())
                .route(web::post().to(proxy::handlers::chat_completion)),
        )
        .service(
            web::scope("/api")
                .wrap(gate)
                .route("/whoami", web::get().to(auth::handlers::whoami)),
        );
}
