use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, error};

use crate::AppState;
use crate::auth::AuthenticatedSubject;
use crate::error::AppError;
use super::completion::ChatRequest;

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Reference material sent ahead of the prompt as a system message.
    #[serde(default)]
    pub context: Option<String>,
}

pub async fn chat_completion(
    subject: AuthenticatedSubject,
    req: web::Json<CompletionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Chat completion requested by {}", subject.0);

    if req.prompt.trim().is_empty() {
        return Err(AppError::ValidationError("prompt is required".into()));
    }

    let request = ChatRequest::new(&state.completion_model, &req.prompt, req.context.as_deref());
    match state.completions.complete(&request).await {
        Ok(completion) => Ok(HttpResponse::Ok().json(completion)),
        Err(e) => {
            error!("Chat completion failed for {}: {}", subject.0, e);
            Err(e.into())
        }
    }
}
