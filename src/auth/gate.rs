//! Request filter guarding protected routes.
//!
//! Every request either reaches the wrapped service with an
//! [`AuthenticatedSubject`] in its extensions, or is answered directly with a
//! plain-text rejection. Never both, never neither.

use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{ContentType, HeaderMap},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use super::token::{Claims, TokenVerifier};
use crate::error::{AppError, AuthError};

/// Header carrying the raw token. Kept for compatibility with existing
/// clients instead of `Authorization: Bearer`.
pub const TOKEN_HEADER: &str = "Token";

/// Identity of the caller, set by [`AuthGate`] after successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub String);

impl FromRequest for AuthenticatedSubject {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedSubject>()
                .cloned()
                .ok_or(AppError::AuthError(AuthError::MissingToken)),
        )
    }
}

/// Reads the token header and verifies it.
pub fn authorize(headers: &HeaderMap, verifier: &TokenVerifier) -> Result<Claims, AuthError> {
    let value = headers.get(TOKEN_HEADER).ok_or(AuthError::MissingToken)?;
    let token = value
        .to_str()
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    verifier.verify(token)
}

fn rejection(err: &AuthError) -> HttpResponse {
    HttpResponse::build(err.status_code())
        .content_type(ContentType::plaintext())
        .body(err.to_string())
}

#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authorize(req.headers(), &self.verifier) {
            Ok(claims) => {
                debug!(subject = %claims.subject, path = %req.path(), "token verified");
                req.extensions_mut()
                    .insert(AuthenticatedSubject(claims.subject));

                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                warn!(path = %req.path(), error = %err, "rejecting request");
                let response = req.into_response(rejection(&err));
                Box::pin(ready(Ok(response.map_into_right_body())))
            }
        }
    }
}
