use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use auth::AuthenticationError;
use auth::Authenticator;
use auth::TokenKind;
use futures::future::BoxFuture;
use thiserror::Error;
use tonic::body::BoxBody;
use tonic::codegen::http;
use tonic::Status;
use tower::Layer;
use tower::Service;

use crate::domain::user::models::UserId;

/// gRPC paths reachable without an access token.
pub const PUBLIC_METHODS: [&str; 3] = [
    "/user_service.v1.UserService/Register",
    "/user_service.v1.UserService/Login",
    "/user_service.v1.UserService/RefreshTokens",
];

const AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "bearer ";

/// Extension type carrying the caller identity into handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl AuthenticatedUser {
    /// Read the identity the gate attached to `request`.
    ///
    /// # Errors
    /// * `Internal` - The request did not pass through the gate
    pub fn from_request<T>(request: &tonic::Request<T>) -> Result<Self, Status> {
        request.extensions().get::<Self>().copied().ok_or_else(|| {
            tracing::error!("Authenticated user missing from request extensions");
            Status::internal("Internal error")
        })
    }
}

/// Reasons a protected call is turned away.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Missing authorization token")]
    MissingToken,

    #[error("Wrong token type")]
    WrongTokenKind,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<AuthenticationError> for GateError {
    fn from(e: AuthenticationError) -> Self {
        match e {
            AuthenticationError::WrongTokenKind { .. } => GateError::WrongTokenKind,
            other => GateError::InvalidToken(other.to_string()),
        }
    }
}

impl From<GateError> for Status {
    fn from(e: GateError) -> Self {
        match e {
            GateError::MissingToken => Status::unauthenticated("Missing authorization token"),
            GateError::WrongTokenKind => Status::unauthenticated("wrong token type"),
            GateError::InvalidToken(_) => Status::unauthenticated("Invalid or expired token"),
        }
    }
}

/// Access decision for incoming calls.
#[derive(Clone)]
pub struct AuthGate {
    authenticator: Arc<Authenticator>,
}

impl AuthGate {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Decide whether a call to `path` may proceed.
    ///
    /// # Arguments
    /// * `path` - gRPC method path, e.g. `/user_service.v1.UserService/Login`
    /// * `authorization` - Raw `authorization` metadata value, if any
    ///
    /// # Returns
    /// `None` for public methods, the caller identity otherwise
    ///
    /// # Errors
    /// * `MissingToken` - Protected method called without a token
    /// * `WrongTokenKind` - A refresh token was presented
    /// * `InvalidToken` - Signature, expiry, format or subject check failed
    pub fn authorize(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Option<AuthenticatedUser>, GateError> {
        if PUBLIC_METHODS.contains(&path) {
            return Ok(None);
        }

        let token = authorization
            .map(strip_bearer)
            .filter(|t| !t.is_empty())
            .ok_or(GateError::MissingToken)?;

        let claims = self
            .authenticator
            .validate_token(token, TokenKind::Access)?;

        let user_id = UserId::from_string(claims.subject())
            .map_err(|e| GateError::InvalidToken(e.to_string()))?;

        Ok(Some(AuthenticatedUser { user_id }))
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim_start();
    match value.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            value[BEARER_PREFIX.len()..].trim()
        }
        _ => value.trim_end(),
    }
}

/// Tower layer applying [`AuthGate`] in front of the tonic router.
#[derive(Clone)]
pub struct AuthGateLayer {
    gate: AuthGate,
}

impl AuthGateLayer {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self {
            gate: AuthGate::new(authenticator),
        }
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGateService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthGateService<S> {
    inner: S,
    gate: AuthGate,
}

impl<S, B> Service<http::Request<B>> for AuthGateService<S>
where
    S: Service<http::Request<B>, Response = http::Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<B>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let authorization = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let decision = self.gate.authorize(request.uri().path(), authorization);

        match decision {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
                Box::pin(inner.call(request))
            }
            Ok(None) => Box::pin(inner.call(request)),
            Err(e) => {
                tracing::warn!(
                    path = %request.uri().path(),
                    error = %e,
                    "Rejected unauthenticated call"
                );
                let response = Status::from(e).to_http();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
