//! Demo-grade login gate. One fixed credential pair, no hashing and no
//! lockout; the session lives in the local store until logout.
//!
//! There is exactly one session for the whole process, the same way a
//! browser keeps one entry in local storage. Once anyone logs in, every
//! client that can reach the listener passes the guard until someone logs
//! out. This is not per-client authentication.

use crate::errors::AppError;
use crate::models::Session;
use crate::state::AppState;
use crate::storage::LocalStore;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const AUTH_STORAGE_KEY: &str = "ai-traffic-auth";
pub const LOGIN_FAILED: &str = "Invalid email or password";

const DEMO_IDENTIFIER: &str = "admin@traffic.ai";
const DEMO_SECRET: &str = "admin123";
const DEMO_TOKEN: &str = "dummy-jwt-token-12345";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(Session),
    Failure { message: String },
}

#[derive(Clone)]
pub struct AuthGate {
    storage: Arc<Mutex<LocalStore>>,
}

impl AuthGate {
    pub fn new(storage: LocalStore) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<LoginOutcome, AppError> {
        if identifier != DEMO_IDENTIFIER || secret != DEMO_SECRET {
            warn!("rejected login for {identifier}");
            return Ok(LoginOutcome::Failure {
                message: LOGIN_FAILED.to_string(),
            });
        }

        let session = Session {
            identifier: identifier.to_string(),
            token: DEMO_TOKEN.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let value = serde_json::to_value(&session).map_err(AppError::internal)?;
        self.storage.lock().await.set(AUTH_STORAGE_KEY, value).await?;

        info!("session started for {identifier}");
        Ok(LoginOutcome::Success(session))
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.storage.lock().await.remove(AUTH_STORAGE_KEY).await?;
        info!("session cleared");
        Ok(())
    }

    /// The persisted session, if one exists and is well formed.
    pub async fn current_session(&self) -> Option<Session> {
        let storage = self.storage.lock().await;
        let value = storage.get(AUTH_STORAGE_KEY)?.clone();
        serde_json::from_value::<Session>(value)
            .ok()
            .filter(Session::is_valid)
    }

    pub async fn bearer_token(&self) -> Option<String> {
        self.current_session().await.map(|session| session.token)
    }
}

/// Guards protected routes. Pages redirect to the login view, API calls get 401.
pub async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.auth.current_session().await.is_some() {
        return next.run(request).await;
    }

    if request.uri().path().starts_with("/api/") {
        AppError::unauthorized("login required").into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}
