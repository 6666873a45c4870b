use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ProviderError;
use crate::provider::TokenProvider;
use crate::resilience::retry::RetrySettings;
use crate::server::server::AppState;
use crate::token::{IssuedToken, TokenRequirement};
use crate::transport::HttpTransport;

pub const TOKEN_ROUTE: &str = "/targets/{name}/token";

/// Configured targets plus the provider that serves them.
#[derive(Clone)]
pub struct TokenState {
    pub provider: Arc<TokenProvider<HttpTransport>>,
    pub requirements: Arc<HashMap<String, TokenRequirement>>,
    pub timeout: Duration,
    pub retry: RetrySettings,
}

impl TokenState {
    pub fn new(
        provider: Arc<TokenProvider<HttpTransport>>,
        requirements: HashMap<String, TokenRequirement>,
        timeout: Duration,
        retry: RetrySettings,
    ) -> Self {
        Self {
            provider,
            requirements: Arc::new(requirements),
            timeout,
            retry,
        }
    }

    pub fn router(&self) -> Router<AppState> {
        for name in self.requirements.keys() {
            info!("served target: {}", name);
        }
        Router::new().route(TOKEN_ROUTE, get(get_token).delete(cancel_token))
    }
}

/// JSON view of an issued token; key material is never exposed.
#[derive(Debug, Serialize)]
pub struct TokenView {
    pub target: String,
    pub token: String,
    pub token_type: Option<String>,
    pub identifier: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub has_proof_key: bool,
}

impl TokenView {
    pub fn new(target: &str, token: &IssuedToken) -> Self {
        Self {
            target: target.to_owned(),
            token: token.payload().to_owned(),
            token_type: token.token_type().map(str::to_owned),
            identifier: token.identifier().to_string(),
            valid_from: token.valid_from(),
            valid_to: token.valid_to(),
            has_proof_key: token.proof_key().is_some(),
        }
    }
}

async fn get_token(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let tokens = &state.tokens;
    let Some(requirement) = tokens.requirements.get(&name) else {
        return (StatusCode::NOT_FOUND, format!("unknown target '{}'", name)).into_response();
    };

    let provider = &tokens.provider;
    let result = tokens
        .retry
        .run_with_retry(
            || provider.acquire_token(requirement, tokens.timeout),
            |e: &ProviderError| matches!(e, ProviderError::Issuance(_)),
        )
        .await;

    match result {
        Ok(token) => (StatusCode::OK, Json(TokenView::new(&name, &token))).into_response(),
        Err(e) => error_response(&name, e),
    }
}

async fn cancel_token(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let tokens = &state.tokens;
    let Some(requirement) = tokens.requirements.get(&name) else {
        return (StatusCode::NOT_FOUND, format!("unknown target '{}'", name)).into_response();
    };

    let token = match tokens.provider.cached_token(requirement).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, format!("no cached token for '{}'", name)).into_response()
        }
        Err(e) => return error_response(&name, e),
    };

    match tokens.provider.cancel_token(&token, tokens.timeout).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&name, e),
    }
}

fn error_response(target: &str, error: ProviderError) -> Response {
    warn!(target_name = target, reason = error.reason(), error = %error, "token request failed");
    let status = match error {
        ProviderError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ProviderError::Issuance(_) => StatusCode::BAD_GATEWAY,
    };
    (status, error.to_string()).into_response()
}
