//! Error taxonomy of the token provider.
//!
//! - [`ConfigurationError`]: raised where a value is set or a request is built,
//!   before any network activity.
//! - [`IssuanceError`]: a round-trip to the issuer failed; the cache is untouched.
//! - [`CacheError`]: a cache backend failed; the provider logs it and degrades
//!   to "no cache" instead of failing the acquisition.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("renewal threshold percentage must be in 1..=100, got {0}")]
    InvalidRenewalThreshold(u32),

    #[error("max issued token caching time must be strictly positive")]
    NonPositiveCachingDuration,

    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("field '{field}' is not a valid URI '{value}': {reason}")]
    InvalidUri {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("issuer round-trip failed: {0}")]
    Transport(#[from] TransportError),

    #[error("issuer did not answer within {0:?}")]
    Timeout(Duration),

    #[error("issuer response carries no issued token")]
    EmptyResponse,

    #[error("malformed issuer response: {0}")]
    MalformedResponse(String),

    #[error("response context '{received}' does not match request context '{expected}'")]
    ContextMismatch { expected: String, received: String },

    #[error("token validity window is inverted: valid from {valid_from} to {valid_to}")]
    InvalidValidityWindow {
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("token cache backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Issuance(#[from] IssuanceError),
}

impl ProviderError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::Configuration(_) => "configuration",
            ProviderError::Issuance(e) => e.reason(),
        }
    }
}

impl IssuanceError {
    pub fn reason(&self) -> &'static str {
        match self {
            IssuanceError::Transport(_) => "transport",
            IssuanceError::Timeout(_) => "timeout",
            IssuanceError::EmptyResponse => "empty_response",
            IssuanceError::MalformedResponse(_) => "malformed_response",
            IssuanceError::ContextMismatch { .. } => "context_mismatch",
            IssuanceError::InvalidValidityWindow { .. } => "invalid_validity_window",
        }
    }
}
