//! The issuer round-trip, seen from the provider as a black box:
//! a request goes in, a parsed response collection comes out.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::{IssuedToken, TrustRequest};

pub mod http;

pub use self::http::HttpTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to issuer failed: {0}")]
    Request(String),

    #[error("issuer answered with status {0}")]
    Status(u16),

    #[error("cannot decode issuer response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Sends trust requests to an issuer.
pub trait ProtocolTransport: Send + Sync {
    fn issue(
        &self,
        request: &TrustRequest,
    ) -> impl Future<Output = Result<TrustResponse, TransportError>> + Send;

    /// Tells the issuer a token is no longer needed. No-op unless the
    /// transport speaks the cancel binding.
    fn cancel(&self, _token: &IssuedToken) -> impl Future<Output = Result<(), TransportError>> + Send {
        async { Ok(()) }
    }
}

/// Parsed RSTR collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustResponse {
    /// Echo of the request context, when the issuer sends one back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, rename = "requestSecurityTokenResponses")]
    pub entries: Vec<IssuedTokenEntry>,
}

/// One RSTR inside the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokenEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_security_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_proof_token: Option<ProofTokenEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_attached_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_unattached_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<Lifetime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofTokenEntry {
    /// Base64 key material.
    pub binary_secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}
