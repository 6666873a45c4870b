use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::IssuanceError;
use crate::helpers::time::saturating_add;
use crate::token::{IssuedToken, ProofKey, TokenReference, TrustRequest};
use crate::transport::{Lifetime, TrustResponse};

/// Lifetime assumed when the issuer states no expiry for a token.
///
/// This is a local policy default, not a protocol rule: WS-Trust leaves the
/// lifetime element optional and says nothing about what a client should
/// assume without it.
pub const DEFAULT_ISSUED_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Turn the issuer's response collection into a token.
///
/// Only the first entry is read; multi-token responses are not supported.
pub fn extract_issued_token(
    request: &TrustRequest,
    response: TrustResponse,
    now: DateTime<Utc>,
) -> Result<IssuedToken, IssuanceError> {
    if let Some(received) = response.context {
        if received != request.context() {
            return Err(IssuanceError::ContextMismatch {
                expected: request.context().to_owned(),
                received,
            });
        }
    }

    let total = response.entries.len();
    let entry = response
        .entries
        .into_iter()
        .next()
        .ok_or(IssuanceError::EmptyResponse)?;
    if total > 1 {
        warn!(total, "issuer returned several tokens, using the first one");
    }

    let payload = entry
        .requested_security_token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| IssuanceError::MalformedResponse("missing requested security token".to_owned()))?;

    let identifier = entry
        .requested_attached_reference
        .filter(|reference| !reference.trim().is_empty())
        .map(TokenReference::new)
        .unwrap_or_else(|| {
            debug!("no attached reference in response, assigning a local one");
            TokenReference::new(format!("urn:uuid:{}", Uuid::new_v4()))
        });

    let (valid_from, valid_to) = validity_window(entry.lifetime.as_ref(), now);
    let token_type = entry
        .token_type
        .unwrap_or_else(|| request.token_type().to_owned());
    let mut token = IssuedToken::new(payload, identifier, valid_from, valid_to)?.with_token_type(token_type);

    match entry.requested_proof_token {
        Some(proof) => {
            let material = base64::engine::general_purpose::STANDARD
                .decode(proof.binary_secret.trim())
                .map_err(|e| IssuanceError::MalformedResponse(format!("proof token is not base64: {}", e)))?;
            token = token.with_proof_key(ProofKey::new(request.key_type(), material));
        }
        None if request.key_type().requires_proof() => {
            warn!(key_type = %request.key_type(), "proof-of-possession requested but issuer returned no proof token");
        }
        None => {}
    }

    Ok(token)
}

/// `created` defaults to `now`; `expires` defaults to `created` plus one day.
fn validity_window(lifetime: Option<&Lifetime>, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let created = lifetime.and_then(|l| l.created).unwrap_or(now);
    let expires = lifetime.and_then(|l| l.expires).unwrap_or_else(|| {
        saturating_add(created, TimeDelta::seconds(DEFAULT_ISSUED_TOKEN_LIFETIME_SECS))
    });
    (created, expires)
}
