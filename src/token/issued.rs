use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::IssuanceError;
use crate::token::request::KeyType;

/// Reference that locates an issued token without its payload
/// (the attached reference returned by the issuer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenReference(String);

impl TokenReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key material bound to a token for proof of possession.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofKey {
    key_type: KeyType,
    material: Vec<u8>,
}

impl ProofKey {
    pub fn new(key_type: KeyType, material: Vec<u8>) -> Self {
        Self { key_type, material }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn material(&self) -> &[u8] {
        &self.material
    }
}

impl fmt::Debug for ProofKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofKey")
            .field("key_type", &self.key_type)
            .field("material", &format_args!("<{} bytes>", self.material.len()))
            .finish()
    }
}

/// Token obtained from the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    payload: String,
    token_type: Option<String>,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    proof_key: Option<ProofKey>,
    identifier: TokenReference,
}

impl IssuedToken {
    /// Fails when `valid_from` is after `valid_to`.
    pub fn new(
        payload: impl Into<String>,
        identifier: TokenReference,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Result<Self, IssuanceError> {
        if valid_from > valid_to {
            return Err(IssuanceError::InvalidValidityWindow {
                valid_from,
                valid_to,
            });
        }
        Ok(Self {
            payload: payload.into(),
            token_type: None,
            valid_from,
            valid_to,
            proof_key: None,
            identifier,
        })
    }

    pub fn with_proof_key(mut self, proof_key: ProofKey) -> Self {
        self.proof_key = Some(proof_key);
        self
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    /// `valid_to - valid_from`, never negative.
    pub fn lifetime(&self) -> TimeDelta {
        self.valid_to - self.valid_from
    }

    pub fn proof_key(&self) -> Option<&ProofKey> {
        self.proof_key.as_ref()
    }

    pub fn identifier(&self) -> &TokenReference {
        &self.identifier
    }
}
