use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ConfigurationError;
use crate::token::request::{parse_uri, KeyType, TrustRequest};

/// Proof type the caller's binding asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKeyType {
    Symmetric,
    Asymmetric,
    Bearer,
}

impl From<ProofKeyType> for KeyType {
    fn from(value: ProofKeyType) -> Self {
        match value {
            ProofKeyType::Symmetric => KeyType::Symmetric,
            ProofKeyType::Asymmetric => KeyType::PublicKey,
            ProofKeyType::Bearer => KeyType::Bearer,
        }
    }
}

/// What the caller needs a token for: target, proof type and token format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequirement {
    target_address: Url,
    key_type: ProofKeyType,
    token_type: String,
    issuer_address: Option<Url>,
    allow_postdating: Option<bool>,
}

impl TokenRequirement {
    pub fn new(
        target_address: &str,
        key_type: ProofKeyType,
        token_type: &str,
    ) -> Result<Self, ConfigurationError> {
        let requirement = Self {
            target_address: parse_uri("target_address", target_address)?,
            key_type,
            token_type: token_type.trim().to_owned(),
            issuer_address: None,
            allow_postdating: None,
        };
        requirement.validate()?;
        Ok(requirement)
    }

    pub fn with_issuer_address(mut self, issuer_address: &str) -> Result<Self, ConfigurationError> {
        self.issuer_address = Some(parse_uri("issuer_address", issuer_address)?);
        Ok(self)
    }

    pub fn with_allow_postdating(mut self, allow_postdating: bool) -> Self {
        self.allow_postdating = Some(allow_postdating);
        self
    }

    pub fn target_address(&self) -> &Url {
        &self.target_address
    }

    pub fn key_type(&self) -> ProofKeyType {
        self.key_type
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn issuer_address(&self) -> Option<&Url> {
        self.issuer_address.as_ref()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.token_type.is_empty() {
            return Err(ConfigurationError::MissingField("token_type"));
        }
        Ok(())
    }

    /// Derive a fresh `Issue` request; every call gets a new context.
    pub fn to_trust_request(&self) -> Result<TrustRequest, ConfigurationError> {
        self.validate()?;
        let request = TrustRequest::issue(
            self.target_address.clone(),
            self.key_type.into(),
            &self.token_type,
        )?;
        Ok(match self.allow_postdating {
            Some(allow) => request.with_allow_postdating(allow),
            None => request,
        })
    }
}
