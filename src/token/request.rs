use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::errors::ConfigurationError;

/// WS-Trust 1.3 namespace, prefix of every request/key type URI.
pub const WS_TRUST_NAMESPACE: &str = "http://docs.oasis-open.org/ws-sx/ws-trust/200512";

/// Operation requested from the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestType {
    Issue,
    Renew,
    Cancel,
    Validate,
}

impl RequestType {
    pub fn uri(&self) -> &'static str {
        match self {
            RequestType::Issue => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/Issue",
            RequestType::Renew => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/Renew",
            RequestType::Cancel => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/Cancel",
            RequestType::Validate => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/Validate",
        }
    }
}

impl FromStr for RequestType {
    type Err = ConfigurationError;

    /// Accepts the full URI or the bare operation name (`issue`, `Renew`, ...).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigurationError::MissingField("request_type"));
        }
        let name = value
            .strip_prefix(WS_TRUST_NAMESPACE)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(value);
        match name.to_ascii_lowercase().as_str() {
            "issue" => Ok(RequestType::Issue),
            "renew" => Ok(RequestType::Renew),
            "cancel" => Ok(RequestType::Cancel),
            "validate" => Ok(RequestType::Validate),
            _ => Err(ConfigurationError::UnknownValue {
                kind: "request type",
                value: value.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for RequestType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.uri().to_owned()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// Kind of proof-of-possession key the issuer should bind to the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyType {
    PublicKey,
    Symmetric,
    Bearer,
}

impl KeyType {
    pub fn uri(&self) -> &'static str {
        match self {
            KeyType::PublicKey => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/PublicKey",
            KeyType::Symmetric => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/SymmetricKey",
            KeyType::Bearer => "http://docs.oasis-open.org/ws-sx/ws-trust/200512/Bearer",
        }
    }

    /// Bearer tokens carry no proof key.
    pub fn requires_proof(&self) -> bool {
        !matches!(self, KeyType::Bearer)
    }
}

impl FromStr for KeyType {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigurationError::MissingField("key_type"));
        }
        let name = value
            .strip_prefix(WS_TRUST_NAMESPACE)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(value);
        match name.to_ascii_lowercase().as_str() {
            "publickey" | "public_key" => Ok(KeyType::PublicKey),
            "symmetrickey" | "symmetric" => Ok(KeyType::Symmetric),
            "bearer" => Ok(KeyType::Bearer),
            _ => Err(ConfigurationError::UnknownValue {
                kind: "key type",
                value: value.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for KeyType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyType> for String {
    fn from(value: KeyType) -> Self {
        value.uri().to_owned()
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// Cache key of a request: its semantic identity without the correlation context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace('\n', " | "))
    }
}

/// A request for a security token (RST).
///
/// Built fresh for every acquisition attempt and never mutated afterwards.
/// Equality and hashing ignore `context`: two requests that differ only in
/// their correlation identifier are the same logical request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustRequest {
    request_type: RequestType,
    applies_to: Url,
    context: String,
    key_type: KeyType,
    token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allow_postdating: Option<bool>,
}

impl TrustRequest {
    /// Build a request from its textual parts.
    ///
    /// Fails on an empty or unknown request type, an empty or unparseable
    /// `applies_to`, or an empty token type.
    pub fn new(
        request_type: &str,
        applies_to: &str,
        key_type: KeyType,
        token_type: &str,
    ) -> Result<Self, ConfigurationError> {
        let request_type = request_type.parse::<RequestType>()?;
        let applies_to = parse_uri("applies_to", applies_to)?;
        Self::with_type(request_type, applies_to, key_type, token_type)
    }

    /// Shorthand for an `Issue` request.
    pub fn issue(
        applies_to: Url,
        key_type: KeyType,
        token_type: &str,
    ) -> Result<Self, ConfigurationError> {
        Self::with_type(RequestType::Issue, applies_to, key_type, token_type)
    }

    fn with_type(
        request_type: RequestType,
        applies_to: Url,
        key_type: KeyType,
        token_type: &str,
    ) -> Result<Self, ConfigurationError> {
        let token_type = token_type.trim();
        if token_type.is_empty() {
            return Err(ConfigurationError::MissingField("token_type"));
        }
        Ok(Self {
            request_type,
            applies_to,
            context: new_context(),
            key_type,
            token_type: token_type.to_owned(),
            allow_postdating: None,
        })
    }

    pub fn with_allow_postdating(mut self, allow_postdating: bool) -> Self {
        self.allow_postdating = Some(allow_postdating);
        self
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn applies_to(&self) -> &Url {
        &self.applies_to
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn allow_postdating(&self) -> Option<bool> {
        self.allow_postdating
    }

    /// Cache key over request type, applies-to, key type and token type.
    pub fn fingerprint(&self) -> Fingerprint {
        // newline never appears in a parsed URL nor in the fixed type URIs
        Fingerprint(format!(
            "{}\n{}\n{}\n{}",
            self.request_type.uri(),
            self.applies_to.as_str(),
            self.key_type.uri(),
            self.token_type
        ))
    }
}

impl PartialEq for TrustRequest {
    fn eq(&self, other: &Self) -> bool {
        self.request_type == other.request_type
            && self.applies_to == other.applies_to
            && self.key_type == other.key_type
            && self.token_type == other.token_type
            && self.allow_postdating == other.allow_postdating
    }
}

impl Eq for TrustRequest {}

impl Hash for TrustRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.request_type.hash(state);
        self.applies_to.hash(state);
        self.key_type.hash(state);
        self.token_type.hash(state);
        self.allow_postdating.hash(state);
    }
}

fn new_context() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// Parse a required URI field, mapping failures to [`ConfigurationError`].
pub fn parse_uri(field: &'static str, value: &str) -> Result<Url, ConfigurationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigurationError::MissingField(field));
    }
    Url::parse(value).map_err(|e| ConfigurationError::InvalidUri {
        field,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}
