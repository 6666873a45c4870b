use serde::Deserialize;
use std::collections::HashMap;

use crate::config::settings::SettingsConfig;
use crate::errors::ConfigurationError;
use crate::token::{ProofKeyType, TokenRequirement};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub targets: HashMap<String, TargetConfig>,
}

/// ================================
/// Targets - services tokens are acquired for
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub applies_to: String,
    pub key_type: ProofKeyType, // symmetric, asymmetric, bearer
    pub token_type: String,
    pub allow_postdating: Option<bool>,
}

impl TargetConfig {
    pub fn to_requirement(&self, issuer_url: &str) -> Result<TokenRequirement, ConfigurationError> {
        let requirement = TokenRequirement::new(&self.applies_to, self.key_type, &self.token_type)?
            .with_issuer_address(issuer_url)?;
        Ok(match self.allow_postdating {
            Some(allow) => requirement.with_allow_postdating(allow),
            None => requirement,
        })
    }
}

impl ServiceConfig {
    /// Requirements for every configured target, keyed by target name.
    pub fn requirements(&self) -> Result<HashMap<String, TokenRequirement>, ConfigurationError> {
        self.targets
            .iter()
            .map(|(name, target)| {
                target
                    .to_requirement(&self.settings.issuer.url)
                    .map(|requirement| (name.to_owned(), requirement))
            })
            .collect()
    }
}
