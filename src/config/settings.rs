use std::time::Duration;

use serde::Deserialize;

use crate::errors::ConfigurationError;

pub const DEFAULT_RENEWAL_THRESHOLD_PERCENTAGE: u8 = 60;
pub const DEFAULT_ISSUER_TIMEOUT_MS: u64 = 5000;

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    pub issuer: IssuerConfig,
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
}

/// Provider knobs as written in YAML; turned into [`ProviderSettings`] after validation.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub cache_issued_tokens: Option<bool>,
    /// absent means unbounded
    pub max_issued_token_caching_seconds: Option<u64>,
    pub issued_token_renewal_threshold_percentage: Option<u32>,
    pub notify_issuer_on_cancel: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssuerConfig {
    pub url: String,
    /// per acquisition round-trip
    pub timeout_ms: Option<u64>,
}

impl IssuerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_ISSUER_TIMEOUT_MS))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// max delay for retrying
    /// invariant: >= base_delay_ms.
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "compact" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// ================================
/// Provider settings
/// ================================

/// Caching behaviour of a token provider. Every setter validates its input,
/// so an instance is always usable as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    cache_issued_tokens: bool,
    max_issued_token_caching_time: Duration,
    issued_token_renewal_threshold_percentage: u8,
    notify_issuer_on_cancel: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            cache_issued_tokens: true,
            max_issued_token_caching_time: Duration::MAX,
            issued_token_renewal_threshold_percentage: DEFAULT_RENEWAL_THRESHOLD_PERCENTAGE,
            notify_issuer_on_cancel: false,
        }
    }
}

impl ProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_issued_tokens(&self) -> bool {
        self.cache_issued_tokens
    }

    pub fn max_issued_token_caching_time(&self) -> Duration {
        self.max_issued_token_caching_time
    }

    pub fn issued_token_renewal_threshold_percentage(&self) -> u8 {
        self.issued_token_renewal_threshold_percentage
    }

    pub fn notify_issuer_on_cancel(&self) -> bool {
        self.notify_issuer_on_cancel
    }

    pub fn set_cache_issued_tokens(&mut self, enabled: bool) {
        self.cache_issued_tokens = enabled;
    }

    pub fn set_max_issued_token_caching_time(
        &mut self,
        value: Duration,
    ) -> Result<(), ConfigurationError> {
        if value.is_zero() {
            return Err(ConfigurationError::NonPositiveCachingDuration);
        }
        self.max_issued_token_caching_time = value;
        Ok(())
    }

    pub fn set_issued_token_renewal_threshold_percentage(
        &mut self,
        value: u32,
    ) -> Result<(), ConfigurationError> {
        match u8::try_from(value) {
            Ok(percent) if (1..=100).contains(&percent) => {
                self.issued_token_renewal_threshold_percentage = percent;
                Ok(())
            }
            _ => Err(ConfigurationError::InvalidRenewalThreshold(value)),
        }
    }

    pub fn set_notify_issuer_on_cancel(&mut self, enabled: bool) {
        self.notify_issuer_on_cancel = enabled;
    }

    pub fn with_cache_issued_tokens(mut self, enabled: bool) -> Self {
        self.set_cache_issued_tokens(enabled);
        self
    }

    pub fn with_max_issued_token_caching_time(
        mut self,
        value: Duration,
    ) -> Result<Self, ConfigurationError> {
        self.set_max_issued_token_caching_time(value)?;
        Ok(self)
    }

    pub fn with_issued_token_renewal_threshold_percentage(
        mut self,
        value: u32,
    ) -> Result<Self, ConfigurationError> {
        self.set_issued_token_renewal_threshold_percentage(value)?;
        Ok(self)
    }

    pub fn with_notify_issuer_on_cancel(mut self, enabled: bool) -> Self {
        self.set_notify_issuer_on_cancel(enabled);
        self
    }
}

impl TryFrom<&ProviderConfig> for ProviderSettings {
    type Error = ConfigurationError;

    fn try_from(config: &ProviderConfig) -> Result<Self, Self::Error> {
        let mut settings = ProviderSettings::new();
        if let Some(enabled) = config.cache_issued_tokens {
            settings.set_cache_issued_tokens(enabled);
        }
        if let Some(seconds) = config.max_issued_token_caching_seconds {
            settings.set_max_issued_token_caching_time(Duration::from_secs(seconds))?;
        }
        if let Some(percent) = config.issued_token_renewal_threshold_percentage {
            settings.set_issued_token_renewal_threshold_percentage(percent)?;
        }
        if let Some(enabled) = config.notify_issuer_on_cancel {
            settings.set_notify_issuer_on_cancel(enabled);
        }
        Ok(settings)
    }
}
