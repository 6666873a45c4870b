//! Configuration validation with aggregated errors.
//! Every issue found is collected into one `Vec<String>` so a broken file
//! is reported in a single pass:
//!   * issuer endpoint and timeout
//!   * provider caching invariants (threshold range, positive caching time)
//!   * target addresses, token types
//!   * retry / logging / metrics / server invariants

use tracing::{error, info};
use url::Url;

use crate::config::settings::{ProviderConfig, RetryConfig, SettingsConfig};
use crate::config::targets::{ServiceConfig, TargetConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.targets.is_empty() {
        errors.push("config: 'targets' is empty; at least one target required".to_string());
    }

    let mut names: Vec<&String> = cfg.targets.keys().collect();
    names.sort();
    for name in names {
        validate_target(name, &cfg.targets[name], &mut errors);
    }

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    validate_absolute_url("settings.issuer.url", &settings.issuer.url, errors);
    if settings.issuer.timeout_ms == Some(0) {
        errors.push("settings.issuer.timeout_ms must be > 0".to_string());
    }

    validate_provider("settings.provider", &settings.provider, errors);

    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    if settings.server.host.trim().is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if metrics.is_enabled && metrics.path.starts_with("/targets") {
        errors.push(format!(
            "settings.metrics.path '{}' collides with target routes",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_provider(path: &str, provider: &ProviderConfig, errors: &mut Vec<String>) {
    if let Some(percent) = provider.issued_token_renewal_threshold_percentage {
        if !(1..=100).contains(&percent) {
            errors.push(format!(
                "{}.issued_token_renewal_threshold_percentage ({}) must be in 1..=100",
                path, percent
            ));
        }
    }
    if provider.max_issued_token_caching_seconds == Some(0) {
        errors.push(format!(
            "{}.max_issued_token_caching_seconds must be > 0",
            path
        ));
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be > 0", path));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                path, max, base
            ));
        }
    }
}

/// TARGET BASICS
fn validate_target(name: &str, target: &TargetConfig, errors: &mut Vec<String>) {
    if name.trim().is_empty() || name.contains('/') {
        errors.push(format!(
            "targets['{}']: name must be non-empty and must not contain '/'",
            name
        ));
    }
    if target.applies_to.trim().is_empty() {
        errors.push(format!("targets.{}: applies_to cannot be empty", name));
    } else if let Err(e) = Url::parse(target.applies_to.trim()) {
        errors.push(format!(
            "targets.{}: applies_to '{}' is not a valid URI: {}",
            name, target.applies_to, e
        ));
    }
    if target.token_type.trim().is_empty() {
        errors.push(format!("targets.{}: token_type cannot be empty", name));
    }
}

fn validate_absolute_url(path: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(format!(
            "{} '{}' must use http or https, got '{}'",
            path,
            value,
            url.scheme()
        )),
        Err(e) => errors.push(format!("{} '{}' is not a valid URL: {}", path, value, e)),
    }
}
