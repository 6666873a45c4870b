use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::expiry;
use crate::cache::{CacheKey, InMemoryTokenCache, TokenCache};
use crate::config::settings::ProviderSettings;
use crate::errors::{IssuanceError, ProviderError};
use crate::helpers::time::{get_instant, now_utc};
use crate::observability::metrics::{
    get_metrics, LOOKUP_ERROR, LOOKUP_EXPIRED, LOOKUP_HIT, LOOKUP_MISS, OUTCOME_CACHE_HIT,
    OUTCOME_FAILED, OUTCOME_ISSUED,
};
use crate::provider::response::extract_issued_token;
use crate::token::{Fingerprint, IssuedToken, TokenRequirement, TrustRequest};
use crate::transport::ProtocolTransport;

/// Acquires tokens from one issuer and keeps them cached until their
/// renewal threshold.
///
/// Safe to share between tasks. Two concurrent misses for the same request
/// may both reach the issuer; the later `put` wins.
pub struct TokenProvider<T, C = InMemoryTokenCache> {
    settings: ProviderSettings,
    transport: T,
    cache: C,
}

impl<T: ProtocolTransport> TokenProvider<T, InMemoryTokenCache> {
    pub fn new(settings: ProviderSettings, transport: T) -> Self {
        Self::with_cache(settings, transport, InMemoryTokenCache::new())
    }
}

impl<T: ProtocolTransport, C: TokenCache> TokenProvider<T, C> {
    pub fn with_cache(settings: ProviderSettings, transport: T, cache: C) -> Self {
        Self {
            settings,
            transport,
            cache,
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Return a usable token for `requirement`, from cache when possible,
    /// otherwise from the issuer within `timeout`.
    ///
    /// The cache is written only after a complete, successful round-trip.
    pub async fn acquire_token(
        &self,
        requirement: &TokenRequirement,
        timeout: Duration,
    ) -> Result<IssuedToken, ProviderError> {
        let metrics = get_metrics().await;
        let request = requirement.to_trust_request().inspect_err(|e| {
            metrics.token_acquisitions.with_label_values(&[OUTCOME_FAILED]).inc();
            error!(target_address = %requirement.target_address(), error = %e, "invalid token requirement");
        })?;
        let fingerprint = request.fingerprint();

        if self.settings.cache_issued_tokens() {
            if let Some(token) = self.lookup(&fingerprint).await {
                metrics.token_acquisitions.with_label_values(&[OUTCOME_CACHE_HIT]).inc();
                debug!(applies_to = %request.applies_to(), identifier = %token.identifier(), "serving cached token");
                return Ok(token);
            }
        }

        let token = match self.issue(&request, timeout).await {
            Ok(token) => token,
            Err(e) => {
                metrics.token_acquisitions.with_label_values(&[OUTCOME_FAILED]).inc();
                return Err(e.into());
            }
        };

        if self.settings.cache_issued_tokens() {
            if let Err(e) = self.cache.put(fingerprint, token.clone()).await {
                metrics.cache_failures.with_label_values(&["put"]).inc();
                warn!(error = %e, "caching issued token failed, returning it uncached");
            }
        }

        metrics.token_acquisitions.with_label_values(&[OUTCOME_ISSUED]).inc();
        info!(
            applies_to = %request.applies_to(),
            identifier = %token.identifier(),
            valid_to = %token.valid_to(),
            "token issued"
        );
        Ok(token)
    }

    /// Evict `token` from the cache and, when configured, tell the issuer.
    ///
    /// Returns whether a cached entry was removed. The eviction stands even
    /// if the issuer notification fails.
    pub async fn cancel_token(
        &self,
        token: &IssuedToken,
        timeout: Duration,
    ) -> Result<bool, ProviderError> {
        let metrics = get_metrics().await;
        let mut evicted = false;

        if self.settings.cache_issued_tokens() {
            match self.cache.remove(CacheKey::Identifier(token.identifier())).await {
                Ok(removed) => evicted = removed,
                Err(e) => {
                    metrics.cache_failures.with_label_values(&["remove"]).inc();
                    warn!(identifier = %token.identifier(), error = %e, "evicting canceled token failed");
                }
            }
        }
        metrics.token_cancellations.inc();
        info!(identifier = %token.identifier(), evicted, "token canceled");

        if self.settings.notify_issuer_on_cancel() {
            let notified = match tokio::time::timeout(timeout, self.transport.cancel(token)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(IssuanceError::Transport(e)),
                Err(_) => Err(IssuanceError::Timeout(timeout)),
            };
            if let Err(e) = notified {
                metrics.issuance_failures.with_label_values(&[e.reason()]).inc();
                warn!(identifier = %token.identifier(), error = %e, "issuer cancel notification failed");
                return Err(e.into());
            }
        }

        Ok(evicted)
    }

    /// Cached token for `requirement` if one is still usable. Never contacts the issuer.
    pub async fn cached_token(
        &self,
        requirement: &TokenRequirement,
    ) -> Result<Option<IssuedToken>, ProviderError> {
        if !self.settings.cache_issued_tokens() {
            return Ok(None);
        }
        let fingerprint = requirement.to_trust_request()?.fingerprint();
        Ok(self.lookup(&fingerprint).await)
    }

    // backend failures count as a miss
    async fn lookup(&self, fingerprint: &Fingerprint) -> Option<IssuedToken> {
        let metrics = get_metrics().await;
        let cached = match self.cache.get(fingerprint).await {
            Ok(cached) => cached,
            Err(e) => {
                metrics.cache_lookups.with_label_values(&[LOOKUP_ERROR]).inc();
                metrics.cache_failures.with_label_values(&["get"]).inc();
                warn!(error = %e, "token cache read failed, treating as miss");
                return None;
            }
        };

        let Some(token) = cached else {
            metrics.cache_lookups.with_label_values(&[LOOKUP_MISS]).inc();
            return None;
        };

        let usable = expiry::is_usable(
            Some(&token),
            self.settings.issued_token_renewal_threshold_percentage(),
            self.settings.max_issued_token_caching_time(),
        );
        if usable {
            metrics.cache_lookups.with_label_values(&[LOOKUP_HIT]).inc();
            return Some(token);
        }

        metrics.cache_lookups.with_label_values(&[LOOKUP_EXPIRED]).inc();
        debug!(identifier = %token.identifier(), "cached token past renewal threshold, evicting");
        // by identifier, so a fresher token stored concurrently survives
        if let Err(e) = self.cache.remove(CacheKey::Identifier(token.identifier())).await {
            metrics.cache_failures.with_label_values(&["remove"]).inc();
            warn!(error = %e, "evicting expired token failed");
        }
        None
    }

    async fn issue(
        &self,
        request: &TrustRequest,
        timeout: Duration,
    ) -> Result<IssuedToken, IssuanceError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        debug!(applies_to = %request.applies_to(), context = request.context(), "requesting token from issuer");

        let result = match tokio::time::timeout(timeout, self.transport.issue(request)).await {
            Ok(Ok(response)) => extract_issued_token(request, response, now_utc()),
            Ok(Err(e)) => Err(IssuanceError::Transport(e)),
            Err(_) => Err(IssuanceError::Timeout(timeout)),
        };

        metrics
            .issuance_duration
            .with_label_values(&[request.applies_to().as_str()])
            .observe(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics.issuance_failures.with_label_values(&[e.reason()]).inc();
            error!(applies_to = %request.applies_to(), error = %e, "token issuance failed");
        }
        result
    }
}
