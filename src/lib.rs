//! # Security Token Provider Library
//!
//! Acquires security tokens from a WS-Trust style issuer (STS) on behalf of
//! a caller, caches them until a renewal threshold of their lifetime, and
//! evicts them on cancellation.
//!
//! Modules:
//! - `token`: trust request, issued token and caller requirement types
//! - `cache`: pluggable token cache and the expiry policy
//! - `transport`: issuer round-trip trait and its HTTP implementation
//! - `provider`: the orchestrating token provider
//! - `config`: YAML service configuration and provider settings
//! - `server`: HTTP front-end over configured targets

pub mod cache;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod provider;
pub mod resilience;
pub mod server;
pub mod token;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::settings::ProviderSettings;
pub use crate::errors::{CacheError, ConfigurationError, IssuanceError, ProviderError};
pub use crate::provider::TokenProvider;
