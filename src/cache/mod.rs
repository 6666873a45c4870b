pub mod expiry;
pub mod token_cache;

pub use token_cache::{CacheKey, InMemoryTokenCache, TokenCache};
