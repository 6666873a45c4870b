pub mod response;
pub mod token_provider;

pub use response::{extract_issued_token, DEFAULT_ISSUED_TOKEN_LIFETIME_SECS};
pub use token_provider::TokenProvider;
