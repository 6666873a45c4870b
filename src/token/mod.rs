//! Value types exchanged with the issuer: the request, the caller's
//! requirement it is derived from, and the token that comes back.

pub mod issued;
pub mod request;
pub mod requirement;

pub use issued::{IssuedToken, ProofKey, TokenReference};
pub use request::{Fingerprint, KeyType, RequestType, TrustRequest};
pub use requirement::{ProofKeyType, TokenRequirement};
