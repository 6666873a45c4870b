pub mod server;
pub mod tokens;
