pub mod common;

mod http_transport;
mod server_routes;
