//! Local endpoints for integration tests.

#![allow(dead_code)]

pub mod servers;

pub use servers::{HttpRequest, spawn_http_server, spawn_line_server, spawn_tls_line_server};

pub const TOKEN: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1f";
pub const SERVER_CERT: &[u8] = include_bytes!("../fixtures/server.cert.pem");
pub const SERVER_KEY: &[u8] = include_bytes!("../fixtures/server.key.pem");
pub const OTHER_CERT: &[u8] = include_bytes!("../fixtures/other.cert.pem");
