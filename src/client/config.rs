//! Configuration consumed by [`LogentriesClient`](super::LogentriesClient).
//!
//! `ClientBuilder` validates and produces these values; the infallible
//! constructors on the client accept them directly.

use std::time::Duration;

use crate::{
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
    style::Style,
    transport::{DEFAULT_DATA_HOST, DEFAULT_INGESTION_HOST, PinnedCertificate, TransportKind},
};

use super::retry::RetryPolicy;

/// Plaintext token port on the data endpoint.
pub const DEFAULT_PORT: u16 = 10000;
/// TLS token port on the data endpoint.
pub const DEFAULT_SECURE_PORT: u16 = 20000;
/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes and HTTP requests.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
/// How long `dispose` waits for queued lines before abandoning them.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub transport: TransportKind,
    /// Host for the stream transport.
    pub data_host: String,
    /// Host (optionally `host:port`) for the HTTP transport.
    pub ingestion_host: String,
    /// Fallback ports when neither an explicit value nor a setting exists.
    pub default_port: u16,
    pub default_secure_port: u16,
    pub use_ssl: bool,
    pub immediate_flush: bool,
    /// Explicit values; these override every settings source.
    pub token: Option<String>,
    pub account_key: Option<String>,
    pub location_name: Option<String>,
    pub port: Option<u16>,
    pub secure_port: Option<u16>,
    /// Style applied by [`add_line`](super::LogentriesClient::add_line).
    /// `None` sends bare lines with no escape-sequence prefix.
    pub style: Option<Style>,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub retry: RetryPolicy,
    pub warn_interval: Duration,
    pub shutdown_timeout: Duration,
    pub pinned_certificate: PinnedCertificate,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            data_host: DEFAULT_DATA_HOST.into(),
            ingestion_host: DEFAULT_INGESTION_HOST.into(),
            default_port: DEFAULT_PORT,
            default_secure_port: DEFAULT_SECURE_PORT,
            use_ssl: false,
            immediate_flush: false,
            token: None,
            account_key: None,
            location_name: None,
            port: None,
            secure_port: None,
            style: Some(Style::default()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            retry: RetryPolicy::default(),
            warn_interval: DEFAULT_WARN_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            pinned_certificate: PinnedCertificate::default(),
        }
    }
}

impl ClientConfig {
    /// Send lines without a style prefix.
    pub fn bare(mut self) -> Self {
        self.style = None;
        self
    }

    /// Host the configured transport connects to.
    pub fn endpoint_host(&self) -> &str {
        match self.transport {
            TransportKind::Tcp => &self.data_host,
            TransportKind::Http => &self.ingestion_host,
        }
    }
}
