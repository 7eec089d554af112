//! Error types shared across the client, its transports, and its builder.

use std::io;

use thiserror::Error;

/// Errors surfaced synchronously to callers of
/// [`LogentriesClient`](crate::LogentriesClient).
#[derive(Debug, Error)]
pub enum LogentriesError {
    /// Neither a valid token nor an account key and location could be
    /// resolved from the explicit values or any configured settings source.
    #[error(
        "no Logentries credentials configured: set \"Logentries.Token\" to a GUID, \
         or provide both \"Logentries.AccountKey\" and \"Logentries.LocationName\""
    )]
    MissingOrInvalidCredentials,
    /// The client has been disposed and no longer accepts lines.
    #[error("the Logentries client has been disposed")]
    Closed,
}

/// Failures reported by a [`Transport`](crate::transport::Transport).
///
/// The dispatch worker never surfaces these to callers. Every variant except
/// [`TransportError::Rejected`] leads to the transport being closed and the
/// same frame being retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Establishing the TCP connection failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Writing or flushing an established stream failed.
    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The TLS handshake failed or the peer presented an unpinned certificate.
    #[error("TLS authentication failed: {0}")]
    Tls(String),
    /// The connection handle was already gone when a write was attempted.
    #[error("connection is not writable")]
    NotWritable,
    /// An HTTP request failed in transit or received a retryable status.
    #[error("HTTP request failed: {0}")]
    Http(String),
    /// The endpoint permanently rejected the request with this status.
    ///
    /// This is the one case where a line is dropped instead of retried: an
    /// HTTP status other than 2xx, 429 or 5xx means the same request can
    /// never succeed, and retrying it would stall every line queued behind
    /// it. The drop is reported through a rate-limited `warn!`.
    #[error("endpoint rejected the line with status {0}")]
    Rejected(u16),
}

impl TransportError {
    /// Whether the failure occurred before any connection was established.
    ///
    /// Connection-level failures are retried after the longer connect delay
    /// of the [`RetryPolicy`](crate::RetryPolicy).
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            TransportError::Connect { .. } | TransportError::Tls(_) | TransportError::Http(_)
        )
    }

    /// Whether retrying the same frame can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Rejected(_))
    }
}

/// Errors that may occur while building a client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    /// A settings source could not be loaded.
    #[error("invalid settings source: {0}")]
    Settings(String),
    /// Underlying I/O error whilst loading configuration.
    #[error(transparent)]
    Io(#[from] io::Error),
}
