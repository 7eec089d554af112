//! Asynchronous log shipping to Logentries.
//!
//! A [`LogentriesClient`] accepts lines from any thread and delivers them in
//! order from a single background thread, over a persistent TCP or TLS
//! stream ([`TcpTransport`]) or as HTTP POSTs ([`HttpTransport`]). Delivery
//! failures are retried until the line is accepted or the client is
//! disposed; callers only ever see configuration errors.
//!
//! ```no_run
//! use logentries_rs::LogentriesClient;
//!
//! let client = LogentriesClient::builder()
//!     .with_token("2bfbea1e-10c3-4419-bdad-7e6435882e1f")
//!     .with_ssl(true)
//!     .build()?;
//! client.add_line("service started")?;
//! client.dispose();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod error;
pub mod line;
pub mod rate_limited_warner;
pub mod settings;
pub mod style;
pub mod transport;

#[cfg(feature = "log-compat")]
pub mod log_compat;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

pub use client::{ClientBuilder, ClientConfig, LogentriesClient, RetryPolicy};
pub use error::{BuildError, LogentriesError, TransportError};
pub use line::{Frame, LINE_SEPARATOR, LogLine, WireFormat};
#[cfg(feature = "log-compat")]
pub use log_compat::LogentriesAppender;
pub use settings::{
    Credentials, EnvSettings, IniSettings, MapSettings, SettingsResolver, SettingsSource,
};
pub use style::{Attribute, BackgroundColor, ForegroundColor, Style};
pub use transport::{
    HttpTransport, PinnedCertificate, TcpTransport, Transport, TransportKind,
};
