//! Transports that move composed frames to the Logentries endpoint.
//!
//! Two implementations are provided: [`TcpTransport`] keeps one persistent
//! plaintext or TLS stream open and pushes newline-terminated frames onto
//! it, while [`HttpTransport`] issues one POST per frame. The dispatch
//! worker owns its transport exclusively, so implementations need `Send`
//! but never `Sync`.

mod http;
mod pin;
mod stream;


use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::{
    error::TransportError,
    line::{Frame, WireFormat},
    settings::Credentials,
};

pub use http::{DEFAULT_INGESTION_HOST, HttpTransport, ResponseClass, classify_status};
pub use pin::PinnedCertificate;
pub use stream::{ActiveConnection, DEFAULT_DATA_HOST, TcpTransport};

/// Capability interface over a connection to the log endpoint.
pub trait Transport: Send {
    /// Layout expected by [`Transport::write`].
    fn wire_format(&self) -> WireFormat;

    /// Make sure a usable connection exists, opening a new one if needed.
    fn ensure_open(&mut self) -> Result<(), TransportError>;

    /// Deliver one frame.
    fn write(&mut self, frame: &Frame) -> Result<(), TransportError>;

    /// Push buffered bytes to the endpoint.
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Release the connection. Must be idempotent.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn wire_format(&self) -> WireFormat {
        (**self).wire_format()
    }

    fn ensure_open(&mut self) -> Result<(), TransportError> {
        (**self).ensure_open()
    }

    fn write(&mut self, frame: &Frame) -> Result<(), TransportError> {
        (**self).write(frame)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Which transport a client constructs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// Persistent TCP stream, optionally wrapped in TLS.
    #[default]
    Tcp,
    /// One HTTP POST per line.
    Http,
}

/// Endpoint settings shared by both transport variants.
///
/// Ports and the TLS flag are read through [`EndpointSettings::live`] each
/// time a connection is opened, so changes made on the client after
/// construction apply to the next connection.
#[derive(Clone, Debug)]
pub struct EndpointSettings {
    pub host: String,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub pinned_certificate: PinnedCertificate,
    pub live: Arc<LiveSettings>,
}

/// Settings the facade may change while the worker is running.
#[derive(Debug)]
pub struct LiveSettings {
    pub credentials: Credentials,
    use_ssl: AtomicBool,
    immediate_flush: AtomicBool,
}

impl LiveSettings {
    pub fn new(credentials: Credentials, use_ssl: bool, immediate_flush: bool) -> Self {
        Self {
            credentials,
            use_ssl: use_ssl.into(),
            immediate_flush: immediate_flush.into(),
        }
    }

    pub fn use_ssl(&self) -> bool {
        self.use_ssl.load(Ordering::Acquire)
    }

    pub fn set_use_ssl(&self, value: bool) {
        self.use_ssl.store(value, Ordering::Release);
    }

    pub fn immediate_flush(&self) -> bool {
        self.immediate_flush.load(Ordering::Acquire)
    }

    pub fn set_immediate_flush(&self, value: bool) {
        self.immediate_flush.store(value, Ordering::Release);
    }

    /// Port for the current TLS setting.
    pub fn active_port(&self) -> u16 {
        if self.use_ssl() {
            self.credentials.secure_port()
        } else {
            self.credentials.port()
        }
    }
}
