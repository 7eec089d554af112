//! Public facade: queue lines from any thread, ship them from one.
//!
//! [`LogentriesClient`] owns an unbounded FIFO queue and a dedicated
//! dispatch thread started at construction. [`LogentriesClient::add_line`]
//! checks credentials on the calling thread and enqueues; it never waits on
//! the network. The dispatch thread formats each line, hands it to the
//! transport, and retries transient failures indefinitely.
//!
//! # Lifecycle
//!
//! Construction never fails, even with nothing configured. Missing
//! credentials surface as [`LogentriesError::MissingOrInvalidCredentials`]
//! from the first `add_line`. [`LogentriesClient::dispose`] stops the
//! dispatch thread after the lines already queued (bounded by the shutdown
//! timeout) and closes the transport; later calls to `add_line` return
//! [`LogentriesError::Closed`].

mod builder;
mod config;
mod retry;
mod worker;


use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::{Sender, bounded};
use log::warn;
use parking_lot::{Mutex, RwLock};

use crate::{
    error::LogentriesError,
    line::LogLine,
    settings::{Credentials, SettingsResolver},
    style::Style,
    transport::{
        EndpointSettings, HttpTransport, LiveSettings, TcpTransport, Transport, TransportKind,
    },
};

pub use builder::ClientBuilder;
pub use config::{
    ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, DEFAULT_SECURE_PORT,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
pub use retry::{DEFAULT_CONNECT_RETRY_DELAY, DEFAULT_IO_RETRY_DELAY, RetryPolicy};
pub(crate) use worker::on_dispatch_thread;
use worker::{Command, spawn_worker};

/// Asynchronous Logentries log shipper.
pub struct LogentriesClient {
    live: Arc<LiveSettings>,
    style: Option<Style>,
    tx: RwLock<Option<Sender<Command>>>,
    cancel: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
    flush_timeout: Duration,
}

impl LogentriesClient {
    /// Create a client that reads unset values from the environment.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_settings(config, SettingsResolver::default())
    }

    /// Create a client backed by the given settings sources.
    pub fn with_settings(config: ClientConfig, settings: SettingsResolver) -> Self {
        let live = Arc::new(live_settings(&config, settings));
        let endpoint = EndpointSettings {
            host: config.endpoint_host().to_owned(),
            connect_timeout: config.connect_timeout,
            write_timeout: config.write_timeout,
            pinned_certificate: config.pinned_certificate.clone(),
            live: Arc::clone(&live),
        };
        let transport: Box<dyn Transport> = match config.transport {
            TransportKind::Tcp => Box::new(TcpTransport::new(endpoint)),
            TransportKind::Http => Box::new(HttpTransport::new(endpoint)),
        };
        Self::start(config, live, transport)
    }

    /// Create a client delivering through a caller-supplied transport.
    pub fn with_transport<T>(config: ClientConfig, settings: SettingsResolver, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let live = Arc::new(live_settings(&config, settings));
        Self::start(config, live, transport)
    }

    /// Start configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    fn start<T>(config: ClientConfig, live: Arc<LiveSettings>, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let flush_timeout = config.connect_timeout + config.write_timeout;
        let (tx, cancel, handle) = match spawn_worker(
            transport,
            Arc::clone(&live),
            config.retry,
            config.warn_interval,
        ) {
            Ok(parts) => (Some(parts.tx), parts.cancel, Some(parts.handle)),
            Err(err) => {
                warn!("Logentries: failed to start dispatch thread: {err}");
                (None, Arc::new(AtomicBool::new(true)), None)
            }
        };
        Self {
            live,
            style: config.style,
            tx: RwLock::new(tx),
            cancel,
            handle: Mutex::new(handle),
            shutdown_timeout: config.shutdown_timeout,
            flush_timeout,
        }
    }

    /// Queue `text` with the configured default style.
    pub fn add_line(&self, text: &str) -> Result<(), LogentriesError> {
        self.add_styled_line(text, self.style.clone())
    }

    /// Queue `text` with an explicit style; `None` sends it bare.
    pub fn add_styled_line(&self, text: &str, style: Option<Style>) -> Result<(), LogentriesError> {
        let guard = self.tx.read();
        let Some(tx) = guard.as_ref() else {
            return Err(LogentriesError::Closed);
        };
        if !self.live.credentials.has_credentials() {
            return Err(LogentriesError::MissingOrInvalidCredentials);
        }
        tx.send(Command::Line(LogLine::new(text, style)))
            .map_err(|_| LogentriesError::Closed)
    }

    /// Lines queued and not yet taken by the dispatch thread.
    pub fn pending(&self) -> usize {
        self.tx.read().as_ref().map_or(0, Sender::len)
    }

    /// Wait until every line queued so far has been handled, then flush the
    /// transport.
    ///
    /// Returns `false` when the client is disposed, the transport flush
    /// fails, or the dispatch thread does not get there within the flush
    /// timeout (for instance while it is retrying an unreachable endpoint).
    pub fn flush(&self) -> bool {
        let Some(tx) = self.tx.read().clone() else {
            return false;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Command::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv_timeout(self.flush_timeout).unwrap_or(false)
    }

    /// Stop the dispatch thread and close the transport. Idempotent.
    pub fn dispose(&self) {
        let Some(tx) = self.tx.write().take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Command::Shutdown(ack_tx)).is_ok()
            && ack_rx.recv_timeout(self.shutdown_timeout).is_err()
        {
            warn!(
                "Logentries: queued lines not delivered within {:?}; abandoning them",
                self.shutdown_timeout
            );
        }
        self.cancel.store(true, Ordering::Release);
        drop(tx);
        self.join_worker();
    }

    pub fn is_disposed(&self) -> bool {
        self.tx.read().is_none()
    }

    fn join_worker(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!("Logentries: dispatch thread panicked");
        }
    }

    /// The explicit token, or the token resolved from settings.
    pub fn token(&self) -> Option<String> {
        self.live.credentials.token()
    }

    /// Set the token, overriding every settings source. `None` or a blank
    /// value restores lookup through the settings.
    pub fn set_token(&self, token: Option<String>) {
        self.live.credentials.set_token(token);
    }

    pub fn account_key(&self) -> Option<String> {
        self.live.credentials.account_key()
    }

    pub fn set_account_key(&self, key: Option<String>) {
        self.live.credentials.set_account_key(key);
    }

    pub fn location_name(&self) -> Option<String> {
        self.live.credentials.location_name()
    }

    pub fn set_location_name(&self, location: Option<String>) {
        self.live.credentials.set_location_name(location);
    }

    pub fn port(&self) -> u16 {
        self.live.credentials.port()
    }

    /// Port 0 is ignored with a warning.
    pub fn set_port(&self, port: u16) {
        self.live.credentials.set_port(port);
    }

    pub fn secure_port(&self) -> u16 {
        self.live.credentials.secure_port()
    }

    pub fn set_secure_port(&self, port: u16) {
        self.live.credentials.set_secure_port(port);
    }

    /// Applies from the next connection the transport opens.
    pub fn use_ssl(&self) -> bool {
        self.live.use_ssl()
    }

    pub fn set_use_ssl(&self, value: bool) {
        self.live.set_use_ssl(value);
    }

    pub fn immediate_flush(&self) -> bool {
        self.live.immediate_flush()
    }

    pub fn set_immediate_flush(&self, value: bool) {
        self.live.set_immediate_flush(value);
    }
}

fn live_settings(config: &ClientConfig, settings: SettingsResolver) -> LiveSettings {
    let credentials = Credentials::new(settings, config.default_port, config.default_secure_port);
    credentials.set_token(config.token.clone());
    credentials.set_account_key(config.account_key.clone());
    credentials.set_location_name(config.location_name.clone());
    if let Some(port) = config.port {
        credentials.set_port(port);
    }
    if let Some(port) = config.secure_port {
        credentials.set_secure_port(port);
    }
    LiveSettings::new(credentials, config.use_ssl, config.immediate_flush)
}

impl Drop for LogentriesClient {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for LogentriesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogentriesClient")
            .field("use_ssl", &self.use_ssl())
            .field("pending", &self.pending())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
