//! Persistent TCP stream transport with optional pinned TLS.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::debug;
use native_tls::{TlsConnector, TlsStream};

use super::{EndpointSettings, Transport};
use crate::{
    error::TransportError,
    line::{Frame, WireFormat},
};

/// Logentries token-based data endpoint.
pub const DEFAULT_DATA_HOST: &str = "data.logentries.com";

/// Active stream connection state.
pub enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ActiveConnection {
    fn tcp(&self) -> &TcpStream {
        match self {
            ActiveConnection::PlainTcp(stream) => stream,
            ActiveConnection::Tls(stream) => stream.get_ref(),
        }
    }

    /// Whether the socket has no pending error.
    pub fn is_connected(&self) -> bool {
        matches!(self.tcp().take_error(), Ok(None))
    }

    /// Update the write timeout for the underlying socket.
    pub fn set_write_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.tcp().set_write_timeout(Some(timeout))
    }

    /// Write a full buffer to the socket.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
        }
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
        }
    }

    fn shutdown(mut self) {
        if let ActiveConnection::Tls(stream) = &mut self {
            let _ = stream.shutdown();
        }
        let _ = self.tcp().shutdown(Shutdown::Both);
    }
}

/// Transport pushing newline-terminated frames over one long-lived stream.
///
/// States: disconnected (no connection held), open, and broken (a held
/// connection whose socket reports an error). [`Transport::ensure_open`]
/// replaces a broken connection; failures to connect or to authenticate the
/// TLS peer are returned to the caller untouched.
pub struct TcpTransport {
    endpoint: EndpointSettings,
    connection: Option<ActiveConnection>,
}

impl TcpTransport {
    pub fn new(endpoint: EndpointSettings) -> Self {
        Self {
            endpoint,
            connection: None,
        }
    }

    /// Whether a connection is currently held.
    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn connect(&self) -> Result<ActiveConnection, TransportError> {
        let live = &self.endpoint.live;
        let use_ssl = live.use_ssl();
        let port = live.active_port();
        let host = self.endpoint.host.as_str();
        let timeout = self.endpoint.connect_timeout;

        let stream = connect_tcp(host, port, timeout).map_err(|source| TransportError::Connect {
            endpoint: format!("{host}:{port}"),
            source,
        })?;
        let _ = stream.set_nodelay(true);

        let connection = if use_ssl {
            ActiveConnection::Tls(Box::new(self.handshake(stream)?))
        } else {
            ActiveConnection::PlainTcp(stream)
        };
        connection.set_write_timeout(self.endpoint.write_timeout)?;
        debug!(
            "Logentries: connected to {host}:{port}{}",
            if use_ssl { " (tls)" } else { "" }
        );
        Ok(connection)
    }

    fn handshake(&self, stream: TcpStream) -> Result<TlsStream<TcpStream>, TransportError> {
        let pin = &self.endpoint.pinned_certificate;
        // Chain and hostname checks are replaced by the exact pin comparison.
        let connector = TlsConnector::builder()
            .disable_built_in_roots(true)
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|err| TransportError::Tls(err.to_string()))?;

        let timeout = self.endpoint.connect_timeout;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let tls = connector
            .connect(&self.endpoint.host, stream)
            .map_err(|err| TransportError::Tls(err.to_string()))?;

        let peer = tls
            .peer_certificate()
            .map_err(|err| TransportError::Tls(err.to_string()))?;
        if let Err(err) = pin.verify(peer) {
            let _ = tls.get_ref().shutdown(Shutdown::Both);
            return Err(err);
        }
        tls.get_ref().set_read_timeout(None)?;
        Ok(tls)
    }
}

impl Transport for TcpTransport {
    fn wire_format(&self) -> WireFormat {
        WireFormat::Stream
    }

    fn ensure_open(&mut self) -> Result<(), TransportError> {
        if self
            .connection
            .as_ref()
            .is_some_and(ActiveConnection::is_connected)
        {
            return Ok(());
        }
        self.close();
        self.connection = Some(self.connect()?);
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let immediate_flush = self.endpoint.live.immediate_flush();
        let conn = self
            .connection
            .as_mut()
            .ok_or(TransportError::NotWritable)?;
        conn.write_all(frame.body())?;
        if immediate_flush {
            conn.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        match self.connection.as_mut() {
            Some(conn) => conn.flush().map_err(TransportError::from),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            debug!("Logentries: closing connection to {}", self.endpoint.host);
            conn.shutdown();
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn socket_addrs(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    (host, port).to_socket_addrs().map(|iter| iter.collect())
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in socket_addrs(host, port)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{host}:{port} resolved to no addresses"),
        )
    }))
}
