//! Per-line HTTP POST transport.
//!
//! Each frame is sent as a standalone request to
//! `{scheme}://{host}/v1/logs/{token}`. There is no connection state to open
//! or repair; the `ureq` agent pools connections internally.

use std::sync::Arc;

use native_tls::TlsConnector;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use ureq::{Agent, AgentBuilder};

use super::{EndpointSettings, Transport};
use crate::{
    error::TransportError,
    line::{Frame, WireFormat},
};

/// Logentries HTTP ingestion host.
pub const DEFAULT_INGESTION_HOST: &str = "js.logentries.com";

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Classification of HTTP response for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx responses - request succeeded.
    Success,
    /// 5xx or 429 - retry.
    Retryable,
    /// Any other status - the line is abandoned.
    Permanent,
}

/// Classifies an HTTP status code for retry logic.
pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        429 => ResponseClass::Retryable,
        500..=599 => ResponseClass::Retryable,
        _ => ResponseClass::Permanent,
    }
}

/// Transport issuing one POST per frame.
pub struct HttpTransport {
    endpoint: EndpointSettings,
    agent: Agent,
}

impl HttpTransport {
    pub fn new(endpoint: EndpointSettings) -> Self {
        let mut builder = AgentBuilder::new()
            .timeout_connect(endpoint.connect_timeout)
            .timeout(endpoint.write_timeout);
        // Without a native-tls connector ureq would fall back to its own TLS stack.
        if let Ok(connector) = TlsConnector::new() {
            builder = builder.tls_connector(Arc::new(connector));
        }
        Self {
            agent: builder.build(),
            endpoint,
        }
    }

    /// Target URL for `token` under the current TLS setting.
    pub fn url_for(&self, token: &str) -> String {
        let scheme = if self.endpoint.live.use_ssl() {
            "https"
        } else {
            "http"
        };
        format!(
            "{scheme}://{}/v1/logs/{}",
            self.endpoint.host,
            utf8_percent_encode(token, PATH_SEGMENT)
        )
    }
}

impl Transport for HttpTransport {
    fn wire_format(&self) -> WireFormat {
        WireFormat::Http
    }

    fn ensure_open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let url = self.url_for(frame.token());
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", "text/plain; charset=utf-8")
            .send_bytes(frame.body());
        let status = match result {
            Ok(response) => response.status(),
            Err(ureq::Error::Status(code, _)) => code,
            Err(ureq::Error::Transport(err)) => return Err(TransportError::Http(err.to_string())),
        };
        match classify_status(status) {
            ResponseClass::Success => Ok(()),
            ResponseClass::Retryable => Err(TransportError::Http(format!("status {status}"))),
            ResponseClass::Permanent => Err(TransportError::Rejected(status)),
        }
    }

    fn close(&mut self) {}
}
