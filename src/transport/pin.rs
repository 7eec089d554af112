//! Certificate pinning for the TLS stream.

use std::{fmt, sync::Arc};

use native_tls::Certificate;

use crate::error::{BuildError, TransportError};

const LOGENTRIES_DATA_PEM: &[u8] = include_bytes!("data.logentries.com.pem");

/// The single certificate a TLS peer must present.
///
/// Built-in roots are never consulted; the peer's leaf certificate must be
/// byte-for-byte identical to the pinned one.
#[derive(Clone, PartialEq, Eq)]
pub struct PinnedCertificate {
    pem: Arc<[u8]>,
}

impl PinnedCertificate {
    /// The certificate served by `data.logentries.com`.
    pub fn logentries() -> Self {
        Self {
            pem: Arc::from(LOGENTRIES_DATA_PEM),
        }
    }

    /// Pin a different PEM-encoded certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self, BuildError> {
        Certificate::from_pem(pem)
            .map_err(|err| BuildError::InvalidConfig(format!("pinned certificate: {err}")))?;
        Ok(Self {
            pem: Arc::from(pem),
        })
    }

    /// DER encoding of the pinned certificate.
    pub fn der(&self) -> Result<Vec<u8>, TransportError> {
        Certificate::from_pem(&self.pem)
            .and_then(|cert| cert.to_der())
            .map_err(|err| TransportError::Tls(format!("unusable pinned certificate: {err}")))
    }

    /// Check a peer certificate against the pin.
    pub fn verify(&self, peer: Option<Certificate>) -> Result<(), TransportError> {
        let peer = peer.ok_or_else(|| TransportError::Tls("peer sent no certificate".into()))?;
        let peer_der = peer
            .to_der()
            .map_err(|err| TransportError::Tls(format!("unreadable peer certificate: {err}")))?;
        if peer_der == self.der()? {
            Ok(())
        } else {
            Err(TransportError::Tls(
                "peer certificate does not match the pinned certificate".into(),
            ))
        }
    }
}

impl Default for PinnedCertificate {
    fn default() -> Self {
        Self::logentries()
    }
}

impl fmt::Debug for PinnedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedCertificate")
            .field("pem_len", &self.pem.len())
            .finish()
    }
}
