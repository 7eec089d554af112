//! Lazily resolved, memoized client credentials and ports.

use log::warn;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    ACCOUNT_KEY, LOCATION, LOCATION_NAME, PORT, SECURE_PORT, SettingsResolver, TOKEN,
};

/// Whether `candidate` parses as a GUID.
pub fn is_valid_token(candidate: &str) -> bool {
    Uuid::parse_str(candidate.trim()).is_ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn non_zero_port(name: &str, port: u16) -> Option<u16> {
    if port == 0 {
        warn!("Logentries: ignoring explicit {name} of 0");
        None
    } else {
        Some(port)
    }
}

/// An explicitly settable value backed by a memoized resolution.
///
/// Only successful resolutions are memoized; a miss is retried on the next
/// access. Once a value has been resolved it never changes, even if the
/// underlying sources do.
#[derive(Debug, Default)]
struct Memo<T> {
    explicit: RwLock<Option<T>>,
    resolved: OnceCell<T>,
}

impl<T: Clone> Memo<T> {
    fn get(&self, resolve: impl FnOnce() -> Option<T>) -> Option<T> {
        if let Some(value) = self.explicit.read().as_ref() {
            return Some(value.clone());
        }
        self.resolved
            .get_or_try_init(|| resolve().ok_or(()))
            .ok()
            .cloned()
    }

    fn set(&self, value: Option<T>) {
        *self.explicit.write() = value;
    }
}

/// Credentials and ports shared by the facade and the dispatch worker.
///
/// Constructing this never touches the settings sources; resolution happens
/// on first access.
#[derive(Debug)]
pub struct Credentials {
    resolver: SettingsResolver,
    token: Memo<String>,
    account_key: Memo<String>,
    location_name: Memo<String>,
    port: Memo<u16>,
    secure_port: Memo<u16>,
    default_port: u16,
    default_secure_port: u16,
}

impl Credentials {
    pub fn new(resolver: SettingsResolver, default_port: u16, default_secure_port: u16) -> Self {
        Self {
            resolver,
            token: Memo::default(),
            account_key: Memo::default(),
            location_name: Memo::default(),
            port: Memo::default(),
            secure_port: Memo::default(),
            default_port,
            default_secure_port,
        }
    }

    /// The explicit token, or the first GUID-valid token found in the sources.
    pub fn token(&self) -> Option<String> {
        self.token.get(|| {
            let candidate = self.resolver.resolve(TOKEN)?;
            if is_valid_token(&candidate) {
                Some(candidate)
            } else {
                warn!("Logentries: ignoring {TOKEN} setting that is not a valid GUID");
                None
            }
        })
    }

    /// Override the token. `None` or a blank value restores lookup through
    /// the sources.
    pub fn set_token(&self, token: Option<String>) {
        self.token.set(non_blank(token));
    }

    pub fn account_key(&self) -> Option<String> {
        self.account_key.get(|| self.resolver.resolve(ACCOUNT_KEY))
    }

    pub fn set_account_key(&self, key: Option<String>) {
        self.account_key.set(non_blank(key));
    }

    pub fn location_name(&self) -> Option<String> {
        self.location_name
            .get(|| self.resolver.resolve_any(&[LOCATION_NAME, LOCATION]))
    }

    pub fn set_location_name(&self, location: Option<String>) {
        self.location_name.set(non_blank(location));
    }

    pub fn port(&self) -> u16 {
        self.port
            .get(|| self.resolve_port(PORT))
            .unwrap_or(self.default_port)
    }

    /// Override the plaintext port. Zero is ignored.
    pub fn set_port(&self, port: u16) {
        if let Some(port) = non_zero_port(PORT, port) {
            self.port.set(Some(port));
        }
    }

    pub fn secure_port(&self) -> u16 {
        self.secure_port
            .get(|| self.resolve_port(SECURE_PORT))
            .unwrap_or(self.default_secure_port)
    }

    pub fn set_secure_port(&self, port: u16) {
        if let Some(port) = non_zero_port(SECURE_PORT, port) {
            self.secure_port.set(Some(port));
        }
    }

    /// A token, or an account key together with a location, is available.
    pub fn has_credentials(&self) -> bool {
        self.token().is_some() || (self.account_key().is_some() && self.location_name().is_some())
    }

    fn resolve_port(&self, name: &str) -> Option<u16> {
        let raw = self.resolver.resolve(name)?;
        match raw.parse::<u16>() {
            Ok(port) if port != 0 => Some(port),
            _ => {
                warn!("Logentries: ignoring {name} setting {raw:?}; expected a port number");
                None
            }
        }
    }
}
