//! Named-setting lookup across ordered configuration sources.
//!
//! A [`SettingsResolver`] consults its sources in the order they were added
//! and returns the first non-blank value. The conventional order is the
//! cloud or platform provider, then the local application configuration,
//! then the process environment. Values set explicitly on the client sit in
//! front of all of these; see [`Credentials`].

mod credentials;
mod sources;

#[cfg(test)]
mod tests;

use std::fmt;

pub use credentials::{Credentials, is_valid_token};
pub use sources::{EnvSettings, IniSettings, MapSettings, SettingsSource};

/// Ingestion token (GUID).
pub const TOKEN: &str = "Logentries.Token";
/// Account key used together with a location name.
pub const ACCOUNT_KEY: &str = "Logentries.AccountKey";
/// Location name; [`LOCATION`] is accepted as an alias.
pub const LOCATION_NAME: &str = "Logentries.LocationName";
pub const LOCATION: &str = "Logentries.Location";
/// Plaintext stream port.
pub const PORT: &str = "Logentries.Port";
/// TLS stream port.
pub const SECURE_PORT: &str = "Logentries.SecurePort";

/// Ordered list of settings sources.
pub struct SettingsResolver {
    sources: Vec<Box<dyn SettingsSource>>,
}

impl SettingsResolver {
    /// Create a resolver with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Append a source with lower priority than those already present.
    pub fn with_source(mut self, source: impl SettingsSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Return the first non-blank value for `name`, trimmed.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            source
                .lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        })
    }

    /// Resolve the first of `names` that yields a value.
    pub fn resolve_any(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.resolve(name))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Consults the process environment only.
impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new().with_source(EnvSettings)
    }
}

impl fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("sources", &self.sources.len())
            .finish()
    }
}
