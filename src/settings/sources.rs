//! Concrete settings sources.

use std::{collections::HashMap, fs, io::ErrorKind, path::Path};

use encoding_rs::Encoding;
use ini::Ini;

use crate::error::BuildError;

/// Section consulted before the general section of an INI file.
const APP_SETTINGS_SECTION: &str = "appSettings";

/// Anything that can answer "give me the setting called `name`".
pub trait SettingsSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl<F> SettingsSource for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// In-memory settings, typically populated from a cloud role configuration.
#[derive(Clone, Debug, Default)]
pub struct MapSettings {
    values: HashMap<String, String>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapSettings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SettingsSource for MapSettings {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Process environment variables.
///
/// The exact setting name is tried first, then its upper-snake alias, so
/// `Logentries.Token` also matches `LOGENTRIES_TOKEN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSettings;

impl EnvSettings {
    pub fn alias(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    }
}

impl SettingsSource for EnvSettings {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| std::env::var(Self::alias(name)).ok())
    }
}

/// Local application configuration read from an INI file.
///
/// Keys in an `[appSettings]` section win over keys in the general
/// (section-less) part of the file.
#[derive(Clone, Debug, Default)]
pub struct IniSettings {
    values: HashMap<String, String>,
}

impl IniSettings {
    /// Load a UTF-8 INI file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let bytes = read_file_bytes(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|err| BuildError::Settings(format!("{} is not UTF-8: {err}", path.display())))?;
        Self::parse(path, &text)
    }

    /// Load an INI file stored in the named text encoding (e.g. `windows-1252`).
    pub fn load_with_encoding(path: impl AsRef<Path>, label: &str) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let bytes = read_file_bytes(path)?;
        let text = decode_with_encoding(&bytes, label)?;
        Self::parse(path, &text)
    }

    /// Parse INI text directly.
    pub fn from_ini_str(text: &str) -> Result<Self, BuildError> {
        Self::parse(Path::new("<memory>"), text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self, BuildError> {
        let ini = Ini::load_from_str(text)
            .map_err(|err| BuildError::Settings(format!("{} is invalid: {err}", path.display())))?;
        let mut values: HashMap<String, String> = ini
            .general_section()
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        if let Some(section) = ini.section(Some(APP_SETTINGS_SECTION)) {
            values.extend(section.iter().map(|(k, v)| (k.to_owned(), v.to_owned())));
        }
        Ok(Self { values })
    }
}

impl SettingsSource for IniSettings {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn read_file_bytes(path: &Path) -> Result<Vec<u8>, BuildError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => BuildError::Settings(format!("{} doesn't exist", path.display())),
        _ => BuildError::Io(err),
    })
}

fn decode_with_encoding(bytes: &[u8], label: &str) -> Result<String, BuildError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| BuildError::Settings(format!("unknown encoding {label}")))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(BuildError::Settings(format!(
            "settings file is not valid {}",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}
