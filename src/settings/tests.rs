//! Tests for settings resolution and credential memoization.

use std::{
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use rstest::{fixture, rstest};
use serial_test::serial;
use tempfile::NamedTempFile;

use super::*;
use crate::error::BuildError;

const TOKEN_A: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1d";
const TOKEN_B: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1f";

#[fixture]
fn cloud() -> MapSettings {
    MapSettings::new().with(TOKEN, TOKEN_A)
}

fn credentials(resolver: SettingsResolver) -> Credentials {
    Credentials::new(resolver, 10000, 20000)
}

#[rstest]
fn first_source_wins(cloud: MapSettings) {
    let resolver = SettingsResolver::new()
        .with_source(cloud)
        .with_source(MapSettings::new().with(TOKEN, TOKEN_B));
    assert_eq!(resolver.resolve(TOKEN).as_deref(), Some(TOKEN_A));
}

#[rstest]
fn blank_values_fall_through() {
    let resolver = SettingsResolver::new()
        .with_source(MapSettings::new().with(TOKEN, "   "))
        .with_source(MapSettings::new().with(TOKEN, TOKEN_B));
    assert_eq!(resolver.resolve(TOKEN).as_deref(), Some(TOKEN_B));
}

#[rstest]
fn closures_are_sources() {
    let resolver = SettingsResolver::new()
        .with_source(|name: &str| (name == PORT).then(|| "12345".to_owned()));
    assert_eq!(resolver.resolve(PORT).as_deref(), Some("12345"));
    assert_eq!(resolver.resolve(TOKEN), None);
}

#[rstest]
fn location_alias_is_recognised() {
    let creds = credentials(
        SettingsResolver::new().with_source(MapSettings::new().with(LOCATION, "eu-west")),
    );
    assert_eq!(creds.location_name().as_deref(), Some("eu-west"));
}

#[rstest]
fn invalid_guid_is_not_a_token() {
    let creds = credentials(
        SettingsResolver::new().with_source(MapSettings::new().with(TOKEN, "not-a-guid")),
    );
    assert_eq!(creds.token(), None);
    assert!(!creds.has_credentials());
}

#[rstest]
fn account_key_and_location_count_as_credentials() {
    let creds = credentials(
        SettingsResolver::new().with_source(
            MapSettings::new()
                .with(ACCOUNT_KEY, "key")
                .with(LOCATION_NAME, "somewhere"),
        ),
    );
    assert_eq!(creds.token(), None);
    assert!(creds.has_credentials());
}

#[rstest]
fn explicit_token_wins_over_configuration(cloud: MapSettings) {
    let creds = credentials(SettingsResolver::new().with_source(cloud));
    creds.set_token(Some(TOKEN_B.into()));
    assert_eq!(creds.token().as_deref(), Some(TOKEN_B));
    creds.set_token(None);
    assert_eq!(creds.token().as_deref(), Some(TOKEN_A));
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_explicit_token_is_no_token(#[case] blank: &str) {
    let creds = credentials(SettingsResolver::new());
    creds.set_token(Some(blank.into()));
    creds.set_account_key(Some(blank.into()));
    creds.set_location_name(Some(blank.into()));
    assert_eq!(creds.token(), None);
    assert_eq!(creds.account_key(), None);
    assert_eq!(creds.location_name(), None);
    assert!(!creds.has_credentials());
}

#[rstest]
fn blank_explicit_token_falls_back_to_configuration(cloud: MapSettings) {
    let creds = credentials(SettingsResolver::new().with_source(cloud));
    creds.set_token(Some(" ".into()));
    assert_eq!(creds.token().as_deref(), Some(TOKEN_A));
}

#[rstest]
fn resolved_token_is_never_re_resolved() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let resolver = SettingsResolver::new().with_source(move |name: &str| {
        if name != TOKEN {
            return None;
        }
        let n = seen.fetch_add(1, Ordering::SeqCst);
        Some(if n == 0 { TOKEN_A } else { TOKEN_B }.to_owned())
    });
    let creds = credentials(resolver);
    assert_eq!(creds.token().as_deref(), Some(TOKEN_A));
    assert_eq!(creds.token().as_deref(), Some(TOKEN_A));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
fn missing_token_is_retried_until_found() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let resolver = SettingsResolver::new().with_source(move |name: &str| {
        if name != TOKEN {
            return None;
        }
        (seen.fetch_add(1, Ordering::SeqCst) > 0).then(|| TOKEN_A.to_owned())
    });
    let creds = credentials(resolver);
    assert_eq!(creds.token(), None);
    assert_eq!(creds.token().as_deref(), Some(TOKEN_A));
}

#[rstest]
#[case(None, 10000)]
#[case(Some("15000"), 15000)]
#[case(Some("not a port"), 10000)]
#[case(Some("0"), 10000)]
fn port_falls_back_to_default(#[case] configured: Option<&str>, #[case] expected: u16) {
    let map = match configured {
        Some(value) => MapSettings::new().with(PORT, value),
        None => MapSettings::new(),
    };
    let creds = credentials(SettingsResolver::new().with_source(map));
    assert_eq!(creds.port(), expected);
}

#[rstest]
fn explicit_port_wins() {
    let creds = credentials(
        SettingsResolver::new().with_source(MapSettings::new().with(SECURE_PORT, "443")),
    );
    assert_eq!(creds.secure_port(), 443);
    creds.set_secure_port(8443);
    assert_eq!(creds.secure_port(), 8443);
}

#[rstest]
fn explicit_zero_port_is_ignored() {
    let creds = credentials(
        SettingsResolver::new().with_source(MapSettings::new().with(PORT, "15000")),
    );
    creds.set_port(0);
    creds.set_secure_port(0);
    assert_eq!(creds.port(), 15000);
    assert_eq!(creds.secure_port(), 20000);
    creds.set_port(12000);
    creds.set_port(0);
    assert_eq!(creds.port(), 12000);
}

#[rstest]
fn ini_app_settings_section_wins_over_general() {
    let text = format!(
        "Logentries.Token = {TOKEN_B}\nLogentries.Port = 9000\n\n[appSettings]\nLogentries.Token = {TOKEN_A}\n"
    );
    let ini = IniSettings::from_ini_str(&text).expect("parse ini");
    assert_eq!(ini.lookup(TOKEN).as_deref(), Some(TOKEN_A));
    assert_eq!(ini.lookup(PORT).as_deref(), Some("9000"));
}

#[rstest]
fn ini_loads_from_disk() {
    let mut file = NamedTempFile::new().expect("create temp ini file");
    writeln!(file, "[appSettings]\nLogentries.AccountKey = abc").expect("write ini");
    let ini = IniSettings::load(file.path()).expect("load ini");
    assert_eq!(ini.lookup(ACCOUNT_KEY).as_deref(), Some("abc"));
}

#[rstest]
fn ini_decodes_legacy_encoding() {
    let mut file = NamedTempFile::new().expect("create temp ini file");
    // "Zürich" in windows-1252.
    file.write_all(b"Logentries.LocationName = Z\xfcrich\n")
        .expect("write ini");
    let ini = IniSettings::load_with_encoding(file.path(), "windows-1252").expect("load ini");
    assert_eq!(ini.lookup(LOCATION_NAME).as_deref(), Some("Zürich"));
}

#[rstest]
fn ini_reports_missing_file() {
    let err = IniSettings::load("/nonexistent/logentries.ini").expect_err("file is missing");
    assert!(matches!(err, BuildError::Settings(msg) if msg.contains("doesn't exist")));
}

#[rstest]
fn ini_rejects_unknown_encoding() {
    let file = NamedTempFile::new().expect("create temp ini file");
    let err = IniSettings::load_with_encoding(file.path(), "does-not-exist")
        .expect_err("unknown encoding");
    assert!(matches!(err, BuildError::Settings(msg) if msg.contains("unknown encoding")));
}

#[rstest]
fn env_alias_is_upper_snake() {
    assert_eq!(EnvSettings::alias(TOKEN), "LOGENTRIES_TOKEN");
    assert_eq!(EnvSettings::alias(SECURE_PORT), "LOGENTRIES_SECUREPORT");
}

#[rstest]
#[serial]
fn env_settings_reads_alias() {
    // SAFETY: serialised with the other environment tests.
    unsafe {
        std::env::remove_var(TOKEN);
        std::env::set_var("LOGENTRIES_TOKEN", TOKEN_A);
    }
    let creds = credentials(SettingsResolver::default());
    assert_eq!(creds.token().as_deref(), Some(TOKEN_A));
    unsafe {
        std::env::remove_var("LOGENTRIES_TOKEN");
    }
}

#[rstest]
#[serial]
fn environment_is_last_resort(cloud: MapSettings) {
    unsafe {
        std::env::set_var(TOKEN, TOKEN_B);
    }
    let resolver = SettingsResolver::new()
        .with_source(cloud)
        .with_source(EnvSettings);
    assert_eq!(resolver.resolve(TOKEN).as_deref(), Some(TOKEN_A));
    let env_only = SettingsResolver::new().with_source(EnvSettings);
    assert_eq!(env_only.resolve(TOKEN).as_deref(), Some(TOKEN_B));
    unsafe {
        std::env::remove_var(TOKEN);
    }
}
