//! Installing the appender as the process-wide `log` backend.
#![cfg(feature = "log-compat")]

use std::time::Duration;

use log::{LevelFilter, Log};
use logentries_rs::{
    ClientConfig, LogentriesAppender, LogentriesClient, RetryPolicy, SettingsResolver,
    test_support::MemoryTransport,
};
use rstest::rstest;

const TOKEN: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1f";

#[rstest]
fn installed_appender_ships_facade_records() {
    let transport = MemoryTransport::default();
    let config = ClientConfig {
        token: Some(TOKEN.into()),
        retry: RetryPolicy::immediate(),
        ..ClientConfig::default()
    }
    .bare();
    let client =
        LogentriesClient::with_transport(config, SettingsResolver::new(), transport.clone());
    LogentriesAppender::new(client)
        .install(LevelFilter::Info)
        .expect("no other logger installed");

    log::debug!(target: "my_app", "hidden");
    log::info!(target: "my_app", "visible");
    log::warn!(target: "logentries_rs::client", "internal");
    log::logger().flush();

    assert!(transport.wait_for_frames(1, Duration::from_secs(2)));
    assert_eq!(
        transport.bodies(),
        vec![format!("{TOKEN}INFO my_app - visible\n")]
    );
    assert_eq!(log::max_level(), LevelFilter::Info);
}
