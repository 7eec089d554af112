//! Debug-level `log` records shipped over HTTP produce exactly one request.
//!
//! The HTTP client logs on the dispatch thread while it posts; those records
//! must not be queued as new lines.
#![cfg(feature = "log-compat")]

mod test_utils;

use std::{net::TcpListener, time::Duration};

use log::LevelFilter;
use logentries_rs::{LogentriesAppender, LogentriesClient, RetryPolicy, SettingsResolver};
use rstest::rstest;
use test_utils::{TOKEN, spawn_http_server};

#[rstest]
fn delivery_does_not_log_itself_into_the_queue() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let rx = spawn_http_server(listener, vec![204; 64]);
    let client = LogentriesClient::builder()
        .with_http()
        .with_host(addr.to_string())
        .with_token(TOKEN)
        .with_bare_lines()
        .with_settings(SettingsResolver::new())
        .with_retry(RetryPolicy::immediate())
        .build()
        .expect("build");
    LogentriesAppender::new(client)
        .install(LevelFilter::Debug)
        .expect("no other logger installed");

    log::info!(target: "my_app", "one record");

    let first = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("the record is posted");
    assert_eq!(first.body, "INFO my_app - one record");
    let extra = std::iter::from_fn(|| rx.recv_timeout(Duration::from_secs(1)).ok()).count();
    assert_eq!(extra, 0);
}
