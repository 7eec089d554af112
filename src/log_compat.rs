//! Bridge from the Rust `log` facade to Logentries.
//!
//! [`LogentriesAppender`] implements `log::Log` on top of a
//! [`LogentriesClient`]. Each record becomes one line,
//! `"{LEVEL} {target} - {message}"`; errors and warnings are coloured, the
//! rest use the client's default style. Records emitted by this crate, or by
//! anything running on a dispatch thread, are skipped so delivery
//! diagnostics are never shipped back to the endpoint.

use delegate::delegate;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::{
    client::{LogentriesClient, on_dispatch_thread},
    error::LogentriesError,
    rate_limited_warner::RateLimitedWarner,
    style::{ForegroundColor, Style},
};

const OWN_TARGET: &str = "logentries_rs";

/// `log::Log` implementation shipping records through a [`LogentriesClient`].
pub struct LogentriesAppender {
    client: LogentriesClient,
    level: LevelFilter,
    dropped: RateLimitedWarner,
}

impl LogentriesAppender {
    /// Wrap `client`, accepting every level until [`install`](Self::install)
    /// narrows it.
    pub fn new(client: LogentriesClient) -> Self {
        Self {
            client,
            level: LevelFilter::Trace,
            dropped: RateLimitedWarner::default(),
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn client(&self) -> &LogentriesClient {
        &self.client
    }

    /// Register as the global logger and set the maximum level.
    ///
    /// Fails when another global logger is already installed.
    pub fn install(self, level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(self.with_level(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    delegate! {
        to self.client {
            pub fn token(&self) -> Option<String>;
            pub fn set_token(&self, token: Option<String>);
            pub fn account_key(&self) -> Option<String>;
            pub fn set_account_key(&self, key: Option<String>);
            pub fn location_name(&self) -> Option<String>;
            pub fn set_location_name(&self, location: Option<String>);
            pub fn port(&self) -> u16;
            pub fn set_port(&self, port: u16);
            pub fn secure_port(&self) -> u16;
            pub fn set_secure_port(&self, port: u16);
            pub fn use_ssl(&self) -> bool;
            pub fn set_use_ssl(&self, value: bool);
            pub fn immediate_flush(&self) -> bool;
            pub fn set_immediate_flush(&self, value: bool);
            /// Stop shipping and close the connection.
            pub fn dispose(&self);
        }
    }

    fn submit(&self, record: &Record<'_>) -> Result<(), LogentriesError> {
        let text = render(record);
        match style_for(record.level()) {
            Some(style) => self.client.add_styled_line(&text, Some(style)),
            None => self.client.add_line(&text),
        }
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn render(record: &Record<'_>) -> String {
    format!("{} {} - {}", record.level(), record.target(), record.args())
}

fn style_for(level: log::Level) -> Option<Style> {
    match level {
        log::Level::Error => Some(Style::new().with_foreground(ForegroundColor::Red)),
        log::Level::Warn => Some(Style::new().with_foreground(ForegroundColor::Yellow)),
        _ => None,
    }
}

impl log::Log for LogentriesAppender {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
            && !is_own_target(metadata.target())
            && !on_dispatch_thread()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Err(err) = self.submit(record) {
            // The facade is this logger, so report on stderr.
            self.dropped.record();
            self.dropped.warn_if_due(|count| {
                eprintln!("logentries_rs: dropped {count} log records: {err}");
            });
        }
    }

    fn flush(&self) {
        self.client.flush();
    }
}

impl std::fmt::Debug for LogentriesAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogentriesAppender")
            .field("level", &self.level)
            .field("client", &self.client)
            .finish()
    }
}
