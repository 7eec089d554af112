//! Builder for [`LogentriesClient`].
//!
//! Exposes transport selection, endpoint and credential overrides, timeout
//! tuning, and retry delays. Validation happens in [`ClientBuilder::build`];
//! the client itself never fails to construct.

use std::time::Duration;

use crate::{
    error::BuildError,
    settings::SettingsResolver,
    style::Style,
    transport::{PinnedCertificate, Transport, TransportKind},
};

use super::{LogentriesClient, config::ClientConfig, retry::RetryPolicy};

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Builder for constructing [`LogentriesClient`] instances.
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<TransportKind>,
    host: Option<String>,
    token: Option<String>,
    account_key: Option<String>,
    location_name: Option<String>,
    port: Option<u16>,
    secure_port: Option<u16>,
    use_ssl: Option<bool>,
    immediate_flush: Option<bool>,
    style: Option<Option<Style>>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    shutdown_timeout_ms: Option<u64>,
    warn_interval_ms: Option<u64>,
    retry: Option<RetryPolicy>,
    pinned_certificate: Option<PinnedCertificate>,
    settings: Option<SettingsResolver>,
}

impl ClientBuilder {
    /// Create a builder using the default TCP transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ship lines over a persistent TCP stream.
    pub fn with_tcp(mut self) -> Self {
        self.transport = Some(TransportKind::Tcp);
        self
    }

    /// Ship lines as individual HTTP POST requests.
    pub fn with_http(mut self) -> Self {
        self.transport = Some(TransportKind::Http);
        self
    }

    /// Override the endpoint host for the selected transport.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_account_key(mut self, key: impl Into<String>) -> Self {
        self.account_key = Some(key.into());
        self
    }

    pub fn with_location_name(mut self, location: impl Into<String>) -> Self {
        self.location_name = Some(location.into());
        self
    }

    /// Prefix every line with `style`.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(Some(style));
        self
    }

    /// Send lines without any style prefix.
    pub fn with_bare_lines(mut self) -> Self {
        self.style = Some(None);
        self
    }

    /// Settings sources consulted for values not set explicitly.
    pub fn with_settings(mut self, settings: SettingsResolver) -> Self {
        self.settings = Some(settings);
        self
    }

    option_setter!(with_port, port, u16);
    option_setter!(with_secure_port, secure_port, u16);
    option_setter!(
        #[doc = "Connect over TLS using the secure port."]
        with_ssl,
        use_ssl,
        bool
    );
    option_setter!(
        #[doc = "Flush the stream after every line."]
        with_immediate_flush,
        immediate_flush,
        bool
    );
    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(with_write_timeout_ms, write_timeout_ms, u64);
    option_setter!(with_shutdown_timeout_ms, shutdown_timeout_ms, u64);
    option_setter!(with_warn_interval_ms, warn_interval_ms, u64);
    option_setter!(with_retry, retry, RetryPolicy);
    option_setter!(with_pinned_certificate, pinned_certificate, PinnedCertificate);

    fn validate(&self) -> Result<(), BuildError> {
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            return Err(BuildError::InvalidConfig("host must not be empty".into()));
        }
        if let Some(port) = self.port {
            ensure_positive!(port, "port")?;
        }
        if let Some(port) = self.secure_port {
            ensure_positive!(port, "secure_port")?;
        }
        if let Some(ms) = self.connect_timeout_ms {
            ensure_positive!(ms, "connect_timeout_ms")?;
        }
        if let Some(ms) = self.write_timeout_ms {
            ensure_positive!(ms, "write_timeout_ms")?;
        }
        if let Some(ms) = self.shutdown_timeout_ms {
            ensure_positive!(ms, "shutdown_timeout_ms")?;
        }
        Ok(())
    }

    /// Validate and produce the configuration without starting a client.
    pub fn build_config(&self) -> Result<ClientConfig, BuildError> {
        self.validate()?;
        let mut config = ClientConfig::default();
        if let Some(kind) = self.transport {
            config.transport = kind;
        }
        if let Some(host) = &self.host {
            match config.transport {
                TransportKind::Tcp => config.data_host = host.clone(),
                TransportKind::Http => config.ingestion_host = host.clone(),
            }
        }
        config.token = self.token.clone();
        config.account_key = self.account_key.clone();
        config.location_name = self.location_name.clone();
        config.port = self.port;
        config.secure_port = self.secure_port;
        config.use_ssl = self.use_ssl.unwrap_or(config.use_ssl);
        config.immediate_flush = self.immediate_flush.unwrap_or(config.immediate_flush);
        if let Some(style) = &self.style {
            config.style = style.clone();
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.write_timeout_ms {
            config.write_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.shutdown_timeout_ms {
            config.shutdown_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.warn_interval_ms {
            config.warn_interval = Duration::from_millis(ms);
        }
        if let Some(retry) = self.retry {
            config.retry = retry;
        }
        if let Some(pin) = &self.pinned_certificate {
            config.pinned_certificate = pin.clone();
        }
        Ok(config)
    }

    /// Build a client and start its dispatch thread.
    pub fn build(mut self) -> Result<LogentriesClient, BuildError> {
        let config = self.build_config()?;
        let settings = self.settings.take().unwrap_or_default();
        Ok(LogentriesClient::with_settings(config, settings))
    }

    /// Build a client that delivers through `transport`.
    pub fn build_with_transport<T>(mut self, transport: T) -> Result<LogentriesClient, BuildError>
    where
        T: Transport + 'static,
    {
        let config = self.build_config()?;
        let settings = self.settings.take().unwrap_or_default();
        Ok(LogentriesClient::with_transport(config, settings, transport))
    }
}
