//! Delays applied between delivery attempts of the head-of-queue line.

use std::time::Duration;

use crate::error::TransportError;

/// Delay after a stream write or flush failure.
pub const DEFAULT_IO_RETRY_DELAY: Duration = Duration::from_millis(1);
/// Delay after the endpoint could not be reached or authenticated.
pub const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Fixed retry delays. There is no attempt limit: a line is retried until it
/// is delivered, permanently rejected, or the client shuts down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub io_delay: Duration,
    pub connect_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            io_delay: DEFAULT_IO_RETRY_DELAY,
            connect_delay: DEFAULT_CONNECT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping.
    pub fn immediate() -> Self {
        Self {
            io_delay: Duration::ZERO,
            connect_delay: Duration::ZERO,
        }
    }

    /// Sleep to apply before retrying after `err`.
    pub fn delay_for(&self, err: &TransportError) -> Duration {
        if err.is_connection_failure() {
            self.connect_delay
        } else {
            self.io_delay
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn connection_failures_wait_longer() {
        let policy = RetryPolicy::default();
        let refused = TransportError::Connect {
            endpoint: "data.logentries.com:10000".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(policy.delay_for(&refused), Duration::from_millis(100));
        assert_eq!(
            policy.delay_for(&TransportError::Tls("pin".into())),
            Duration::from_millis(100)
        );
    }

    #[rstest]
    fn stream_failures_wait_briefly() {
        let policy = RetryPolicy::default();
        let broken = TransportError::Io(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(policy.delay_for(&broken), Duration::from_millis(1));
        assert_eq!(
            policy.delay_for(&TransportError::NotWritable),
            Duration::from_millis(1)
        );
    }

    #[rstest]
    fn immediate_never_sleeps() {
        let policy = RetryPolicy::immediate();
        assert_eq!(policy.delay_for(&TransportError::NotWritable), Duration::ZERO);
        assert_eq!(
            policy.delay_for(&TransportError::Http("reset".into())),
            Duration::ZERO
        );
    }
}
