//! Dispatch thread: the single consumer of the client's queue.
//!
//! Lines are taken in FIFO order. The head line is retried until the
//! transport accepts it, so an unreachable endpoint holds back everything
//! queued behind it.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;

use crate::{
    error::TransportError,
    line::{Frame, LogLine},
    rate_limited_warner::RateLimitedWarner,
    transport::{LiveSettings, Transport},
};

use super::retry::RetryPolicy;

const THREAD_NAME: &str = "logentries-dispatch";

/// Whether the caller is running on a client's dispatch thread.
///
/// Anything logged there comes from delivery itself (this crate or its
/// HTTP and TLS dependencies) and must not be queued again.
pub(crate) fn on_dispatch_thread() -> bool {
    thread::current().name() == Some(THREAD_NAME)
}

/// Commands processed by the worker thread.
#[derive(Debug)]
pub enum Command {
    Line(LogLine),
    /// Flush the transport once every earlier line has been handled.
    Flush(Sender<bool>),
    Shutdown(Sender<()>),
}

/// Outcome of handling one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    Abandoned,
}

/// Handle to the worker thread and its communication channels.
pub(crate) struct WorkerParts {
    pub(crate) tx: Sender<Command>,
    pub(crate) cancel: Arc<AtomicBool>,
    pub(crate) handle: JoinHandle<()>,
}

/// Spawn the dispatch thread.
pub(crate) fn spawn_worker<T>(
    transport: T,
    live: Arc<LiveSettings>,
    retry: RetryPolicy,
    warn_interval: Duration,
) -> io::Result<WorkerParts>
where
    T: Transport + 'static,
{
    let (tx, rx) = unbounded();
    let cancel = Arc::new(AtomicBool::new(false));
    let dispatcher = Dispatcher::new(transport, live, retry, warn_interval, Arc::clone(&cancel));
    let handle = thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || dispatcher.run(rx))?;
    Ok(WorkerParts { tx, cancel, handle })
}

pub(crate) struct Dispatcher<T> {
    transport: T,
    live: Arc<LiveSettings>,
    retry: RetryPolicy,
    cancel: Arc<AtomicBool>,
    failures: RateLimitedWarner,
    abandoned: RateLimitedWarner,
}

impl<T: Transport> Dispatcher<T> {
    pub(crate) fn new(
        transport: T,
        live: Arc<LiveSettings>,
        retry: RetryPolicy,
        warn_interval: Duration,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            live,
            retry,
            cancel,
            failures: RateLimitedWarner::new(warn_interval),
            abandoned: RateLimitedWarner::new(warn_interval),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub(crate) fn run(mut self, rx: Receiver<Command>) {
        while let Ok(cmd) = rx.recv() {
            if self.cancelled() {
                self.abandon_command(cmd);
                break;
            }
            match cmd {
                Command::Line(line) => {
                    self.dispatch(&line);
                }
                Command::Flush(ack) => {
                    let flushed = self.transport.flush().is_ok();
                    let _ = ack.send(flushed);
                }
                Command::Shutdown(ack) => {
                    let _ = ack.send(());
                    break;
                }
            }
        }
        for cmd in rx.try_iter() {
            self.abandon_command(cmd);
        }
        self.abandoned.flush(|count| {
            warn!("Logentries: abandoned {count} undelivered lines at shutdown");
        });
        self.failures.flush(|count| {
            warn!("Logentries: {count} delivery attempts failed before shutdown");
        });
        self.transport.close();
    }

    fn abandon_command(&self, cmd: Command) {
        match cmd {
            Command::Line(_) => self.abandoned.record(),
            Command::Flush(ack) => {
                let _ = ack.send(false);
            }
            Command::Shutdown(ack) => {
                let _ = ack.send(());
            }
        }
    }

    /// Compose `line` and deliver it, retrying transient failures.
    pub(crate) fn dispatch(&mut self, line: &LogLine) -> Delivery {
        let Some(token) = self.live.credentials.token() else {
            self.abandon("no valid Logentries.Token could be resolved");
            return Delivery::Abandoned;
        };
        let frame = Frame::compose(self.transport.wire_format(), &token, line);
        self.send_with_retry(&frame)
    }

    /// Retry until delivered or cancelled. A permanent rejection
    /// ([`TransportError::Rejected`]) drops the line.
    fn send_with_retry(&mut self, frame: &Frame) -> Delivery {
        loop {
            let err = match self.try_send(frame) {
                Ok(()) => return Delivery::Delivered,
                Err(err) => err,
            };
            if err.is_permanent() {
                self.abandon(&err.to_string());
                return Delivery::Abandoned;
            }
            self.transport.close();
            self.failures.record();
            self.failures.warn_if_due(|count| {
                warn!("Logentries: delivery failed ({err}); {count} failed attempts, retrying");
            });
            if self.cancelled() {
                self.abandoned.record();
                return Delivery::Abandoned;
            }
            let delay = self.retry.delay_for(&err);
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    fn try_send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.transport.ensure_open()?;
        self.transport.write(frame)
    }

    fn abandon(&self, reason: &str) {
        self.abandoned.record();
        self.abandoned.warn_if_due(|count| {
            warn!("Logentries: discarded {count} lines: {reason}");
        });
    }
}
