//! In-memory transport for exercising the client without a network.
//!
//! Enabled for unit tests and, through the `test-util` feature, for
//! integration tests.

use std::{collections::VecDeque, io, sync::Arc, time::Duration};

use parking_lot::{Condvar, Mutex};

use crate::{
    error::TransportError,
    line::{Frame, WireFormat},
    transport::Transport,
};

#[derive(Default)]
struct State {
    frames: Vec<Frame>,
    open: bool,
    opens: usize,
    closes: usize,
    write_attempts: usize,
    flushes: usize,
    connect_failures: VecDeque<TransportError>,
    write_failures: VecDeque<TransportError>,
    refuse_connections: bool,
}

/// A [`Transport`] that records frames and fails on request.
///
/// Clones share state, so a test keeps one handle while the client's
/// dispatch thread owns the other.
#[derive(Clone)]
pub struct MemoryTransport {
    format: WireFormat,
    state: Arc<(Mutex<State>, Condvar)>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(WireFormat::Stream)
    }
}

impl MemoryTransport {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            state: Arc::new((Mutex::new(State::default()), Condvar::new())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        let result = f(&mut state);
        cvar.notify_all();
        result
    }

    /// Queue failures returned by successive `write` calls.
    pub fn fail_writes(&self, errors: impl IntoIterator<Item = TransportError>) {
        self.with_state(|s| s.write_failures.extend(errors));
    }

    /// Queue failures returned by successive `ensure_open` calls.
    pub fn fail_connects(&self, errors: impl IntoIterator<Item = TransportError>) {
        self.with_state(|s| s.connect_failures.extend(errors));
    }

    /// Refuse every connection attempt until called again with `false`.
    pub fn refuse_connections(&self, refuse: bool) {
        self.with_state(|s| s.refuse_connections = refuse);
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.with_state(|s| s.frames.clone())
    }

    /// Delivered frame bodies decoded as UTF-8.
    pub fn bodies(&self) -> Vec<String> {
        self.with_state(|s| {
            s.frames
                .iter()
                .map(|f| String::from_utf8_lossy(f.body()).into_owned())
                .collect()
        })
    }

    pub fn write_attempts(&self) -> usize {
        self.with_state(|s| s.write_attempts)
    }

    pub fn opens(&self) -> usize {
        self.with_state(|s| s.opens)
    }

    pub fn closes(&self) -> usize {
        self.with_state(|s| s.closes)
    }

    pub fn flushes(&self) -> usize {
        self.with_state(|s| s.flushes)
    }

    pub fn is_open(&self) -> bool {
        self.with_state(|s| s.open)
    }

    /// Block until at least `count` frames were delivered or `timeout` passed.
    pub fn wait_for_frames(&self, count: usize, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        let deadline = std::time::Instant::now() + timeout;
        while state.frames.len() < count {
            if cvar.wait_until(&mut state, deadline).timed_out() {
                return state.frames.len() >= count;
            }
        }
        true
    }

    /// Block until at least `count` connection attempts happened.
    pub fn wait_for_opens(&self, count: usize, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        let deadline = std::time::Instant::now() + timeout;
        while state.opens < count {
            if cvar.wait_until(&mut state, deadline).timed_out() {
                return state.opens >= count;
            }
        }
        true
    }
}

impl Transport for MemoryTransport {
    fn wire_format(&self) -> WireFormat {
        self.format
    }

    fn ensure_open(&mut self) -> Result<(), TransportError> {
        self.with_state(|s| {
            if s.open {
                return Ok(());
            }
            s.opens += 1;
            if let Some(err) = s.connect_failures.pop_front() {
                return Err(err);
            }
            if s.refuse_connections {
                return Err(TransportError::Connect {
                    endpoint: "memory".into(),
                    source: io::Error::from(io::ErrorKind::ConnectionRefused),
                });
            }
            s.open = true;
            Ok(())
        })
    }

    fn write(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.with_state(|s| {
            s.write_attempts += 1;
            if !s.open {
                return Err(TransportError::NotWritable);
            }
            if let Some(err) = s.write_failures.pop_front() {
                return Err(err);
            }
            s.frames.push(frame.clone());
            Ok(())
        })
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.with_state(|s| {
            s.flushes += 1;
            Ok(())
        })
    }

    fn close(&mut self) {
        self.with_state(|s| {
            if s.open {
                s.open = false;
                s.closes += 1;
            }
        });
    }
}
