//! Server-side fault sink
//!
//! The server-under-test runs in its own threads and may hit uncaught
//! failures while a client script executes. Those failures must fail the
//! case even when the client exits cleanly. The sink is an explicitly
//! injected channel pair: the server holds cloneable writer handles, the
//! harness holds the sole drainer.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

/// A failure observed inside the server-under-test
#[derive(Debug, Clone)]
pub struct ServerFault {
    summary: String,
    thread: Option<String>,
    backtrace: Option<String>,
}

impl ServerFault {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            thread: None,
            backtrace: None,
        }
    }

    /// Name of the server thread the fault was raised on
    pub fn in_thread(mut self, name: impl Into<String>) -> Self {
        self.thread = Some(name.into());
        self
    }

    /// Captured backtrace text
    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Render the fault the way a stack trace prints: summary line,
    /// origin thread, then the backtrace frames
    pub fn render(&self) -> String {
        let mut out = self.summary.clone();
        if let Some(thread) = &self.thread {
            out.push_str(&format!("\n  in server thread '{thread}'"));
        }
        if let Some(backtrace) = &self.backtrace {
            out.push('\n');
            out.push_str(backtrace);
        }
        out
    }
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Writer handle held by the server-under-test
///
/// Cloneable so every server thread can record faults concurrently.
#[derive(Clone)]
pub struct FaultWriter {
    tx: Sender<ServerFault>,
}

impl FaultWriter {
    /// Append a fault to the sink
    ///
    /// If the harness side is already gone the run is over and the fault
    /// has nowhere to go; it is logged and dropped.
    pub fn record(&self, fault: ServerFault) {
        if self.tx.send(fault).is_err() {
            tracing::debug!("fault sink closed; fault dropped");
        }
    }
}

/// Drainer handle held by the harness
///
/// Not cloneable: exactly one reader exists per run.
pub struct FaultDrain {
    rx: Receiver<ServerFault>,
}

impl FaultDrain {
    /// Take every fault accumulated since the previous drain
    ///
    /// Non-blocking; preserves per-writer append order and never drops or
    /// duplicates entries.
    pub fn drain(&self) -> Vec<ServerFault> {
        self.rx.try_iter().collect()
    }
}

/// Create a connected writer/drainer pair for one harness run
pub fn fault_channel() -> (FaultWriter, FaultDrain) {
    let (tx, rx) = channel();
    (FaultWriter { tx }, FaultDrain { rx })
}
