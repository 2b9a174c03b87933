//! Process lifecycle signals.
//!
//! Signal delivery (OS signals, quit keys, terminal resize) never touches
//! live resources; each source posts a message on a channel and the poll
//! loop consumes it at its own checkpoints. Teardown therefore always runs
//! on the main thread, never in signal-delivery context.

use std::fmt;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};

/// Why the session is terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    /// SIGINT, SIGTERM or SIGHUP.
    Signal,
    /// A quit key in the dashboard (q, Esc, or Ctrl-C while in raw mode).
    Quit,
}

impl fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminateReason::Signal => write!(f, "termination signal"),
            TerminateReason::Quit => write!(f, "quit key"),
        }
    }
}

/// Lifecycle event observed by the poll loop. Repeated signals of the same
/// kind coalesce; at most one of each kind is ever pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    Terminate(TerminateReason),
    Relayout,
}

pub struct SignalController {
    tx: Sender<LifecycleSignal>,
    rx: Receiver<LifecycleSignal>,
}

impl SignalController {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Register the OS termination handlers (interrupt, hangup, terminate).
    /// The handler only posts a message.
    pub fn install(&self) -> Result<()> {
        let tx = self.tx.clone();
        ctrlc::set_handler(move || {
            let _ = tx.send(LifecycleSignal::Terminate(TerminateReason::Signal));
        })
        .context("failed to register signal handlers")
    }

    /// A sender for additional signal sources (the input pump, tests).
    pub fn sender(&self) -> Sender<LifecycleSignal> {
        self.tx.clone()
    }

    /// Drain everything queued since the last call. A Terminate dominates;
    /// any number of Relayouts collapse into one.
    pub fn pending(&self) -> Option<LifecycleSignal> {
        let mut relayout = false;
        for signal in self.rx.try_iter() {
            match signal {
                LifecycleSignal::Terminate(_) => return Some(signal),
                LifecycleSignal::Relayout => relayout = true,
            }
        }
        relayout.then_some(LifecycleSignal::Relayout)
    }
}

impl Default for SignalController {
    fn default() -> Self {
        Self::new()
    }
}
