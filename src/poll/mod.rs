//! The poll-render-signal loop.
//!
//! One cycle: observe pending lifecycle signals, issue the configured read,
//! render the decoded values, then wait out the poll interval in short
//! slices so a termination request never waits for the full interval. A
//! read failure is fatal; there is no retry or reconnect state.

use std::{
    fmt, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::Local;

use crate::{
    cli::config::PollConfig,
    protocol::ProtocolClient,
    signal::{LifecycleSignal, SignalController, TerminateReason},
    tui::{ui, TerminalLayout, TerminalSurface, DATA_FIRST_ROW},
};

/// Upper bound on one wait slice; a pending Terminate is honored within
/// this much time even in the middle of a long poll interval.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Why the loop stopped cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReason(pub TerminateReason);

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

enum Wait {
    Elapsed,
    Terminated(TerminateReason),
}

/// The orchestrator: owns the configuration, the protocol session and the
/// terminal surface for the lifetime of the process.
pub struct PollLoop<C, S> {
    config: PollConfig,
    client: C,
    surface: S,
    signals: SignalController,
    polls: u64,
    last_rendered: usize,
}

impl<C: ProtocolClient, S: TerminalSurface> PollLoop<C, S> {
    pub fn new(config: PollConfig, client: C, surface: S, signals: SignalController) -> Self {
        Self {
            config,
            client,
            surface,
            signals,
            polls: 0,
            last_rendered: 0,
        }
    }

    /// Run until a termination signal or a fatal error. Every exit path,
    /// clean or not, goes through the same shutdown routine exactly once.
    pub fn run(mut self) -> Result<StopReason> {
        let outcome = self.session();
        self.shutdown();
        outcome
    }

    fn session(&mut self) -> Result<StopReason> {
        self.client
            .set_target(self.config.slave_id)
            .context("failed to select slave")?;
        self.client.connect().context("connection failed")?;

        self.surface.open()?;
        self.surface
            .draw_info(&ui::info_fields(&self.config, "polling"))?;
        self.surface.flush()?;

        self.cycles()
    }

    fn cycles(&mut self) -> Result<StopReason> {
        loop {
            match self.signals.pending() {
                Some(LifecycleSignal::Terminate(reason)) => return Ok(StopReason(reason)),
                Some(LifecycleSignal::Relayout) => self.relayout()?,
                None => {}
            }

            let values = self
                .client
                .read(
                    self.config.register_kind,
                    self.config.address(),
                    self.config.count,
                )
                .context("read failed")?;
            self.render(&values)?;

            if let Wait::Terminated(reason) = self.wait_interval()? {
                return Ok(StopReason(reason));
            }
        }
    }

    /// Write one line per value, blank the rows a longer previous cycle
    /// left behind, refresh the status field and flush.
    fn render(&mut self, values: &[u16]) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            let reference = self.config.start_reference + i as u32;
            self.surface
                .draw_data_row(DATA_FIRST_ROW + i, &format!("[{reference}]: {value}"))?;
        }
        for stale in values.len()..self.last_rendered {
            self.surface.draw_data_row(DATA_FIRST_ROW + stale, "")?;
        }
        self.last_rendered = values.len();

        self.polls += 1;
        let status = format!(
            "{} polls, last update {}",
            self.polls,
            Local::now().format("%H:%M:%S")
        );
        self.surface
            .draw_info(&ui::info_fields(&self.config, &status))?;
        self.surface.flush()
    }

    /// Sleep out the poll interval in short slices, staying responsive to
    /// lifecycle signals. A relayout re-renders immediately; the deadline
    /// is unaffected, so the next poll is neither skipped nor duplicated.
    fn wait_interval(&mut self) -> Result<Wait> {
        let deadline = Instant::now() + self.config.poll_interval;
        loop {
            match self.signals.pending() {
                Some(LifecycleSignal::Terminate(reason)) => return Ok(Wait::Terminated(reason)),
                Some(LifecycleSignal::Relayout) => self.relayout()?,
                None => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Wait::Elapsed);
            }
            thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }

    fn relayout(&mut self) -> Result<()> {
        let (columns, rows) = crossterm::terminal::size().unwrap_or((0, 0));
        self.surface.rebuild(TerminalLayout::compute(columns, rows))
    }

    /// The single release point for the session's resources. The surface
    /// closes first so a fatal error is printed to a restored terminal.
    fn shutdown(&mut self) {
        if let Err(err) = self.surface.close() {
            log::warn!("failed to close terminal surface: {err}");
        }
        self.client.close();
    }
}
