//! Modpoll — a Modbus master polling dashboard for the terminal.
//!
//! The crate is organized around the poll-render-signal loop in [`poll`]:
//! [`cli`] produces the validated poll configuration, [`protocol`] performs
//! one blocking request/response exchange per cycle, [`tui`] owns the two
//! dashboard panels, and [`signal`] turns asynchronous lifecycle events
//! (termination signals, quit keys, terminal resizes) into messages the
//! loop consumes at its own checkpoints.

pub mod cli;
pub mod poll;
pub mod protocol;
pub mod signal;
pub mod tui;
