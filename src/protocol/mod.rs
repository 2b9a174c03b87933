//! Protocol client capability.
//!
//! The poll loop talks to the device through [`ProtocolClient`], one
//! blocking request/response exchange per call. Only the TCP backend is
//! implemented; see [`TcpClient`].

mod tcp;

pub use tcp::TcpClient;

use thiserror::Error;

use crate::cli::config::RegisterKind;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid slave address {0}")]
    InvalidSlave(u8),

    #[error("not connected")]
    NotConnected,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Frame(#[from] rmodbus::ErrorKind),
}

/// One read operation per register kind, plus session lifecycle.
///
/// Bit-valued reads surface as 0/1 words so callers have a single value
/// path regardless of the kind's width.
pub trait ProtocolClient {
    fn connect(&mut self) -> Result<(), ProtocolError>;

    /// Select the slave addressed by subsequent reads.
    fn set_target(&mut self, slave_id: u8) -> Result<(), ProtocolError>;

    fn read_coils(&mut self, address: u16, count: u16) -> Result<Vec<u16>, ProtocolError>;
    fn read_discrete_inputs(&mut self, address: u16, count: u16)
        -> Result<Vec<u16>, ProtocolError>;
    fn read_input_registers(&mut self, address: u16, count: u16)
        -> Result<Vec<u16>, ProtocolError>;
    fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError>;

    /// Release the session. Must be safe to call more than once; both the
    /// failure path and the signal path release the session through here.
    fn close(&mut self);

    /// Dispatch to the read operation matching the register kind.
    fn read(
        &mut self,
        kind: RegisterKind,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        match kind {
            RegisterKind::Coils => self.read_coils(address, count),
            RegisterKind::DiscreteInputs => self.read_discrete_inputs(address, count),
            RegisterKind::InputRegisters => self.read_input_registers(address, count),
            RegisterKind::HoldingRegisters => self.read_holding_registers(address, count),
        }
    }
}
