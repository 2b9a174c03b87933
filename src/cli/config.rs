use std::{str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Error, Result};
use clap::ArgMatches;
use serde::Serialize;

/// Standard Modbus TCP port.
pub const MODBUS_TCP_PORT: u16 = 502;

const MIN_SLAVE_ID: u16 = 1;
const MAX_SLAVE_ID: u16 = 247;
const MAX_REFERENCE: u32 = 65536;
const MAX_COUNT: u16 = 125;

/// Addressable Modbus data classes. The kind determines the value width
/// (1 bit vs 16-bit word) and which read operation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegisterKind {
    Coils,
    DiscreteInputs,
    InputRegisters,
    HoldingRegisters,
}

impl RegisterKind {
    /// Map the `-t` option code (1-4) to a kind.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RegisterKind::Coils),
            2 => Some(RegisterKind::DiscreteInputs),
            3 => Some(RegisterKind::InputRegisters),
            4 => Some(RegisterKind::HoldingRegisters),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RegisterKind::Coils => "Coils",
            RegisterKind::DiscreteInputs => "Discrete input",
            RegisterKind::InputRegisters => "16-bit input register",
            RegisterKind::HoldingRegisters => "16-bit holding register",
        }
    }

    /// Bit-valued kinds decode to 0/1 words.
    pub fn is_bits(self) -> bool {
        matches!(self, RegisterKind::Coils | RegisterKind::DiscreteInputs)
    }
}

/// Modbus communication backend. Only TCP is functional; the others are
/// recognized so the CLI can report them as not yet supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
    Rtu,
    Ascii,
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Transport::Tcp),
            "udp" => Ok(Transport::Udp),
            "rtu" => Ok(Transport::Rtu),
            "ascii" => Ok(Transport::Ascii),
            _ => bail!("Invalid communication mode {s}."),
        }
    }
}

impl Transport {
    pub fn label(self) -> &'static str {
        match self {
            Transport::Tcp => "Modbus TCP/IP",
            Transport::Udp => "Modbus UDP/IP",
            Transport::Rtu => "Modbus RTU",
            Transport::Ascii => "Modbus ASCII",
        }
    }
}

/// What to read and from whom. Immutable once validated; owns the host
/// string for the process lifetime.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub slave_id: u8,
    /// 1-based user-facing reference of the first data point.
    pub start_reference: u32,
    pub count: u16,
    pub register_kind: RegisterKind,
    pub poll_interval: Duration,
}

impl PollConfig {
    /// Validate the parsed arguments into a configuration. Range violations
    /// are rejected here, before any connection attempt, so the process can
    /// exit with status 1 rather than clap's own parse-error status.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let transport = matches
            .get_one::<String>("mode")
            .expect("defaulted")
            .parse::<Transport>()?;

        let slave = *matches.get_one::<u16>("slave").expect("defaulted");
        if !(MIN_SLAVE_ID..=MAX_SLAVE_ID).contains(&slave) {
            bail!("Invalid slave address {slave}.");
        }

        let reference = *matches.get_one::<u32>("reference").expect("defaulted");
        if !(1..=MAX_REFERENCE).contains(&reference) {
            bail!("Invalid start reference {reference}.");
        }

        let count = *matches.get_one::<u16>("count").expect("defaulted");
        if !(1..=MAX_COUNT).contains(&count) {
            bail!("Invalid data count {count}.");
        }

        let code = *matches.get_one::<u8>("type").expect("defaulted");
        let register_kind =
            RegisterKind::from_code(code).ok_or_else(|| anyhow!("Invalid data type {code}."))?;

        let rate = *matches.get_one::<u64>("rate").expect("defaulted");

        Ok(Self {
            transport,
            host: matches.get_one::<String>("host").expect("required").clone(),
            port: *matches.get_one::<u16>("port").expect("defaulted"),
            slave_id: slave as u8,
            start_reference: reference,
            count,
            register_kind,
            poll_interval: Duration::from_millis(rate),
        })
    }

    /// Protocol addresses are zero-based while user references are one-based.
    /// This is the only place the shift is applied.
    pub fn address(&self) -> u16 {
        (self.start_reference - 1) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(args: &[&str]) -> Result<PollConfig> {
        let matches = crate::cli::build_command()
            .try_get_matches_from(args)
            .expect("argv should be parseable");
        PollConfig::from_matches(&matches)
    }

    #[test]
    fn applies_documented_defaults() {
        let config = config_from(&["modpoll", "192.168.0.10"]).unwrap();
        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(config.slave_id, 1);
        assert_eq!(config.start_reference, 100);
        assert_eq!(config.count, 1);
        assert_eq!(config.register_kind, RegisterKind::InputRegisters);
        assert_eq!(config.port, MODBUS_TCP_PORT);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.host, "192.168.0.10");
    }

    #[test]
    fn rejects_out_of_range_slave_ids() {
        assert!(config_from(&["modpoll", "-a", "0", "host"]).is_err());
        assert!(config_from(&["modpoll", "-a", "300", "host"]).is_err());
        assert!(config_from(&["modpoll", "-a", "247", "host"]).is_ok());
    }

    #[test]
    fn rejects_zero_reference_before_any_read() {
        assert!(config_from(&["modpoll", "-r", "0", "host"]).is_err());
        assert!(config_from(&["modpoll", "-r", "65537", "host"]).is_err());
        assert!(config_from(&["modpoll", "-r", "65536", "host"]).is_ok());
    }

    #[test]
    fn rejects_invalid_data_type() {
        assert!(config_from(&["modpoll", "-t", "0", "host"]).is_err());
        assert!(config_from(&["modpoll", "-t", "5", "host"]).is_err());
    }

    #[test]
    fn rejects_invalid_count() {
        assert!(config_from(&["modpoll", "-c", "0", "host"]).is_err());
        assert!(config_from(&["modpoll", "-c", "126", "host"]).is_err());
        assert!(config_from(&["modpoll", "-c", "125", "host"]).is_ok());
    }

    #[test]
    fn reference_shift_is_zero_based() {
        let config = config_from(&["modpoll", "-r", "100", "host"]).unwrap();
        assert_eq!(config.address(), 99);
        let config = config_from(&["modpoll", "-r", "1", "host"]).unwrap();
        assert_eq!(config.address(), 0);
    }

    #[test]
    fn parses_every_transport_mode() {
        assert_eq!("tcp".parse::<Transport>().unwrap(), Transport::Tcp);
        assert_eq!("udp".parse::<Transport>().unwrap(), Transport::Udp);
        assert_eq!("rtu".parse::<Transport>().unwrap(), Transport::Rtu);
        assert_eq!("ascii".parse::<Transport>().unwrap(), Transport::Ascii);
        assert!("serial".parse::<Transport>().is_err());
    }

    #[test]
    fn register_kind_width_follows_the_kind() {
        assert!(RegisterKind::Coils.is_bits());
        assert!(RegisterKind::DiscreteInputs.is_bits());
        assert!(!RegisterKind::InputRegisters.is_bits());
        assert!(!RegisterKind::HoldingRegisters.is_bits());
    }
}
