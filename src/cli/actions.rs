use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::{
    cli::config::{PollConfig, RegisterKind},
    protocol::{ProtocolClient, TcpClient},
};

/// One poll's decoded values, as printed by `--once`.
#[derive(Serialize)]
pub struct PollSnapshot {
    pub slave_id: u8,
    pub start_reference: u32,
    pub register_kind: RegisterKind,
    pub values: Vec<u16>,
    pub timestamp: String,
}

/// Poll the device a single time and print the snapshot as JSON on stdout.
pub fn poll_once(config: &PollConfig) -> Result<()> {
    let mut client = TcpClient::new(&config.host, config.port);
    client.set_target(config.slave_id)?;
    client.connect().context("connection failed")?;

    let result = client.read(config.register_kind, config.address(), config.count);
    client.close();
    let values = result.context("read failed")?;

    let snapshot = PollSnapshot {
        slave_id: config.slave_id,
        start_reference: config.start_reference,
        register_kind: config.register_kind,
        values,
        timestamp: Utc::now().to_rfc3339(),
    };
    println!("{}", serde_json::to_string(&snapshot)?);
    Ok(())
}
