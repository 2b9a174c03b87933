use std::{
    io::{Read, Write},
    net::{Shutdown, TcpStream},
    time::Duration,
};

use rmodbus::{client::ModbusRequest, guess_response_frame_len, ModbusProto};

use super::{ProtocolClient, ProtocolError};

/// Response wait bound per exchange; the transport timeout, not the poll
/// interval.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Offset of the PDU data bytes in a TCP response frame:
/// MBAP header (6) + unit id (1) + function (1) + byte count (1).
const DATA_OFFSET: usize = 9;

/// Blocking Modbus TCP client.
pub struct TcpClient {
    host: String,
    port: u16,
    unit_id: u8,
    stream: Option<TcpStream>,
}

impl TcpClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            unit_id: 1,
            stream: None,
        }
    }

    fn request(&self) -> ModbusRequest {
        ModbusRequest::new(self.unit_id, ModbusProto::TcpUdp)
    }

    /// Send one request frame and read back the full response frame. The
    /// MBAP header carries the remaining length, so read 6 bytes first and
    /// size the body from it.
    fn exchange(&mut self, raw: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let stream = self.stream.as_mut().ok_or(ProtocolError::NotConnected)?;
        stream.write_all(raw)?;

        let mut header = [0u8; 6];
        stream.read_exact(&mut header)?;
        let frame_len = guess_response_frame_len(&header, ModbusProto::TcpUdp)? as usize;

        let mut response = header.to_vec();
        if frame_len > header.len() {
            let mut body = vec![0u8; frame_len - header.len()];
            stream.read_exact(&mut body)?;
            response.extend_from_slice(&body);
        }
        Ok(response)
    }
}

impl ProtocolClient for TcpClient {
    fn connect(&mut self) -> Result<(), ProtocolError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(|err| ProtocolError::Connection(format!("{}:{}: {err}", self.host, self.port)))?;
        stream.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        stream.set_write_timeout(Some(RESPONSE_TIMEOUT))?;
        stream.set_nodelay(true)?;
        log::info!("connected to {}:{}", self.host, self.port);
        self.stream = Some(stream);
        Ok(())
    }

    fn set_target(&mut self, slave_id: u8) -> Result<(), ProtocolError> {
        if !(1..=247).contains(&slave_id) {
            return Err(ProtocolError::InvalidSlave(slave_id));
        }
        self.unit_id = slave_id;
        Ok(())
    }

    fn read_coils(&mut self, address: u16, count: u16) -> Result<Vec<u16>, ProtocolError> {
        let mut request = self.request();
        let mut raw = Vec::with_capacity(12);
        request.generate_get_coils(address, count, &mut raw)?;
        let response = self.exchange(&raw)?;
        request.parse_ok(&response)?;
        Ok(decode_bits(&response, count))
    }

    fn read_discrete_inputs(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        let mut request = self.request();
        let mut raw = Vec::with_capacity(12);
        request.generate_get_discretes(address, count, &mut raw)?;
        let response = self.exchange(&raw)?;
        request.parse_ok(&response)?;
        Ok(decode_bits(&response, count))
    }

    fn read_input_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        let mut request = self.request();
        let mut raw = Vec::with_capacity(12);
        request.generate_get_inputs(address, count, &mut raw)?;
        let response = self.exchange(&raw)?;
        request.parse_ok(&response)?;
        Ok(decode_words(&response))
    }

    fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        let mut request = self.request();
        let mut raw = Vec::with_capacity(12);
        request.generate_get_holdings(address, count, &mut raw)?;
        let response = self.exchange(&raw)?;
        request.parse_ok(&response)?;
        Ok(decode_words(&response))
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            log::info!("connection to {}:{} closed", self.host, self.port);
        }
    }
}

/// Decode big-endian 16-bit words from a register read response.
fn decode_words(response: &[u8]) -> Vec<u16> {
    response[DATA_OFFSET..]
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Decode packed bits from a coil or discrete input read response into 0/1
/// words. The first bit is the LSB of the first data byte; the trailing
/// pad bits of the last byte are dropped.
fn decode_bits(response: &[u8], count: u16) -> Vec<u16> {
    let mut values = response[DATA_OFFSET..]
        .iter()
        .flat_map(|byte| (0..8).map(move |bit| u16::from(byte >> bit & 1)))
        .collect::<Vec<u16>>();
    values.truncate(count as usize);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    // MBAP: transaction 1, protocol 0, length = unit + PDU.
    fn tcp_frame(unit: u8, pdu: &[u8]) -> Vec<u8> {
        let length = (1 + pdu.len()) as u16;
        let mut frame = vec![0x00, 0x01, 0x00, 0x00, (length >> 8) as u8, length as u8, unit];
        frame.extend_from_slice(pdu);
        frame
    }

    #[test]
    fn decodes_register_words_big_endian() {
        let response = tcp_frame(1, &[0x03, 0x06, 0x00, 0x0A, 0x00, 0x14, 0x00, 0x1E]);
        assert_eq!(decode_words(&response), vec![10, 20, 30]);
    }

    #[test]
    fn decodes_packed_bits_lsb_first() {
        // 0b0000_0101: coils at offsets 0 and 2 are on.
        let response = tcp_frame(1, &[0x01, 0x01, 0x05]);
        assert_eq!(decode_bits(&response, 3), vec![1, 0, 1]);
    }

    #[test]
    fn drops_pad_bits_beyond_the_requested_count() {
        let response = tcp_frame(1, &[0x01, 0x01, 0xFF]);
        assert_eq!(decode_bits(&response, 2), vec![1, 1]);
    }

    #[test]
    fn rejects_out_of_range_targets() {
        let mut client = TcpClient::new("127.0.0.1", 502);
        assert!(matches!(
            client.set_target(0),
            Err(ProtocolError::InvalidSlave(0))
        ));
        assert!(matches!(
            client.set_target(248),
            Err(ProtocolError::InvalidSlave(248))
        ));
        assert!(client.set_target(247).is_ok());
    }

    #[test]
    fn close_is_idempotent_without_a_connection() {
        let mut client = TcpClient::new("127.0.0.1", 502);
        client.close();
        client.close();
    }

    #[test]
    fn reads_require_a_connection() {
        let mut client = TcpClient::new("127.0.0.1", 502);
        assert!(matches!(
            client.read_holding_registers(0, 1),
            Err(ProtocolError::NotConnected)
        ));
    }
}
