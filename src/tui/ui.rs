//! Rendering glue: turn the buffered panel state into one ratatui frame.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::cli::config::PollConfig;
use crate::tui::{DATA_FIRST_ROW, INFO_PANEL_HEIGHT};

/// Data panel header, always the first inner line.
pub const DATA_HEADER: &str = "Polling slave... (press q or Ctrl-C to stop)";

/// Label/value pairs for the info panel.
pub fn info_fields(config: &PollConfig, status: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Connection", config.transport.label().to_string()),
        (
            "Slave",
            format!(
                "address = {}, start reference = {}, count = {}",
                config.slave_id, config.start_reference, config.count
            ),
        ),
        (
            "Communication",
            format!(
                "{}, port {}, poll rate {} ms",
                config.host,
                config.port,
                config.poll_interval.as_millis()
            ),
        ),
        ("Data type", config.register_kind.label().to_string()),
        ("Status", status.to_string()),
    ]
}

/// Inner lines of the data panel: header, spacer, then the buffered rows.
/// `rows` is indexed by absolute panel row (0 = top border), so inner line
/// `n` shows `rows[n + 1]`.
pub fn data_panel_lines(rows: &[String]) -> Vec<String> {
    let mut lines = vec![DATA_HEADER.to_string(), String::new()];
    lines.extend(rows.iter().skip(DATA_FIRST_ROW).cloned());
    lines
}

/// Render both panels into the frame.
pub fn render(f: &mut Frame, info: &[(&'static str, String)], rows: &[String]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(INFO_PANEL_HEIGHT), Constraint::Min(0)])
        .split(f.area());

    let info_lines: Vec<Line> = info
        .iter()
        .map(|(label, value)| Line::from(format!("{:<16}{value}", format!("{label}:"))))
        .collect();
    f.render_widget(
        Paragraph::new(info_lines).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let data_lines: Vec<Line> = data_panel_lines(rows).into_iter().map(Line::from).collect();
    f.render_widget(
        Paragraph::new(data_lines).block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::{RegisterKind, Transport};
    use std::time::Duration;

    fn sample_config() -> PollConfig {
        PollConfig {
            transport: Transport::Tcp,
            host: "192.168.0.10".to_string(),
            port: 502,
            slave_id: 1,
            start_reference: 100,
            count: 3,
            register_kind: RegisterKind::HoldingRegisters,
            poll_interval: Duration::from_millis(1000),
        }
    }

    #[test]
    fn info_fields_describe_the_session() {
        let fields = info_fields(&sample_config(), "7 polls");
        assert_eq!(fields[0], ("Connection", "Modbus TCP/IP".to_string()));
        assert_eq!(
            fields[1].1,
            "address = 1, start reference = 100, count = 3"
        );
        assert_eq!(fields[2].1, "192.168.0.10, port 502, poll rate 1000 ms");
        assert_eq!(fields[3].1, "16-bit holding register");
        assert_eq!(fields[4], ("Status", "7 polls".to_string()));
    }

    #[test]
    fn header_and_spacer_precede_data_rows() {
        let mut rows = vec![String::new(); DATA_FIRST_ROW + 2];
        rows[DATA_FIRST_ROW] = "[100]: 10".to_string();
        rows[DATA_FIRST_ROW + 1] = "[101]: 20".to_string();

        let lines = data_panel_lines(&rows);
        assert_eq!(lines[0], DATA_HEADER);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "[100]: 10");
        assert_eq!(lines[3], "[101]: 20");
    }

    #[test]
    fn empty_buffer_still_shows_the_header() {
        let lines = data_panel_lines(&[]);
        assert_eq!(lines, vec![DATA_HEADER.to_string(), String::new()]);
    }
}
