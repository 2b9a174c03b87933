use std::io::{self, Stdout};

use anyhow::{Context, Result};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::{ui, TerminalLayout, TerminalSurface};

/// Dashboard surface backed by crossterm raw mode and a ratatui terminal.
///
/// Panel contents are buffered so every flush redraws the full frame and a
/// rebuild after a resize restores the screen from the buffer alone.
pub struct CrosstermSurface {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    info: Vec<(&'static str, String)>,
    rows: Vec<String>,
}

impl CrosstermSurface {
    pub fn new() -> Self {
        Self {
            terminal: None,
            info: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl Default for CrosstermSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface for CrosstermSurface {
    fn open(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        crossterm::execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide
        )?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        self.terminal = Some(terminal);
        Ok(())
    }

    fn draw_info(&mut self, fields: &[(&'static str, String)]) -> Result<()> {
        self.info = fields.to_vec();
        Ok(())
    }

    fn draw_data_row(&mut self, row: usize, text: &str) -> Result<()> {
        if self.rows.len() <= row {
            self.rows.resize(row + 1, String::new());
        }
        self.rows[row] = text.to_string();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let Self {
            terminal,
            info,
            rows,
        } = self;
        let terminal = terminal.as_mut().context("terminal surface is not open")?;
        terminal.draw(|f| ui::render(f, info, rows))?;
        Ok(())
    }

    fn rebuild(&mut self, layout: TerminalLayout) -> Result<()> {
        let Self {
            terminal,
            info,
            rows,
        } = self;
        let terminal = terminal.as_mut().context("terminal surface is not open")?;
        // ratatui picks the new size up on the next draw; the clear drops
        // whatever the resize left on screen.
        log::debug!(
            "rebuilding panels: {}x{} ({} data rows)",
            layout.columns,
            layout.info_rows + layout.data_rows,
            layout.data_rows
        );
        terminal.clear()?;
        terminal.draw(|f| ui::render(f, info, rows))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Idempotent: the first call tears the terminal down, later calls
        // see nothing left to do.
        if self.terminal.take().is_some() {
            crossterm::terminal::disable_raw_mode()?;
            crossterm::execute!(
                io::stdout(),
                crossterm::terminal::LeaveAlternateScreen,
                crossterm::cursor::Show
            )?;
        }
        Ok(())
    }
}
