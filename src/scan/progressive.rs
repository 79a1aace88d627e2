use std::io::IsTerminal;

use anstream::{AutoStream, ColorChoice};

/// What we know about stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalInfo {
    pub is_tty: bool,
    /// Emit ANSI styles (respects NO_COLOR and CLICOLOR_FORCE).
    pub color: bool,
    pub width: Option<usize>,
    pub height: Option<usize>,
}

impl TerminalInfo {
    pub fn detect() -> Self {
        let stdout = std::io::stdout();
        let is_tty = stdout.is_terminal();
        let color = AutoStream::choice(&stdout) != ColorChoice::Never;

        // terminal_size() falls back to stderr/stdin, so it can return Some
        // even for piped stdout. Only trust it when stdout is the terminal.
        let (width, height) = if is_tty {
            terminal_size::terminal_size()
                .map(|(w, h)| (Some(w.0 as usize), Some(h.0 as usize)))
                .unwrap_or((None, None))
        } else {
            (None, None)
        };

        Self {
            is_tty,
            color,
            width,
            height,
        }
    }
}

/// Rendering mode for the scan table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Wait for every probe, then print the table once
    Static,
    /// Print pending rows immediately and redraw the block on each result
    Live,
}

impl RenderMode {
    /// Pick the mode for a table of `rows` lines.
    ///
    /// `live_allowed` is false for `--no-progressive`, JSON output, and when
    /// log lines may interleave with the table. Live redraw also needs stdout
    /// to be a terminal tall enough to hold the whole block, since rows that
    /// scroll off the top can no longer be erased.
    pub fn detect(live_allowed: bool, terminal: &TerminalInfo, rows: usize) -> Self {
        if !live_allowed || !terminal.is_tty || rows == 0 {
            return RenderMode::Static;
        }
        match terminal.height {
            // Keep one line free for the cursor below the block
            Some(height) if rows >= height => {
                log::debug!("{rows} rows do not fit a {height}-line terminal; printing once");
                RenderMode::Static
            }
            _ => RenderMode::Live,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tty(height: Option<usize>) -> TerminalInfo {
        TerminalInfo {
            is_tty: true,
            color: true,
            width: Some(80),
            height,
        }
    }

    #[test]
    fn test_live_on_terminal() {
        assert_eq!(RenderMode::detect(true, &tty(Some(40)), 10), RenderMode::Live);
        assert_eq!(RenderMode::detect(true, &tty(None), 10), RenderMode::Live);
    }

    #[test]
    fn test_static_when_not_allowed_or_piped() {
        assert_eq!(
            RenderMode::detect(false, &tty(Some(40)), 10),
            RenderMode::Static
        );

        let piped = TerminalInfo {
            is_tty: false,
            color: false,
            width: None,
            height: None,
        };
        assert_eq!(RenderMode::detect(true, &piped, 10), RenderMode::Static);
    }

    #[test]
    fn test_static_when_block_does_not_fit() {
        assert_eq!(RenderMode::detect(true, &tty(Some(10)), 10), RenderMode::Static);
        assert_eq!(RenderMode::detect(true, &tty(Some(11)), 10), RenderMode::Live);
    }

    #[test]
    fn test_static_for_empty_table() {
        assert_eq!(RenderMode::detect(true, &tty(Some(40)), 0), RenderMode::Static);
    }
}
