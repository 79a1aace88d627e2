//! Live table block redrawn in place with crossterm cursor control.
//!
//! Every frame rewrites the whole block: move up over the previous frame,
//! clear from there down, print all rows, flush once. A frame is queued in
//! full before the flush, so an interrupt between frames never leaves a
//! half-erased block.

use std::io::Write;

use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    queue,
    terminal::{Clear, ClearType},
};

pub struct LiveTable<W: Write> {
    out: W,
    /// Lines printed by the previous frame
    line_count: usize,
}

impl<W: Write> LiveTable<W> {
    pub fn new(out: W) -> Self {
        Self { out, line_count: 0 }
    }

    /// Replace the previous frame with `lines`.
    ///
    /// Each line must fit the terminal width; a wrapped line would make the
    /// next erase stop short.
    pub fn draw(&mut self, lines: &[String]) -> std::io::Result<()> {
        if self.line_count > 0 {
            let up = u16::try_from(self.line_count).unwrap_or(u16::MAX);
            queue!(
                self.out,
                MoveUp(up),
                MoveToColumn(0),
                Clear(ClearType::FromCursorDown)
            )?;
        }
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.line_count = lines.len();
        self.out.flush()
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
