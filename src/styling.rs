//! Consolidated styling module for terminal output.
//!
//! This module uses the anstyle ecosystem:
//! - anstream for auto-detecting color support
//! - anstyle for composable styling
//! - Semantic style constants for the scan table

use anstyle::{AnsiColor, Color, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// ============================================================================
// Re-exports from anstream (auto-detecting output)
// ============================================================================

/// Auto-detecting println that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::println;

/// Auto-detecting eprintln that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::eprintln;

// ============================================================================
// Semantic Style Constants
// ============================================================================

/// Error style (red) - use as `{ERROR}text{ERROR:#}`
pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Warning style (yellow) - use as `{WARNING}text{WARNING:#}`
pub const WARNING: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Hint style (dimmed) - use as `{HINT}text{HINT:#}`
pub const HINT: Style = Style::new().dimmed();

/// Placeholder for rows whose probe has not finished
pub const PENDING: Style = Style::new().dimmed();

/// Branch names and the detached marker
pub const BRANCH: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));

/// Clean working tree, in-sync upstream
pub const GOOD: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

/// Dirty tree, missing remote, behind upstream, probe errors
pub const BAD: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Unknown values, plain folders, missing upstream, ahead-only divergence
pub const CAUTION: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Configured origin remote
pub const REMOTE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));

// ============================================================================
// Message Emojis
// ============================================================================

/// Error emoji - use with ERROR style: `eprintln!("{ERROR_EMOJI} {ERROR}message{ERROR:#}");`
pub const ERROR_EMOJI: &str = "❌";

/// Warning emoji - use with WARNING style: `eprintln!("{WARNING_EMOJI} {WARNING}message{WARNING:#}");`
pub const WARNING_EMOJI: &str = "🟡";

/// Info symbol for the summary footer
pub const INFO_SYMBOL: &str = "○";

pub fn error_message(msg: impl std::fmt::Display) -> String {
    format!("{ERROR_EMOJI} {ERROR}{msg}{ERROR:#}")
}

pub fn warning_message(msg: impl std::fmt::Display) -> String {
    format!("{WARNING_EMOJI} {WARNING}{msg}{WARNING:#}")
}

// ============================================================================
// Styled Output Types
// ============================================================================

/// A piece of text with an optional style
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledString {
    pub text: String,
    pub style: Option<Style>,
}

impl StyledString {
    pub fn new(text: impl Into<String>, style: Option<Style>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self::new(text, Some(style))
    }

    /// Returns the visual width (unicode-aware, no ANSI codes)
    pub fn width(&self) -> usize {
        self.text.width()
    }

    /// Renders to a string with ANSI escape codes
    pub fn render(&self) -> String {
        if let Some(style) = &self.style {
            format!("{}{}{}", style.render(), self.text, style.render_reset())
        } else {
            self.text.clone()
        }
    }
}

/// A line composed of multiple styled strings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub segments: Vec<StyledString>,
}

impl StyledLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw (unstyled) segment
    pub fn push_raw(&mut self, text: impl Into<String>) {
        self.segments.push(StyledString::raw(text));
    }

    /// Add a styled segment
    pub fn push_styled(&mut self, text: impl Into<String>, style: Style) {
        self.segments.push(StyledString::styled(text, style));
    }

    /// Add a segment (StyledString)
    pub fn push(&mut self, segment: StyledString) {
        self.segments.push(segment);
    }

    /// Pad with spaces to reach a specific width
    pub fn pad_to(&mut self, target_width: usize) {
        let current_width = self.width();
        if current_width < target_width {
            self.push_raw(" ".repeat(target_width - current_width));
        }
    }

    /// Returns the total visual width
    pub fn width(&self) -> usize {
        self.segments.iter().map(|s| s.width()).sum()
    }

    /// Drop trailing whitespace-only width from the end of the line.
    pub fn trim_end(&mut self) {
        while let Some(last) = self.segments.last_mut() {
            let trimmed_len = last.text.trim_end().len();
            if trimmed_len == 0 {
                self.segments.pop();
                continue;
            }
            last.text.truncate(trimmed_len);
            break;
        }
    }

    /// Truncate to at most `max_width` visible columns, keeping segment styles.
    ///
    /// Wide characters that would straddle the limit are dropped.
    pub fn truncate_to(&mut self, max_width: usize) {
        let mut remaining = max_width;
        let mut kept = Vec::with_capacity(self.segments.len());
        for segment in self.segments.drain(..) {
            if remaining == 0 {
                break;
            }
            let width = segment.width();
            if width <= remaining {
                remaining -= width;
                kept.push(segment);
                continue;
            }
            let mut text = String::new();
            for ch in segment.text.chars() {
                let w = ch.width().unwrap_or(0);
                if w > remaining {
                    break;
                }
                remaining -= w;
                text.push(ch);
            }
            kept.push(StyledString::new(text, segment.style));
            remaining = 0;
        }
        self.segments = kept;
    }

    /// Renders the entire line with ANSI escape codes
    pub fn render(&self) -> String {
        self.segments.iter().map(|s| s.render()).collect()
    }

    /// Renders the line without any escape codes
    pub fn render_plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
