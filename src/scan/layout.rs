//! Column layout for the scan table.
//!
//! Widths are fixed before the first frame: the name column from the full
//! entry list, every status column from the set of labels it can ever show.
//! Rows then never shift as results arrive.

use strum::IntoStaticStr;
use unicode_width::UnicodeWidthStr;

use super::{Entry, ResultSlots};

/// Gap between columns.
pub const COLUMN_GAP: &str = "  ";

/// Fixed status labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Label {
    Pending,
    NotInit,
    Unknown,
    Detached,
    Clean,
    Dirty,
    Origin,
    NoRemote,
    InSync,
    NoUpstream,
    Error,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn width(self) -> usize {
        self.as_str().width()
    }
}

/// Labels that can appear in the branch column besides a branch name.
pub const BRANCH_LABELS: &[Label] = &[
    Label::Pending,
    Label::NotInit,
    Label::Unknown,
    Label::Detached,
];

pub const CLEAN_LABELS: &[Label] = &[Label::Clean, Label::Dirty, Label::Unknown];

pub const REMOTE_LABELS: &[Label] = &[Label::Origin, Label::NoRemote];

/// Fixed labels of the sync column; divergence counts render as free text.
pub const SYNC_LABELS: &[Label] = &[
    Label::InSync,
    Label::NoUpstream,
    Label::Unknown,
    Label::Error,
];

fn max_label_width(labels: &[Label]) -> usize {
    labels.iter().map(|label| label.width()).max().unwrap_or(0)
}

/// Column widths plus the options that shape each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name: usize,
    pub branch: usize,
    pub clean: usize,
    pub remote: usize,
    /// Show the remote-presence and sync columns.
    pub extended: bool,
    /// Rows are cut to this many columns (terminal width) when set.
    pub max_width: Option<usize>,
}

impl ColumnLayout {
    pub fn new(entries: &[Entry], extended: bool) -> Self {
        let name = entries
            .iter()
            .map(|entry| entry.display_name.width())
            .max()
            .unwrap_or(0);
        Self {
            name,
            branch: max_label_width(BRANCH_LABELS),
            clean: max_label_width(CLEAN_LABELS),
            remote: max_label_width(REMOTE_LABELS),
            extended,
            max_width: None,
        }
    }

    /// Widen the branch column to fit resolved branch names.
    ///
    /// Only for a single static print, where every result is known before
    /// the layout is used.
    pub fn fit_branches(mut self, slots: &ResultSlots) -> Self {
        let widest = slots
            .iter()
            .flatten()
            .filter_map(|status| status.repo())
            .filter(|info| !info.is_detached())
            .filter_map(|info| info.branch.as_deref())
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0);
        self.branch = self.branch.max(widest);
        self
    }

    pub fn with_max_width(mut self, max_width: Option<usize>) -> Self {
        self.max_width = max_width;
        self
    }
}
