//! Row formatting for the scan table.

use anstyle::Style;

use super::layout::{COLUMN_GAP, ColumnLayout, Label};
use super::{Entry, RepoInfo, RepoStatus, ResultSlots};
use crate::styling::{BAD, BRANCH, CAUTION, GOOD, PENDING, REMOTE, StyledLine, StyledString};

/// Status cells of one row; `None` renders blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub branch: Option<StyledString>,
    pub clean: Option<StyledString>,
    pub remote: Option<StyledString>,
    pub sync: Option<StyledString>,
}

fn label(label: Label, style: Style) -> Option<StyledString> {
    Some(StyledString::styled(label.as_str(), style))
}

impl RowCells {
    /// Cells for a slot: unresolved when `status` is `None`.
    pub fn for_status(status: Option<&RepoStatus>) -> Self {
        match status {
            None => Self {
                branch: label(Label::Pending, PENDING),
                ..Self::default()
            },
            Some(RepoStatus::NotRepository) => Self {
                branch: label(Label::NotInit, CAUTION),
                ..Self::default()
            },
            Some(RepoStatus::ProbeFailed { .. }) => Self {
                branch: label(Label::Unknown, CAUTION),
                clean: label(Label::Unknown, CAUTION),
                remote: None,
                sync: label(Label::Error, BAD),
            },
            Some(RepoStatus::Repo(info)) => Self::for_repo(info),
        }
    }

    fn for_repo(info: &RepoInfo) -> Self {
        let branch = match info.branch.as_deref() {
            None => label(Label::Unknown, BRANCH),
            Some("HEAD") => label(Label::Detached, BRANCH),
            Some(name) => Some(StyledString::styled(name, BRANCH)),
        };
        let clean = match info.is_clean {
            Some(true) => label(Label::Clean, GOOD),
            Some(false) => label(Label::Dirty, BAD),
            None => label(Label::Unknown, CAUTION),
        };
        let remote = if info.origin_url.is_some() {
            label(Label::Origin, REMOTE)
        } else {
            label(Label::NoRemote, BAD)
        };
        Self {
            branch,
            clean,
            remote,
            sync: Some(sync_cell(info)),
        }
    }
}

/// Sync column text for a repository.
///
/// A probe error wins over everything else; otherwise the upstream and the
/// divergence counts decide.
pub fn sync_cell(info: &RepoInfo) -> StyledString {
    if info.error.is_some() {
        return StyledString::styled(Label::Error.as_str(), BAD);
    }
    if info.upstream_ref.is_none() {
        return StyledString::styled(Label::NoUpstream.as_str(), CAUTION);
    }
    match info.divergence() {
        None => StyledString::styled(Label::Unknown.as_str(), CAUTION),
        Some((0, 0)) => StyledString::styled(Label::InSync.as_str(), GOOD),
        Some((ahead, behind)) => {
            let mut parts = Vec::with_capacity(2);
            if ahead > 0 {
                parts.push(format!("ahead {ahead}"));
            }
            if behind > 0 {
                parts.push(format!("behind {behind}"));
            }
            let style = if behind > 0 { BAD } else { CAUTION };
            StyledString::styled(parts.join(", "), style)
        }
    }
}

fn push_cell(line: &mut StyledLine, cell: Option<StyledString>, width: usize) {
    line.push_raw(COLUMN_GAP);
    let start = line.width();
    if let Some(cell) = cell {
        line.push(cell);
    }
    line.pad_to(start + width);
}

/// Format one row: name, then the status columns the layout enables.
pub fn format_row(layout: &ColumnLayout, entry: &Entry, status: Option<&RepoStatus>) -> StyledLine {
    let cells = RowCells::for_status(status);

    let mut line = StyledLine::new();
    line.push_raw(entry.display_name.as_str());
    line.pad_to(layout.name);
    push_cell(&mut line, cells.branch, layout.branch);
    push_cell(&mut line, cells.clean, layout.clean);
    if layout.extended {
        push_cell(&mut line, cells.remote, layout.remote);
        push_cell(&mut line, cells.sync, 0);
    }
    line.trim_end();
    if let Some(max_width) = layout.max_width {
        line.truncate_to(max_width);
    }
    line
}

/// Render every row in scan-list order.
pub fn render_lines(
    layout: &ColumnLayout,
    entries: &[Entry],
    slots: &ResultSlots,
    use_color: bool,
) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let line = format_row(layout, entry, slots.get(idx));
            if use_color {
                line.render()
            } else {
                line.render_plain()
            }
        })
        .collect()
}
