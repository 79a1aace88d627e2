//! Entries, probe results, and the write-once result slots shared between
//! probe workers and the renderer.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;

/// One folder to probe.
///
/// `display_name` already carries the nesting marker for folders reached
/// through a nested root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    #[serde(rename = "name")]
    pub display_name: String,
    pub path: PathBuf,
}

impl Entry {
    pub fn new(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
        }
    }
}

/// Everything the probe learned about a working tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoInfo {
    /// `None` when HEAD could not be read; `"HEAD"` when detached.
    pub branch: Option<String>,
    pub is_clean: Option<bool>,
    pub origin_url: Option<String>,
    pub upstream_ref: Option<String>,
    /// Commits only on the local branch.
    pub ahead_count: Option<u32>,
    /// Commits only on the upstream ref.
    pub behind_count: Option<u32>,
    pub error: Option<String>,
}

impl RepoInfo {
    pub fn is_detached(&self) -> bool {
        self.branch.as_deref() == Some("HEAD")
    }

    /// Both divergence counts, when the upstream query succeeded.
    pub fn divergence(&self) -> Option<(u32, u32)> {
        self.ahead_count.zip(self.behind_count)
    }
}

/// Terminal result of probing one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RepoStatus {
    NotRepository,
    ProbeFailed { message: String },
    Repo(RepoInfo),
}

impl RepoStatus {
    pub fn repo(&self) -> Option<&RepoInfo> {
        match self {
            RepoStatus::Repo(info) => Some(info),
            _ => None,
        }
    }
}

/// One write-once slot per entry, indexed by the entry's position in the
/// scan list.
///
/// Readers see either "unresolved" (`None`) or a complete `RepoStatus`.
#[derive(Debug)]
pub struct ResultSlots {
    slots: Box<[OnceLock<RepoStatus>]>,
}

impl ResultSlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&RepoStatus> {
        self.slots.get(idx).and_then(OnceLock::get)
    }

    /// Store the result for `idx`. Returns `false` if the slot was already
    /// filled or out of range; the first value wins.
    pub fn fill(&self, idx: usize, status: RepoStatus) -> bool {
        match self.slots.get(idx) {
            Some(slot) => slot.set(status).is_ok(),
            None => false,
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&RepoStatus>> {
        self.slots.iter().map(OnceLock::get)
    }
}
