//! Linear undo/redo over filter-tree snapshots.
//!
//! Snapshots share unchanged subtrees with each other (see [`crate::tree`]),
//! so keeping many of them is cheap.

use crate::tree::FilterGroup;
use tracing::debug;

/// An ordered list of snapshots plus a cursor.
///
/// The cursor is `None` only while the history is empty. Recording while the
/// cursor is not at the tail discards every snapshot after it first.
#[derive(Debug, Clone, Default)]
pub struct FilterHistory {
    entries: Vec<FilterGroup>,
    position: Option<usize>,
    /// Maximum number of snapshots kept; the oldest are dropped first.
    limit: Option<usize>,
}

impl FilterHistory {
    /// An unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that keeps at most `limit` snapshots (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Record `tree` as the newest snapshot.
    ///
    /// A tree structurally equal to the current snapshot is ignored. Returns
    /// whether a snapshot was appended.
    pub fn record(&mut self, tree: FilterGroup) -> bool {
        if self.current() == Some(&tree) {
            return false;
        }

        let keep = self.position.map_or(0, |p| p + 1);
        if keep < self.entries.len() {
            debug!(
                discarded = self.entries.len() - keep,
                "history branch truncated"
            );
            self.entries.truncate(keep);
        }
        self.entries.push(tree);

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let overflow = self.entries.len() - limit;
                self.entries.drain(..overflow);
            }
        }
        self.position = Some(self.entries.len() - 1);
        true
    }

    /// Step back one snapshot. No-op (returns `None`) at the oldest entry.
    pub fn go_back(&mut self) -> Option<&FilterGroup> {
        match self.position {
            Some(p) if p > 0 => {
                self.position = Some(p - 1);
                self.entries.get(p - 1)
            }
            _ => None,
        }
    }

    /// Step forward one snapshot. No-op (returns `None`) at the newest entry.
    pub fn go_forward(&mut self) -> Option<&FilterGroup> {
        match self.position {
            Some(p) if p + 1 < self.entries.len() => {
                self.position = Some(p + 1);
                self.entries.get(p + 1)
            }
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&FilterGroup> {
        self.position.and_then(|p| self.entries.get(p))
    }

    pub fn can_go_back(&self) -> bool {
        self.position.is_some_and(|p| p > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.position.is_some_and(|p| p + 1 < self.entries.len())
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FilterGroup] {
        &self.entries
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = None;
    }
}
