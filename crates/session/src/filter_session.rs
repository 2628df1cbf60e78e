//! Filter session built on Casegraph.
//!
//! A [`FilterSession`] owns everything a single analyst works with: the live
//! advanced filter, its undo/redo history and a table of saved filters. Front
//! ends hold one session and pass it by reference; nothing here is global.
//!
//! # Usage
//!
//! ```rust
//! use casegraph::{FilterCondition, FilterOperator};
//! use casegraph_session::{FilterSession, SessionConfig};
//!
//! let mut session = FilterSession::new(SessionConfig::default()).unwrap();
//! let root = session.new_filter().id.clone();
//!
//! session
//!     .add_condition(&root, FilterCondition::attribute("risk", FilterOperator::GreaterThan, 0.7))
//!     .unwrap();
//! let saved = session.save_current("High risk", None, Some("triage")).unwrap().id.clone();
//!
//! session.undo();
//! assert!(session.current().unwrap().is_empty());
//! assert_eq!(session.saved(&saved).unwrap().filter.node_count(), 2);
//! ```

use casegraph::{
    apply_advanced, apply_filters, create_group, diff, evaluate_group, export_to_json,
    import_from_json, BasicFilter, Dataset, FilterCondition, FilterDifference, FilterGroup,
    FilterHistory, FilteredDataset, GroupOperator, NodeId, Record,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

pub use casegraph::FilterError as Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable read by [`SessionConfig::from_env`].
pub const HISTORY_LIMIT_ENV: &str = "CASEGRAPH_HISTORY_LIMIT";

const DEFAULT_HISTORY_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Maximum number of history snapshots; `None` keeps every one.
    pub history_limit: Option<usize>,
    /// Whether loading a saved filter or importing JSON is undoable.
    pub record_on_load: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            record_on_load: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == Some(0) {
            return Err(Error::InvalidConfig(
                "history_limit must be at least 1 (use None for unbounded)".into(),
            ));
        }
        Ok(())
    }

    /// Defaults overlaid with `CASEGRAPH_HISTORY_LIMIT` when it is set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(HISTORY_LIMIT_ENV) {
            config.history_limit = parse_history_limit(&raw)?;
        }
        config.validate()?;
        Ok(config)
    }
}

/// `"none"` or `"unbounded"` lift the cap; anything else must be a positive
/// integer.
pub fn parse_history_limit(raw: &str) -> Result<Option<usize>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(Error::InvalidConfig(format!(
            "{HISTORY_LIMIT_ENV} must be a positive integer or `none`, got `{raw}`"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Saved filters
// ---------------------------------------------------------------------------

/// A named copy of an advanced filter.
///
/// The wrapped tree is a snapshot: editing the live filter afterwards never
/// changes it. Serialized, this is also the export envelope understood by
/// [`import_from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub filter: FilterGroup,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields to change on a saved filter; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedFilterUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub filter: Option<FilterGroup>,
}

// ---------------------------------------------------------------------------
// FilterSession
// ---------------------------------------------------------------------------

/// The live filter, its history and the saved-filter table.
#[derive(Debug, Clone)]
pub struct FilterSession {
    config: SessionConfig,
    current: Option<FilterGroup>,
    history: FilterHistory,
    saved: Vec<SavedFilter>,
}

impl Default for FilterSession {
    fn default() -> Self {
        Self::with_valid_config(SessionConfig::default())
    }
}

impl FilterSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: SessionConfig) -> Self {
        let history = match config.history_limit {
            Some(limit) => FilterHistory::with_limit(limit),
            None => FilterHistory::new(),
        };
        Self {
            config,
            current: None,
            history,
            saved: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The live advanced filter, if one is set.
    pub fn current(&self) -> Option<&FilterGroup> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &FilterHistory {
        &self.history
    }

    /// Replace the live filter and record it in history.
    pub fn set_filter(&mut self, tree: FilterGroup) -> &FilterGroup {
        self.commit(tree, true)
    }

    /// Start over with a fresh, empty AND root.
    pub fn new_filter(&mut self) -> &FilterGroup {
        self.set_filter(create_group())
    }

    /// Drop the live filter and forget its history. Saved filters stay.
    pub fn clear(&mut self) {
        self.current = None;
        self.history.clear();
    }

    fn commit(&mut self, tree: FilterGroup, record: bool) -> &FilterGroup {
        if record {
            self.history.record(tree.clone());
        }
        self.current.insert(tree)
    }

    fn live(&self) -> Result<&FilterGroup> {
        self.current.as_ref().ok_or(Error::NoActiveFilter)
    }

    fn edit<F>(&mut self, update: F) -> Result<&FilterGroup>
    where
        F: FnOnce(&FilterGroup) -> FilterGroup,
    {
        let next = update(self.live()?);
        Ok(self.commit(next, true))
    }

    // -- tree edits ---------------------------------------------------------

    /// Append `condition` to group `parent`. An unknown parent leaves the
    /// tree unchanged.
    pub fn add_condition(
        &mut self,
        parent: &NodeId,
        condition: FilterCondition,
    ) -> Result<&FilterGroup> {
        self.edit(|tree| tree.add_item(parent, condition))
    }

    /// Append `group` (typically empty, from [`create_group`]) to `parent`.
    pub fn add_group(&mut self, parent: &NodeId, group: FilterGroup) -> Result<&FilterGroup> {
        self.edit(|tree| tree.add_item(parent, group))
    }

    pub fn update_condition<F>(&mut self, id: &NodeId, update: F) -> Result<&FilterGroup>
    where
        F: FnOnce(&FilterCondition) -> FilterCondition,
    {
        self.edit(|tree| tree.update_condition(id, update))
    }

    pub fn update_group<F>(&mut self, id: &NodeId, update: F) -> Result<&FilterGroup>
    where
        F: FnOnce(&FilterGroup) -> FilterGroup,
    {
        self.edit(|tree| tree.update_group(id, update))
    }

    pub fn set_group_operator(
        &mut self,
        id: &NodeId,
        operator: GroupOperator,
    ) -> Result<&FilterGroup> {
        self.edit(|tree| tree.set_group_operator(id, operator))
    }

    pub fn remove_item(&mut self, id: &NodeId) -> Result<&FilterGroup> {
        self.edit(|tree| tree.remove_item(id))
    }

    // -- undo / redo ----------------------------------------------------------

    /// Step back one snapshot; `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&FilterGroup> {
        let tree = self.history.go_back()?.clone();
        Some(&*self.current.insert(tree))
    }

    /// Step forward one snapshot; `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<&FilterGroup> {
        let tree = self.history.go_forward()?.clone();
        Some(&*self.current.insert(tree))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_go_forward()
    }

    // -- saved filters ------------------------------------------------------

    /// Save a copy of the live filter under `name`.
    pub fn save_current(
        &mut self,
        name: &str,
        description: Option<&str>,
        category: Option<&str>,
    ) -> Result<&SavedFilter> {
        let filter = self.live()?.clone();
        let now = Utc::now();
        let saved = SavedFilter {
            id: Ulid::new().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            category: category.map(str::to_string),
            filter,
            created_at: now,
            updated_at: now,
        };
        debug!(id = %saved.id, name = %saved.name, "saved filter created");
        let id = saved.id.clone();
        self.saved.push(saved);
        self.saved.last().ok_or_else(|| unknown_saved(&id))
    }

    pub fn update_saved(&mut self, id: &str, update: SavedFilterUpdate) -> Result<&SavedFilter> {
        let saved = self
            .saved
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| unknown_saved(id))?;
        if let Some(name) = update.name {
            saved.name = name;
        }
        if let Some(description) = update.description {
            saved.description = Some(description);
        }
        if let Some(category) = update.category {
            saved.category = Some(category);
        }
        if let Some(filter) = update.filter {
            saved.filter = filter;
        }
        saved.updated_at = Utc::now();
        debug!(id, "saved filter updated");
        Ok(&*saved)
    }

    /// Replace the tree of saved filter `id` with a copy of the live one.
    pub fn overwrite_saved(&mut self, id: &str) -> Result<&SavedFilter> {
        let filter = self.live()?.clone();
        self.update_saved(
            id,
            SavedFilterUpdate {
                filter: Some(filter),
                ..SavedFilterUpdate::default()
            },
        )
    }

    pub fn delete_saved(&mut self, id: &str) -> Result<SavedFilter> {
        let index = self.saved_index(id)?;
        debug!(id, "saved filter deleted");
        Ok(self.saved.remove(index))
    }

    pub fn saved(&self, id: &str) -> Option<&SavedFilter> {
        self.saved.iter().find(|s| s.id == id)
    }

    /// Saved filters in creation order.
    pub fn list_saved(&self) -> &[SavedFilter] {
        &self.saved
    }

    /// Make a copy of saved filter `id` the live filter.
    pub fn load_saved(&mut self, id: &str) -> Result<&FilterGroup> {
        let filter = self.saved_entry(id)?.filter.clone();
        let record = self.config.record_on_load;
        Ok(self.commit(filter, record))
    }

    fn saved_index(&self, id: &str) -> Result<usize> {
        self.saved
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| unknown_saved(id))
    }

    fn saved_entry(&self, id: &str) -> Result<&SavedFilter> {
        self.saved
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| unknown_saved(id))
    }

    // -- comparison -----------------------------------------------------------

    /// Differences that turn saved filter `a` into saved filter `b`.
    pub fn diff_saved(&self, a: &str, b: &str) -> Result<Vec<FilterDifference>> {
        Ok(diff(&self.saved_entry(a)?.filter, &self.saved_entry(b)?.filter))
    }

    /// Differences that turn saved filter `id` into the live filter.
    pub fn diff_with_current(&self, id: &str) -> Result<Vec<FilterDifference>> {
        let live = self.live()?;
        Ok(diff(&self.saved_entry(id)?.filter, live))
    }

    // -- import / export ----------------------------------------------------

    pub fn export_current(&self) -> Result<String> {
        export_to_json(self.live()?)
    }

    /// The saved filter with its metadata, as a JSON envelope.
    pub fn export_saved(&self, id: &str) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.saved_entry(id)?)?)
    }

    /// Import a tree (bare or enveloped) and make it the live filter.
    ///
    /// A rejected document leaves the session untouched.
    pub fn import(&mut self, text: &str) -> Result<&FilterGroup> {
        let tree = import_from_json(text)?;
        let record = self.config.record_on_load;
        Ok(self.commit(tree, record))
    }

    // -- application ----------------------------------------------------------

    /// Basic filters followed by the live advanced filter, if any.
    pub fn apply<'a>(
        &self,
        dataset: impl Into<Option<&'a Dataset>>,
        basic: &[BasicFilter],
    ) -> FilteredDataset {
        let narrowed = apply_filters(dataset, basic);
        match &self.current {
            Some(tree) => apply_advanced(&narrowed, tree),
            None => narrowed,
        }
    }

    /// Whether `record` passes the live filter. Without one every record
    /// passes.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.current
            .as_ref()
            .map_or(true, |tree| evaluate_group(tree, record))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

fn unknown_saved(id: &str) -> Error {
    Error::NotFound(format!("saved filter {id}"))
}
