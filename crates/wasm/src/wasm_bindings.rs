//! Casegraph WASM: the filter session for the browser dashboard.
//!
//! Wraps a [`casegraph_session::FilterSession`]. Trees, datasets and results
//! cross the boundary as JSON strings in the same shape the core crate
//! serializes; errors surface as string `JsValue`s.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { WasmFilterSession } from 'casegraph-wasm';
//!
//! await init();
//! const session = new WasmFilterSession();
//! const root = JSON.parse(session.new_filter());
//! session.add_condition(root.id, JSON.stringify({
//!   type: "attribute", field: "attributes.risk", operator: "greaterThan", value: 0.7,
//! }));
//! const view = JSON.parse(session.apply(JSON.stringify(dataset), "[]"));
//! ```

use casegraph::{
    create_group, BasicFilter, Dataset, FilterCondition, FilterError, FilterGroup, GroupOperator,
    NodeId,
};
use casegraph_session::{FilterSession, SavedFilterUpdate, SessionConfig};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

fn to_js_err(e: FilterError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn json_err(e: serde_json::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(json_err)
}

fn parse_operator(operator: &str) -> Result<GroupOperator, JsValue> {
    serde_json::from_value(serde_json::Value::String(operator.to_string())).map_err(json_err)
}

// ---------------------------------------------------------------------------
// WasmFilterSession: the public API
// ---------------------------------------------------------------------------

/// A single analyst's filter session: live tree, undo/redo and saved filters.
///
/// Everything lives in memory and is lost when the instance is dropped.
#[wasm_bindgen]
pub struct WasmFilterSession {
    inner: FilterSession,
}

impl Default for WasmFilterSession {
    fn default() -> Self {
        Self {
            inner: FilterSession::default(),
        }
    }
}

#[wasm_bindgen]
impl WasmFilterSession {
    /// Create a session; `config_json` is an optional `SessionConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmFilterSession, JsValue> {
        let config = match config_json {
            Some(text) => serde_json::from_str::<SessionConfig>(&text).map_err(json_err)?,
            None => SessionConfig::default(),
        };
        let inner = FilterSession::new(config).map_err(to_js_err)?;
        Ok(WasmFilterSession { inner })
    }

    /// The live tree as JSON, or `undefined` when none is set.
    #[wasm_bindgen]
    pub fn current(&self) -> Result<Option<String>, JsValue> {
        self.inner.current().map(to_json).transpose()
    }

    /// Start a fresh empty AND root and return it.
    #[wasm_bindgen]
    pub fn new_filter(&mut self) -> Result<String, JsValue> {
        to_json(self.inner.new_filter())
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Append a condition (JSON, `id` optional) to group `parent_id`.
    #[wasm_bindgen]
    pub fn add_condition(&mut self, parent_id: &str, condition_json: &str) -> Result<String, JsValue> {
        let condition: FilterCondition = serde_json::from_str(condition_json).map_err(json_err)?;
        let tree = self
            .inner
            .add_condition(&NodeId::from(parent_id), condition)
            .map_err(to_js_err)?;
        to_json(tree)
    }

    /// Append an empty group with `operator` (`"and"` / `"or"`) to
    /// `parent_id`.
    #[wasm_bindgen]
    pub fn add_group(&mut self, parent_id: &str, operator: &str) -> Result<String, JsValue> {
        let group = create_group().with_operator(parse_operator(operator)?);
        let tree = self
            .inner
            .add_group(&NodeId::from(parent_id), group)
            .map_err(to_js_err)?;
        to_json(tree)
    }

    /// Replace condition `id` with `condition_json`, keeping its id.
    #[wasm_bindgen]
    pub fn update_condition(&mut self, id: &str, condition_json: &str) -> Result<String, JsValue> {
        let mut replacement: FilterCondition =
            serde_json::from_str(condition_json).map_err(json_err)?;
        let id = NodeId::from(id);
        replacement.id = id.clone();
        let tree = self
            .inner
            .update_condition(&id, |_| replacement)
            .map_err(to_js_err)?;
        to_json(tree)
    }

    #[wasm_bindgen]
    pub fn set_group_operator(&mut self, id: &str, operator: &str) -> Result<String, JsValue> {
        let operator = parse_operator(operator)?;
        let tree = self
            .inner
            .set_group_operator(&NodeId::from(id), operator)
            .map_err(to_js_err)?;
        to_json(tree)
    }

    #[wasm_bindgen]
    pub fn set_group_negated(&mut self, id: &str, negated: bool) -> Result<String, JsValue> {
        let tree = self
            .inner
            .update_group(&NodeId::from(id), |g| g.clone().with_negation(negated))
            .map_err(to_js_err)?;
        to_json(tree)
    }

    #[wasm_bindgen]
    pub fn remove_item(&mut self, id: &str) -> Result<String, JsValue> {
        let tree = self
            .inner
            .remove_item(&NodeId::from(id))
            .map_err(to_js_err)?;
        to_json(tree)
    }

    #[wasm_bindgen]
    pub fn undo(&mut self) -> Result<Option<String>, JsValue> {
        self.inner.undo().map(to_json).transpose()
    }

    #[wasm_bindgen]
    pub fn redo(&mut self) -> Result<Option<String>, JsValue> {
        self.inner.redo().map(to_json).transpose()
    }

    #[wasm_bindgen]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    #[wasm_bindgen]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    /// Save the live tree and return the saved filter as JSON.
    #[wasm_bindgen]
    pub fn save_current(
        &mut self,
        name: &str,
        description: Option<String>,
        category: Option<String>,
    ) -> Result<String, JsValue> {
        let saved = self
            .inner
            .save_current(name, description.as_deref(), category.as_deref())
            .map_err(to_js_err)?;
        to_json(saved)
    }

    /// Apply a partial `SavedFilterUpdate` object.
    #[wasm_bindgen]
    pub fn update_saved(&mut self, id: &str, update_json: &str) -> Result<String, JsValue> {
        let update: SavedFilterUpdate = serde_json::from_str(update_json).map_err(json_err)?;
        let saved = self.inner.update_saved(id, update).map_err(to_js_err)?;
        to_json(saved)
    }

    #[wasm_bindgen]
    pub fn overwrite_saved(&mut self, id: &str) -> Result<String, JsValue> {
        let saved = self.inner.overwrite_saved(id).map_err(to_js_err)?;
        to_json(saved)
    }

    #[wasm_bindgen]
    pub fn delete_saved(&mut self, id: &str) -> Result<(), JsValue> {
        self.inner.delete_saved(id).map(|_| ()).map_err(to_js_err)
    }

    /// Every saved filter, in creation order, as a JSON array.
    #[wasm_bindgen]
    pub fn list_saved(&self) -> Result<String, JsValue> {
        to_json(self.inner.list_saved())
    }

    #[wasm_bindgen]
    pub fn load_saved(&mut self, id: &str) -> Result<String, JsValue> {
        let tree = self.inner.load_saved(id).map_err(to_js_err)?;
        to_json(tree)
    }

    #[wasm_bindgen]
    pub fn diff_saved(&self, a: &str, b: &str) -> Result<String, JsValue> {
        let differences = self.inner.diff_saved(a, b).map_err(to_js_err)?;
        to_json(&differences)
    }

    #[wasm_bindgen]
    pub fn diff_with_current(&self, id: &str) -> Result<String, JsValue> {
        let differences = self.inner.diff_with_current(id).map_err(to_js_err)?;
        to_json(&differences)
    }

    #[wasm_bindgen]
    pub fn export_current(&self) -> Result<String, JsValue> {
        self.inner.export_current().map_err(to_js_err)
    }

    #[wasm_bindgen]
    pub fn export_saved(&self, id: &str) -> Result<String, JsValue> {
        self.inner.export_saved(id).map_err(to_js_err)
    }

    /// Import a tree (bare or enveloped) as the live filter.
    #[wasm_bindgen]
    pub fn import(&mut self, text: &str) -> Result<String, JsValue> {
        let tree: &FilterGroup = self.inner.import(text).map_err(to_js_err)?;
        to_json(tree)
    }

    /// Filter a dataset with basic filters (JSON array) and the live tree.
    #[wasm_bindgen]
    pub fn apply(&self, dataset_json: &str, basic_filters_json: &str) -> Result<String, JsValue> {
        let dataset: Dataset = serde_json::from_str(dataset_json).map_err(json_err)?;
        let basic: Vec<BasicFilter> = serde_json::from_str(basic_filters_json).map_err(json_err)?;
        to_json(&self.inner.apply(&dataset, &basic))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
