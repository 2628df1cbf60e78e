//! The relational snapshot the filter engine reads.
//!
//! Records are owned by the [`Dataset`] and never mutated by the engine.
//! References between them (relationship endpoints, event participants,
//! entity locations) are plain ids; a reference to a missing record is
//! treated as unmatched, never as an error.

use crate::Value;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

/// Attribute key on an entity that points at a [`Location`] id.
pub const LOCATION_ID_ATTRIBUTE: &str = "locationId";

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Entity,
    Relationship,
    Event,
    Location,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Entity => "entity",
            RecordKind::Relationship => "relationship",
            RecordKind::Event => "event",
            RecordKind::Location => "location",
        }
    }
}

/// The type of an entity, as shown by the entity-type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Organization,
    Account,
    Device,
    Vehicle,
    Document,
    Location,
    #[serde(other)]
    Unknown,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Organization => "organization",
            EntityKind::Account => "account",
            EntityKind::Device => "device",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Document => "document",
            EntityKind::Location => "location",
            EntityKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn at_location(self, location_id: impl Into<String>) -> Self {
        self.with_attribute(LOCATION_ID_ATTRIBUTE, location_id.into())
    }

    /// The location this entity is placed at, via `attributes.locationId`.
    pub fn location_id(&self) -> Option<&str> {
        self.attributes
            .get(LOCATION_ID_ATTRIBUTE)
            .and_then(Value::as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Entity id at the tail of the edge.
    pub source: String,
    /// Entity id at the head of the edge.
    pub target: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            source: source.into(),
            target: target.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    pub timestamp: DateTime<Utc>,
    /// Ids of the entities involved in this event.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Id of the location the event happened at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Event {
    pub fn new(id: impl Into<String>, title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            title: title.into(),
            timestamp,
            entities: Vec::new(),
            location: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn involving<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entity_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location = Some(location_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            attributes: BTreeMap::new(),
        }
    }
}

/// Anything a filter condition can be evaluated against.
///
/// Implementors expose a handful of built-in fields plus an `attributes`
/// map; [`Record::field`] resolves dot-paths over both.
pub trait Record {
    fn id(&self) -> &str;

    fn record_kind(&self) -> RecordKind;

    fn attributes(&self) -> &BTreeMap<String, Value>;

    /// A top-level field that is not stored in `attributes`.
    fn builtin_field(&self, name: &str) -> Option<Value>;

    /// Resolve a dot-path such as `name`, `attributes.age` or
    /// `attributes.address.city`.
    ///
    /// A bare name is looked up among the built-in fields first and then in
    /// `attributes`, so `risk` and `attributes.risk` are equivalent unless a
    /// built-in field is called `risk`. Returns `None` for any segment that
    /// does not resolve.
    fn field(&self, path: &str) -> Option<Cow<'_, Value>> {
        let mut segments = path.split('.').map(str::trim);
        let head = segments.next().filter(|s| !s.is_empty())?;

        let mut current: Cow<'_, Value> = if head == "attributes" {
            match segments.next() {
                Some(key) => Cow::Borrowed(self.attributes().get(key)?),
                None => Cow::Owned(Value::Map(self.attributes().clone())),
            }
        } else if let Some(value) = self.builtin_field(head) {
            Cow::Owned(value)
        } else {
            Cow::Borrowed(self.attributes().get(head)?)
        };

        for segment in segments {
            current = match current {
                Cow::Borrowed(v) => Cow::Borrowed(v.get(segment)?),
                Cow::Owned(v) => Cow::Owned(v.get(segment)?.clone()),
            };
        }
        Some(current)
    }
}

fn timestamp_value(at: &DateTime<Utc>) -> Value {
    Value::Text(at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl Record for Entity {
    fn id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::Entity
    }

    fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    fn builtin_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.clone().into()),
            "type" => Some(self.kind.as_str().into()),
            "name" | "label" => Some(self.name.clone().into()),
            _ => None,
        }
    }
}

impl Record for Relationship {
    fn id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::Relationship
    }

    fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    fn builtin_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.clone().into()),
            "type" => Some(self.kind.clone().into()),
            "source" => Some(self.source.clone().into()),
            "target" => Some(self.target.clone().into()),
            _ => None,
        }
    }
}

impl Record for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::Event
    }

    fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    fn builtin_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.clone().into()),
            "type" => Some(self.kind.clone().into()),
            "title" | "name" | "label" => Some(self.title.clone().into()),
            "timestamp" | "date" => Some(timestamp_value(&self.timestamp)),
            "entities" => Some(Value::from(self.entities.clone())),
            "location" => self.location.clone().map(Value::from),
            _ => None,
        }
    }
}

impl Record for Location {
    fn id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::Location
    }

    fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    fn builtin_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.clone().into()),
            "name" | "label" => Some(self.name.clone().into()),
            "latitude" | "lat" => Some(self.latitude.into()),
            "longitude" | "lng" | "lon" => Some(self.longitude.into()),
            _ => None,
        }
    }
}

/// The four record collections, each in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// A dataset narrowed by filters. Same shape, same ordering, fewer records.
pub type FilteredDataset = Dataset;

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.relationships.is_empty()
            && self.events.is_empty()
            && self.locations.is_empty()
    }

    /// Total number of records across all four collections.
    pub fn len(&self) -> usize {
        self.entities.len() + self.relationships.len() + self.events.len() + self.locations.len()
    }

    pub fn entity_ids(&self) -> HashSet<&str> {
        self.entities.iter().map(|e| e.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn entity_fields_resolve_builtin_and_attributes() {
        let e = Entity::new("e1", EntityKind::Person, "Alice")
            .with_attribute("age", 42.0)
            .at_location("loc-1");

        assert_eq!(e.field("name").as_deref(), Some(&Value::from("Alice")));
        assert_eq!(e.field("type").as_deref(), Some(&Value::from("person")));
        assert_eq!(
            e.field("attributes.age").as_deref(),
            Some(&Value::Number(42.0))
        );
        // Bare names fall back to attributes.
        assert_eq!(e.field("age").as_deref(), Some(&Value::Number(42.0)));
        assert_eq!(e.location_id(), Some("loc-1"));
        assert!(e.field("attributes.height").is_none());
        assert!(e.field("").is_none());
    }

    #[test]
    fn nested_attribute_paths_walk_maps() {
        let address: Value =
            serde_json::from_str(r#"{"city": "Lyon", "geo": {"zone": "B"}}"#).unwrap();
        let e = Entity::new("e1", EntityKind::Organization, "Acme").with_attribute("address", address);

        assert_eq!(
            e.field("attributes.address.city").as_deref(),
            Some(&Value::from("Lyon"))
        );
        assert_eq!(
            e.field("attributes.address.geo.zone").as_deref(),
            Some(&Value::from("B"))
        );
        assert!(e.field("attributes.address.zip").is_none());
        assert!(e.field("name.first").is_none());
    }

    #[test]
    fn event_timestamp_is_rfc3339_text() {
        let ev = Event::new("ev1", "Meeting", dt("2024-01-01T00:00:00Z")).involving(["e1", "e2"]);
        assert_eq!(
            ev.field("timestamp").as_deref(),
            Some(&Value::from("2024-01-01T00:00:00Z"))
        );
        assert_eq!(
            ev.field("entities").as_deref(),
            Some(&Value::from(vec!["e1", "e2"]))
        );
        assert!(ev.field("location").is_none());
    }

    #[test]
    fn dataset_json_uses_type_discriminants() {
        let json = r#"{
            "entities": [{"id": "e1", "type": "person", "name": "Alice",
                          "attributes": {"locationId": "l1"}},
                         {"id": "e2", "type": "spaceship"}],
            "relationships": [{"id": "r1", "type": "knows", "source": "e1", "target": "e2"}],
            "events": [{"id": "ev1", "timestamp": "2024-01-01T00:00:00Z", "entities": ["e1"]}],
            "locations": [{"id": "l1", "name": "HQ", "latitude": 48.85, "longitude": 2.35}]
        }"#;
        let ds: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.entities[1].kind, EntityKind::Unknown);
        assert_eq!(ds.entities[0].location_id(), Some("l1"));
        assert_eq!(ds.entity_ids(), HashSet::from(["e1", "e2"]));
        assert_eq!(ds.relationships[0].record_kind(), RecordKind::Relationship);
    }
}
