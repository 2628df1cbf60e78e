//! Cross-entity filter application.
//!
//! Filters narrow one collection directly (entity types narrow entities,
//! time ranges narrow events, geographic areas narrow locations) and the
//! effect is then propagated so that every view of the dataset stays
//! consistent: a relationship survives only if both of its endpoints do.
//!
//! The input dataset is never mutated and every output collection keeps the
//! order of the input.

use crate::dataset::{
    Dataset, Entity, EntityKind, Event, FilteredDataset, Location, Record, RecordKind,
};
use crate::evaluate::evaluate_group;
use crate::tree::{ConditionKind, FilterGroup, FilterNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<&Location> for Coordinates {
    fn from(location: &Location) -> Self {
        Self::new(location.latitude, location.longitude)
    }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// The area a geographic filter keeps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeoArea {
    /// Inclusive on all four edges. When `west > east` the box wraps across
    /// the antimeridian.
    #[serde(rename_all = "camelCase")]
    BoundingBox {
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    },
    /// Inclusive of the radius boundary.
    #[serde(rename_all = "camelCase")]
    Radius { center: Coordinates, radius_km: f64 },
}

impl GeoArea {
    pub fn contains(&self, point: Coordinates) -> bool {
        match *self {
            GeoArea::BoundingBox {
                north,
                south,
                east,
                west,
            } => {
                let lat_ok = point.latitude >= south && point.latitude <= north;
                let lon_ok = if west <= east {
                    point.longitude >= west && point.longitude <= east
                } else {
                    point.longitude >= west || point.longitude <= east
                };
                lat_ok && lon_ok
            }
            GeoArea::Radius { center, radius_km } => haversine_km(center, point) <= radius_km,
        }
    }
}

/// One of the dashboard's single-field filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BasicFilter {
    /// Keep entities whose type is in the set.
    EntityType { types: Vec<EntityKind> },
    /// Keep events inside the inclusive range; a missing bound is open.
    #[serde(rename_all = "camelCase")]
    TimeRange {
        #[serde(default)]
        start: Option<DateTime<Utc>>,
        #[serde(default)]
        end: Option<DateTime<Utc>>,
    },
    /// Keep locations inside the area.
    Geographic { area: GeoArea },
}

impl BasicFilter {
    pub fn entity_types(types: impl IntoIterator<Item = EntityKind>) -> Self {
        BasicFilter::EntityType {
            types: types.into_iter().collect(),
        }
    }

    pub fn time_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        BasicFilter::TimeRange { start, end }
    }

    pub fn within(area: GeoArea) -> Self {
        BasicFilter::Geographic { area }
    }

    /// Time and geographic filters narrow events/locations and therefore
    /// require re-deriving the entity set.
    fn propagates(&self) -> bool {
        matches!(
            self,
            BasicFilter::TimeRange { .. } | BasicFilter::Geographic { .. }
        )
    }
}

fn in_time_range(event: &Event, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    start.is_none_or(|s| event.timestamp >= s) && end.is_none_or(|e| event.timestamp <= e)
}

/// Basic filters plus an optional advanced tree, applied together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default)]
    pub basic: Vec<BasicFilter>,
    #[serde(default)]
    pub advanced: Option<FilterGroup>,
}

/// Apply basic filters to `dataset`.
///
/// 1. Each filter narrows its own collection.
/// 2. If any time or geographic filter was applied, entities are re-derived:
///    an entity survives only if a surviving event involves it or it sits at
///    a surviving location (`attributes.locationId`). Entity-type filters
///    alone do not trigger this step.
/// 3. Relationships survive only if both endpoints survive.
///
/// A `None` dataset yields four empty collections.
pub fn apply_filters<'a>(
    dataset: impl Into<Option<&'a Dataset>>,
    filters: &[BasicFilter],
) -> FilteredDataset {
    let Some(dataset) = dataset.into() else {
        return FilteredDataset::default();
    };

    let mut entities: Vec<&Entity> = dataset.entities.iter().collect();
    let mut events: Vec<&Event> = dataset.events.iter().collect();
    let mut locations: Vec<&Location> = dataset.locations.iter().collect();

    for filter in filters {
        match filter {
            BasicFilter::EntityType { types } => {
                entities.retain(|e| types.contains(&e.kind));
            }
            BasicFilter::TimeRange { start, end } => {
                events.retain(|ev| in_time_range(ev, *start, *end));
            }
            BasicFilter::Geographic { area } => {
                locations.retain(|loc| area.contains(Coordinates::from(*loc)));
            }
        }
    }

    let propagated = filters.iter().any(BasicFilter::propagates);
    if propagated {
        retain_involved_or_located(&mut entities, &events, &locations);
    }

    let result = finish(dataset, entities, events, locations);
    debug!(
        filters = filters.len(),
        propagated,
        entities_in = dataset.entities.len(),
        entities_out = result.entities.len(),
        events_out = result.events.len(),
        locations_out = result.locations.len(),
        relationships_out = result.relationships.len(),
        "applied basic filters"
    );
    result
}

/// Apply an advanced tree to `dataset`.
///
/// Each condition narrows the collection its kind belongs to: entity-type
/// and attribute conditions narrow entities, time-range conditions narrow
/// events, geographic conditions narrow locations and relationship
/// conditions narrow relationships. Every collection sees the tree
/// restricted to its own conditions, with group operators and negation
/// kept; a group left with no conditions is dropped from that view.
///
/// Once events or locations were narrowed, entities follow the same way as
/// with basic filters. Events whose participants were all dropped go too,
/// as do locations that only dropped records referred to. Events without
/// participants and locations nothing refers to are left alone, so a tree
/// without conditions reduces to its empty-group result: an empty AND root
/// returns the dataset unchanged and an empty OR root returns nothing.
pub fn apply_advanced<'a>(
    dataset: impl Into<Option<&'a Dataset>>,
    tree: &FilterGroup,
) -> FilteredDataset {
    let Some(dataset) = dataset.into() else {
        return FilteredDataset::default();
    };

    if tree.leaf_conditions().is_empty() {
        return FilteredDataset {
            entities: cloned_matches(&dataset.entities, tree),
            relationships: cloned_matches(&dataset.relationships, tree),
            events: cloned_matches(&dataset.events, tree),
            locations: cloned_matches(&dataset.locations, tree),
        };
    }

    let entity_pass = narrow(&dataset.entities, tree, RecordKind::Entity);
    let event_pass = narrow(&dataset.events, tree, RecordKind::Event);
    let location_pass = narrow(&dataset.locations, tree, RecordKind::Location);
    let propagated = event_pass.is_some() || location_pass.is_some();

    let mut entities = entity_pass.unwrap_or_else(|| dataset.entities.iter().collect());
    let mut events = event_pass.unwrap_or_else(|| dataset.events.iter().collect());
    let mut locations = location_pass.unwrap_or_else(|| dataset.locations.iter().collect());

    if propagated {
        retain_involved_or_located(&mut entities, &events, &locations);
    }
    drop_orphans(dataset, &entities, &mut events, &mut locations);

    let mut result = finish(dataset, entities, events, locations);
    if let Some(links) = projected(tree, RecordKind::Relationship) {
        result.relationships.retain(|r| evaluate_group(&links, r));
    }
    debug!(
        conditions = tree.leaf_conditions().len(),
        propagated,
        entities_in = dataset.entities.len(),
        entities_out = result.entities.len(),
        events_out = result.events.len(),
        locations_out = result.locations.len(),
        relationships_out = result.relationships.len(),
        "applied advanced filter"
    );
    result
}

/// Basic filters first, then the advanced tree over what remains.
pub fn apply<'a>(dataset: impl Into<Option<&'a Dataset>>, set: &FilterSet) -> FilteredDataset {
    let narrowed = apply_filters(dataset, &set.basic);
    match &set.advanced {
        Some(tree) => apply_advanced(&narrowed, tree),
        None => narrowed,
    }
}

/// Keep the records of any collection that satisfy `tree`, in order.
pub fn filter_records<'r, R: Record>(records: &'r [R], tree: &FilterGroup) -> Vec<&'r R> {
    records.iter().filter(|r| evaluate_group(tree, *r)).collect()
}

fn cloned_matches<R: Record + Clone>(records: &[R], tree: &FilterGroup) -> Vec<R> {
    filter_records(records, tree).into_iter().cloned().collect()
}

/// Collection narrowed by conditions of `kind`.
fn target(kind: ConditionKind) -> RecordKind {
    match kind {
        ConditionKind::EntityType | ConditionKind::Attribute => RecordKind::Entity,
        ConditionKind::TimeRange => RecordKind::Event,
        ConditionKind::Geographic => RecordKind::Location,
        ConditionKind::Relationship => RecordKind::Relationship,
    }
}

/// `group` restricted to the conditions aimed at `collection`. `None` when
/// the group had children and none of them survive.
fn project(group: &FilterGroup, collection: RecordKind) -> Option<FilterGroup> {
    let conditions: Vec<FilterNode> = group
        .conditions
        .iter()
        .filter_map(|node| match node {
            FilterNode::Condition(c) => (target(c.kind) == collection).then(|| node.clone()),
            FilterNode::Group(g) => project(g, collection).map(FilterNode::from),
        })
        .collect();
    if conditions.is_empty() && !group.conditions.is_empty() {
        return None;
    }
    Some(FilterGroup {
        id: group.id.clone(),
        operator: group.operator,
        conditions,
        negated: group.negated,
    })
}

fn projected(tree: &FilterGroup, collection: RecordKind) -> Option<FilterGroup> {
    project(tree, collection).filter(|g| !g.leaf_conditions().is_empty())
}

fn narrow<'d, R: Record>(
    records: &'d [R],
    tree: &FilterGroup,
    collection: RecordKind,
) -> Option<Vec<&'d R>> {
    projected(tree, collection).map(|view| filter_records(records, &view))
}

/// Keep entities involved in a surviving event or sitting at a surviving
/// location.
fn retain_involved_or_located(
    entities: &mut Vec<&Entity>,
    events: &[&Event],
    locations: &[&Location],
) {
    let involved: HashSet<&str> = events
        .iter()
        .flat_map(|ev| ev.entities.iter().map(String::as_str))
        .collect();
    let located: HashSet<&str> = locations.iter().map(|loc| loc.id.as_str()).collect();
    entities.retain(|e| {
        involved.contains(e.id.as_str()) || e.location_id().is_some_and(|l| located.contains(l))
    });
}

/// Drop events that lost every participant and locations that lost every
/// record referring to them.
fn drop_orphans(
    dataset: &Dataset,
    entities: &[&Entity],
    events: &mut Vec<&Event>,
    locations: &mut Vec<&Location>,
) {
    let known = dataset.entity_ids();
    let kept: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    events.retain(|ev| {
        let mut present = ev.entities.iter().filter(|id| known.contains(id.as_str())).peekable();
        present.peek().is_none() || present.any(|id| kept.contains(id.as_str()))
    });

    let referenced: HashSet<&str> = dataset
        .entities
        .iter()
        .filter_map(Entity::location_id)
        .chain(dataset.events.iter().filter_map(|ev| ev.location.as_deref()))
        .collect();
    let still_referenced: HashSet<&str> = entities
        .iter()
        .copied()
        .filter_map(Entity::location_id)
        .chain(events.iter().filter_map(|ev| ev.location.as_deref()))
        .collect();
    locations.retain(|loc| {
        !referenced.contains(loc.id.as_str()) || still_referenced.contains(loc.id.as_str())
    });
}

/// Narrow relationships to surviving endpoints and clone the survivors.
fn finish(
    dataset: &Dataset,
    entities: Vec<&Entity>,
    events: Vec<&Event>,
    locations: Vec<&Location>,
) -> FilteredDataset {
    let kept: HashSet<&str> = entities.iter().copied().map(|e| e.id.as_str()).collect();
    let relationships = dataset
        .relationships
        .iter()
        .filter(|r| kept.contains(r.source.as_str()) && kept.contains(r.target.as_str()))
        .cloned()
        .collect();
    FilteredDataset {
        entities: entities.into_iter().cloned().collect(),
        relationships,
        events: events.into_iter().cloned().collect(),
        locations: locations.into_iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Relationship;
    use crate::tree::{FilterCondition, FilterOperator, GroupOperator};

    fn dt(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn ids<T: Record>(records: &[T]) -> Vec<&str> {
        records.iter().map(Record::id).collect()
    }

    fn sample() -> Dataset {
        Dataset {
            entities: vec![
                Entity::new("alice", EntityKind::Person, "Alice").with_attribute("risk", 0.9),
                Entity::new("acme", EntityKind::Organization, "Acme").at_location("paris"),
                Entity::new("bob", EntityKind::Person, "Bob").with_attribute("risk", 0.2),
                Entity::new("van", EntityKind::Vehicle, "Van").at_location("tokyo"),
            ],
            relationships: vec![
                Relationship::new("r1", "employs", "acme", "alice"),
                Relationship::new("r2", "knows", "alice", "bob"),
                Relationship::new("r3", "owns", "bob", "van"),
                Relationship::new("r4", "knows", "alice", "ghost"),
            ],
            events: vec![
                Event::new("ev1", "Meeting", dt("2024-01-01T10:00:00Z")).involving(["alice", "acme"]),
                Event::new("ev2", "Call", dt("2024-02-01T10:00:00Z"))
                    .involving(["bob"])
                    .at_location("paris"),
            ],
            locations: vec![
                Location::new("paris", "Paris", 48.8566, 2.3522),
                Location::new("tokyo", "Tokyo", 35.6762, 139.6503),
            ],
        }
    }

    #[test]
    fn no_filters_returns_a_full_copy() {
        let ds = sample();
        let out = apply_filters(&ds, &[]);
        assert_eq!(out.entities, ds.entities);
        assert_eq!(out.events, ds.events);
        assert_eq!(out.locations, ds.locations);
        assert_eq!(ids(&out.relationships), vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn missing_dataset_yields_empty_collections() {
        let out = apply_filters(None, &[BasicFilter::entity_types([EntityKind::Person])]);
        assert!(out.is_empty());
        assert!(apply_advanced(None, &FilterGroup::new()).is_empty());
    }

    #[test]
    fn entity_type_filter_does_not_propagate() {
        let ds = sample();
        let out = apply_filters(&ds, &[BasicFilter::entity_types([EntityKind::Person])]);
        assert_eq!(ids(&out.entities), vec!["alice", "bob"]);
        assert_eq!(ids(&out.relationships), vec!["r2"]);
        // Events and locations are untouched by entity-type filtering.
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.locations.len(), 2);
    }

    #[test]
    fn time_range_drops_events_then_entities() {
        let ds = sample();
        let out = apply_filters(
            &ds,
            &[BasicFilter::time_range(Some(dt("2024-01-15T00:00:00Z")), None)],
        );
        assert_eq!(ids(&out.events), vec!["ev2"]);
        // bob via ev2; acme and van via their (unfiltered) locations.
        assert_eq!(ids(&out.entities), vec!["acme", "bob", "van"]);
        assert_eq!(ids(&out.relationships), vec!["r3"]);
    }

    #[test]
    fn time_range_bounds_are_inclusive() {
        let ds = sample();
        let exact = dt("2024-01-01T10:00:00Z");
        let out = apply_filters(&ds, &[BasicFilter::time_range(Some(exact), Some(exact))]);
        assert_eq!(ids(&out.events), vec!["ev1"]);
    }

    #[test]
    fn bounding_box_is_edge_inclusive() {
        let area = GeoArea::BoundingBox {
            north: 48.8566,
            south: 48.0,
            east: 2.3522,
            west: 2.0,
        };
        assert!(area.contains(Coordinates::new(48.8566, 2.3522)));
        assert!(!area.contains(Coordinates::new(48.8567, 2.3522)));
    }

    #[test]
    fn bounding_box_wraps_antimeridian() {
        let area = GeoArea::BoundingBox {
            north: 10.0,
            south: -10.0,
            east: -170.0,
            west: 170.0,
        };
        assert!(area.contains(Coordinates::new(0.0, 175.0)));
        assert!(area.contains(Coordinates::new(0.0, -175.0)));
        assert!(!area.contains(Coordinates::new(0.0, 0.0)));
    }

    #[test]
    fn haversine_matches_known_distance() {
        let paris = Coordinates::new(48.8566, 2.3522);
        let london = Coordinates::new(51.5074, -0.1278);
        let d = haversine_km(paris, london);
        assert!((d - 343.5).abs() < 1.0, "paris-london was {d}");
        assert_eq!(haversine_km(paris, paris), 0.0);
    }

    #[test]
    fn geographic_filter_keeps_entities_at_surviving_locations() {
        let ds = sample();
        let area = GeoArea::Radius {
            center: Coordinates::new(48.8566, 2.3522),
            radius_km: 50.0,
        };
        let out = apply_filters(&ds, &[BasicFilter::within(area)]);
        assert_eq!(ids(&out.locations), vec!["paris"]);
        // alice and bob via events, acme at paris; van at tokyo is dropped.
        assert_eq!(ids(&out.entities), vec!["alice", "acme", "bob"]);
        assert_eq!(ids(&out.relationships), vec!["r1", "r2"]);
    }

    #[test]
    fn broken_relationship_references_are_unmatched() {
        let ds = sample();
        // r4 points at an entity that is not in the dataset.
        let out = apply_filters(&ds, &[]);
        assert!(!ids(&out.relationships).contains(&"r4"));
        let out = apply_filters(&ds, &[BasicFilter::entity_types([EntityKind::Person])]);
        assert!(!ids(&out.relationships).contains(&"r4"));
    }

    #[test]
    fn advanced_tree_narrows_entities_and_follows_references() {
        let ds = sample();
        let tree = FilterGroup::new().with_child(FilterCondition::attribute(
            "risk",
            FilterOperator::GreaterThan,
            0.5,
        ));
        let out = apply_advanced(&ds, &tree);
        assert_eq!(ids(&out.entities), vec!["alice"]);
        assert_eq!(ids(&out.events), vec!["ev1"]);
        assert!(out.relationships.is_empty());
        assert!(out.locations.is_empty());
    }

    #[test]
    fn empty_and_root_returns_the_dataset_unchanged() {
        let ds = Dataset {
            entities: vec![
                Entity::new("e1", EntityKind::Person, "Eve"),
                Entity::new("e2", EntityKind::Person, "Mallory"),
            ],
            relationships: vec![Relationship::new("r1", "knows", "e1", "e2")],
            events: vec![
                Event::new("ev1", "Call", dt("2024-01-01T10:00:00Z")).involving(["e1"]),
                // No participants at all.
                Event::new("ev2", "Blackout", dt("2024-01-02T10:00:00Z")),
            ],
            // Nothing refers to this one.
            locations: vec![Location::new("depot", "Depot", 10.0, 10.0)],
        };

        let out = apply_advanced(&ds, &FilterGroup::new());
        assert_eq!(out, ds);

        let none = apply_advanced(&ds, &FilterGroup::new().with_operator(GroupOperator::Or));
        assert!(none.is_empty());
    }

    #[test]
    fn unreferenced_records_survive_an_entity_condition() {
        let mut ds = sample();
        ds.events.push(Event::new("ev3", "Blackout", dt("2024-03-01T00:00:00Z")));
        ds.locations.push(Location::new("depot", "Depot", 10.0, 10.0));
        let tree = FilterGroup::new().with_child(FilterCondition::attribute(
            "risk",
            FilterOperator::GreaterThan,
            0.5,
        ));
        let out = apply_advanced(&ds, &tree);
        assert_eq!(ids(&out.events), vec!["ev1", "ev3"]);
        assert_eq!(ids(&out.locations), vec!["depot"]);
    }

    #[test]
    fn time_range_condition_keeps_event_and_participants() {
        let ds = Dataset {
            entities: vec![
                Entity::new("e1", EntityKind::Person, "Eve"),
                Entity::new("e2", EntityKind::Person, "Mallory"),
            ],
            relationships: vec![Relationship::new("r1", "knows", "e1", "e2")],
            events: vec![
                Event::new("ev", "Transfer", dt("2024-03-01T12:00:00Z")).involving(["e1"]),
                Event::new("old", "Transfer", dt("2023-05-01T12:00:00Z")).involving(["e2"]),
            ],
            locations: vec![],
        };
        let tree = FilterGroup::new().with_child(FilterCondition::new(
            ConditionKind::TimeRange,
            "timestamp",
            FilterOperator::Between,
            vec!["2024-01-01T00:00:00Z", "2024-12-31T23:59:59Z"],
        ));

        let out = apply_advanced(&ds, &tree);
        assert_eq!(ids(&out.events), vec!["ev"]);
        assert_eq!(ids(&out.entities), vec!["e1"]);
        assert!(out.relationships.is_empty());
    }

    #[test]
    fn geographic_condition_narrows_locations_then_entities() {
        let ds = sample();
        let tree = FilterGroup::new().with_child(FilterCondition::new(
            ConditionKind::Geographic,
            "latitude",
            FilterOperator::Between,
            vec![48.0, 49.0],
        ));

        let out = apply_advanced(&ds, &tree);
        assert_eq!(ids(&out.locations), vec!["paris"]);
        // van only had tokyo; the others are involved in events or sit in paris.
        assert_eq!(ids(&out.entities), vec!["alice", "acme", "bob"]);
        assert_eq!(ids(&out.events), vec!["ev1", "ev2"]);
        assert_eq!(ids(&out.relationships), vec!["r1", "r2"]);
    }

    #[test]
    fn conditions_of_each_kind_narrow_their_own_collection() {
        let ds = sample();
        let tree = FilterGroup::new()
            .with_child(FilterCondition::new(
                ConditionKind::EntityType,
                "type",
                FilterOperator::In,
                vec!["person", "organization"],
            ))
            .with_child(
                FilterGroup::new()
                    .with_negation(true)
                    .with_child(FilterCondition::new(
                        ConditionKind::Relationship,
                        "type",
                        FilterOperator::Equals,
                        "employs",
                    )),
            );

        let out = apply_advanced(&ds, &tree);
        assert_eq!(ids(&out.entities), vec!["alice", "acme", "bob"]);
        // r1 fails the relationship condition, r3 lost van, r4 never had ghost.
        assert_eq!(ids(&out.relationships), vec!["r2"]);
        assert_eq!(ids(&out.events), vec!["ev1", "ev2"]);
        // tokyo was only referenced by van.
        assert_eq!(ids(&out.locations), vec!["paris"]);
    }

    #[test]
    fn filter_set_runs_basic_then_advanced() {
        let ds = sample();
        let set = FilterSet {
            basic: vec![BasicFilter::entity_types([EntityKind::Person])],
            advanced: Some(FilterGroup::new().with_child(FilterCondition::attribute(
                "name",
                FilterOperator::Equals,
                "bob",
            ))),
        };
        let out = apply(&ds, &set);
        assert_eq!(ids(&out.entities), vec!["bob"]);
        assert_eq!(ids(&out.events), vec!["ev2"]);
        // van was removed by the basic filter, so nothing left refers to tokyo.
        assert_eq!(ids(&out.locations), vec!["paris", "tokyo"]);
    }

    #[test]
    fn basic_filters_deserialize_from_json() {
        let filters: Vec<BasicFilter> = serde_json::from_str(
            r#"[
                {"type": "entityType", "types": ["person", "vehicle"]},
                {"type": "timeRange", "start": "2024-01-01T00:00:00Z"},
                {"type": "geographic", "area": {"kind": "radius",
                    "center": {"latitude": 0.0, "longitude": 0.0}, "radiusKm": 10.0}}
            ]"#,
        )
        .unwrap();
        assert_eq!(filters.len(), 3);
        assert_eq!(
            filters[1],
            BasicFilter::time_range(Some(dt("2024-01-01T00:00:00Z")), None)
        );
    }

    #[test]
    fn input_dataset_is_not_mutated() {
        let ds = sample();
        let before = ds.clone();
        let _ = apply_filters(
            &ds,
            &[
                BasicFilter::entity_types([EntityKind::Person]),
                BasicFilter::time_range(None, Some(dt("2024-01-02T00:00:00Z"))),
            ],
        );
        assert_eq!(ds, before);
    }
}
