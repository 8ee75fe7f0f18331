//! In-memory query engine.
//!
//! [`MemoryQueryEngine`] keeps entities in a hash map and indexes each one
//! under every geocell containing its location, so a query is one map lookup
//! per requested cell. It is the reference backend for the searches and what
//! the tests and benchmarks run against.

use crate::compute::geocell::generate_geocells;
use crate::compute::validation::validate_geocells;
use crate::error::Result;
use crate::query::{GeocellQuery, GeocellQueryEngine, LocationCapable};
use bytes::Bytes;
use geocell_types::Point;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Named field lookup used to evaluate base filters and `order_by`.
pub trait FieldAccess {
    fn field(&self, name: &str) -> Option<Value>;
}

/// A ready-made entity: a key, a location, JSON properties and an opaque payload.
///
/// # Examples
///
/// ```rust
/// use geocell::{FieldAccess, GeoEntity, Point};
/// use serde_json::json;
///
/// let cafe = GeoEntity::new("cafe-1", Point::new(40.7128, -74.0060)?)
///     .with_property("category", json!("cafe"))
///     .with_data("espresso".as_bytes().to_vec());
///
/// assert_eq!(cafe.field("category"), Some(json!("cafe")));
/// assert_eq!(&cafe.data()[..], b"espresso");
/// # Ok::<(), geocell::GeocellError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntity {
    key: String,
    location: Point,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    data: Bytes,
}

impl GeoEntity {
    pub fn new(key: impl Into<String>, location: Point) -> Self {
        Self {
            key: key.into(),
            location,
            properties: Map::new(),
            data: Bytes::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl LocationCapable for GeoEntity {
    fn location(&self) -> Point {
        self.location
    }

    fn key_string(&self) -> &str {
        &self.key
    }
}

impl FieldAccess for GeoEntity {
    /// `key`, `latitude` and `longitude` resolve to the entity itself;
    /// any other name is looked up in the properties.
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "key" => Some(Value::String(self.key.clone())),
            "latitude" => Some(Value::from(self.location.latitude())),
            "longitude" => Some(Value::from(self.location.longitude())),
            _ => self.properties.get(name).cloned(),
        }
    }
}

/// Counters describing a [`MemoryQueryEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Entities stored
    pub entity_count: usize,
    /// Distinct geocells with at least one entity
    pub cell_count: usize,
    /// Queries answered since creation
    pub query_count: u64,
}

struct Indexed<T> {
    entity: T,
    geocells: Vec<String>,
}

struct MemoryIndex<T> {
    entities: FxHashMap<String, Indexed<T>>,
    cells: FxHashMap<String, FxHashSet<String>>,
}

impl<T> MemoryIndex<T> {
    fn new() -> Self {
        Self {
            entities: FxHashMap::default(),
            cells: FxHashMap::default(),
        }
    }

    fn unindex(&mut self, key: &str, geocells: &[String]) {
        for cell in geocells {
            if let Some(keys) = self.cells.get_mut(cell) {
                keys.remove(key);
                if keys.is_empty() {
                    self.cells.remove(cell);
                }
            }
        }
    }
}

/// Thread-safe in-memory backend implementing [`GeocellQueryEngine`].
///
/// Share it across threads behind an `Arc`; reads run concurrently.
///
/// # Examples
///
/// ```rust
/// use geocell::{GeoEntity, GeocellQueryEngine, MemoryQueryEngine, Point};
///
/// let engine = MemoryQueryEngine::new();
/// engine.insert(GeoEntity::new("a", Point::new(10.0, 10.0)?))?;
///
/// let found = engine.query(None, None, &["c".to_string()])?;
/// assert_eq!(found.len(), 1);
/// assert_eq!(engine.stats().entity_count, 1);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub struct MemoryQueryEngine<T> {
    index: RwLock<MemoryIndex<T>>,
    queries: AtomicU64,
}

impl<T> MemoryQueryEngine<T>
where
    T: LocationCapable + FieldAccess + Clone,
{
    pub fn new() -> Self {
        Self {
            index: RwLock::new(MemoryIndex::new()),
            queries: AtomicU64::new(0),
        }
    }

    /// Store an entity, replacing and returning any entity with the same key.
    pub fn insert(&self, entity: T) -> Result<Option<T>> {
        let key = entity.key_string().to_string();
        let geocells = generate_geocells(&entity.location())?;

        let mut index = self.index.write();
        let previous = index.entities.remove(&key);
        if let Some(old) = &previous {
            index.unindex(&key, &old.geocells);
        }

        for cell in &geocells {
            index
                .cells
                .entry(cell.clone())
                .or_default()
                .insert(key.clone());
        }
        index.entities.insert(key, Indexed { entity, geocells });

        Ok(previous.map(|old| old.entity))
    }

    /// Store several entities, stopping at the first failure.
    pub fn insert_all<I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        for entity in entities {
            self.insert(entity)?;
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        let mut index = self.index.write();
        let removed = index.entities.remove(key)?;
        index.unindex(key, &removed.geocells);
        Some(removed.entity)
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.index
            .read()
            .entities
            .get(key)
            .map(|indexed| indexed.entity.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.read().entities.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().entities.is_empty()
    }

    pub fn clear(&self) {
        let mut index = self.index.write();
        index.entities.clear();
        index.cells.clear();
    }

    pub fn stats(&self) -> EngineStats {
        let index = self.index.read();
        EngineStats {
            entity_count: index.entities.len(),
            cell_count: index.cells.len(),
            query_count: self.queries.load(AtomicOrdering::Relaxed),
        }
    }
}

impl<T> Default for MemoryQueryEngine<T>
where
    T: LocationCapable + FieldAccess + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GeocellQueryEngine for MemoryQueryEngine<T>
where
    T: LocationCapable + FieldAccess + Clone,
{
    type Entity = T;

    /// Entities under any of `geocells` passing `base_query`.
    ///
    /// Without `order_by` results come back sorted by key. `order_by` names a
    /// field to sort on; a leading `-` sorts descending. Entities missing the
    /// field sort last.
    fn query(
        &self,
        base_query: Option<&GeocellQuery>,
        order_by: Option<&str>,
        geocells: &[String],
    ) -> Result<Vec<T>> {
        self.queries.fetch_add(1, AtomicOrdering::Relaxed);
        validate_geocells(geocells)?;

        let index = self.index.read();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut matches: Vec<&T> = Vec::new();

        for cell in geocells {
            let Some(keys) = index.cells.get(cell) else {
                continue;
            };
            for key in keys {
                if !seen.insert(key.as_str()) {
                    continue;
                }
                let Some(indexed) = index.entities.get(key) else {
                    log::warn!("Geocell {} references missing entity {}", cell, key);
                    continue;
                };
                if passes(base_query, &indexed.entity) {
                    matches.push(&indexed.entity);
                }
            }
        }

        match order_by {
            Some(order) => {
                let (field, descending) = match order.strip_prefix('-') {
                    Some(field) => (field, true),
                    None => (order, false),
                };
                let mut keyed: Vec<(Option<Value>, &T)> =
                    matches.into_iter().map(|e| (e.field(field), e)).collect();
                keyed.sort_by(|(a, ea), (b, eb)| {
                    compare_field(a.as_ref(), b.as_ref(), descending)
                        .then_with(|| ea.key_string().cmp(eb.key_string()))
                });
                Ok(keyed.into_iter().map(|(_, e)| e.clone()).collect())
            }
            None => {
                matches.sort_by(|a, b| a.key_string().cmp(b.key_string()));
                Ok(matches.into_iter().cloned().collect())
            }
        }
    }
}

fn passes<T: FieldAccess>(base_query: Option<&GeocellQuery>, entity: &T) -> bool {
    base_query.is_none_or(|query| {
        query
            .clauses()
            .iter()
            .all(|clause| clause.evaluate(entity.field(&clause.field).as_ref()))
    })
}

fn compare_field(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let ordering = match (a, b) {
        (Some(a), Some(b)) => compare_json(a, b),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => return Ordering::Equal,
    };
    if descending { ordering.reverse() } else { ordering }
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn entity(key: &str, lat: f64, lon: f64) -> GeoEntity {
        GeoEntity::new(key, Point::new(lat, lon).unwrap())
    }

    fn cells(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_indexes_every_resolution() {
        let engine = MemoryQueryEngine::new();
        engine.insert(entity("a", 10.0, 10.0)).unwrap();

        let location = Point::new(10.0, 10.0).unwrap();
        for cell in generate_geocells(&location).unwrap() {
            let found = engine.query(None, None, &[cell]).unwrap();
            assert_eq!(found.len(), 1);
        }

        let stats = engine.stats();
        assert_eq!(stats.entity_count, 1);
        assert_eq!(stats.cell_count, 13);
        assert_eq!(stats.query_count, 13);
    }

    #[test]
    fn test_replace_moves_entity() {
        let engine = MemoryQueryEngine::new();
        assert!(engine.insert(entity("a", 10.0, 10.0)).unwrap().is_none());

        let previous = engine.insert(entity("a", -10.0, -10.0)).unwrap();
        assert_eq!(previous.unwrap().location(), Point::new(10.0, 10.0).unwrap());
        assert_eq!(engine.len(), 1);

        assert!(engine.query(None, None, &cells(&["c"])).unwrap().is_empty());
        assert_eq!(engine.query(None, None, &cells(&["3"])).unwrap().len(), 1);
        assert_eq!(engine.stats().cell_count, 13);
    }

    #[test]
    fn test_remove_and_clear() {
        let engine = MemoryQueryEngine::new();
        engine
            .insert_all(vec![entity("a", 1.0, 1.0), entity("b", 2.0, 2.0)])
            .unwrap();

        assert!(engine.remove("a").is_some());
        assert!(engine.remove("a").is_none());
        assert!(!engine.contains("a"));
        assert!(engine.get("b").is_some());

        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.stats().cell_count, 0);
    }

    #[test]
    fn test_query_deduplicates_across_cells() {
        let engine = MemoryQueryEngine::new();
        engine.insert(entity("a", 10.0, 10.0)).unwrap();

        let location = Point::new(10.0, 10.0).unwrap();
        let all = generate_geocells(&location).unwrap();
        assert_eq!(engine.query(None, None, &all).unwrap().len(), 1);
    }

    #[test]
    fn test_query_rejects_bad_cells() {
        let engine: MemoryQueryEngine<GeoEntity> = MemoryQueryEngine::new();
        assert!(engine.query(None, None, &cells(&["xyz"])).is_err());
    }

    #[test]
    fn test_base_query_filter() {
        let engine = MemoryQueryEngine::new();
        engine
            .insert_all(vec![
                entity("a", 10.0, 10.0)
                    .with_property("category", json!("cafe"))
                    .with_property("rating", json!(4.5)),
                entity("b", 10.1, 10.1)
                    .with_property("category", json!("cafe"))
                    .with_property("rating", json!(3)),
                entity("c", 10.2, 10.2).with_property("category", json!("bar")),
            ])
            .unwrap();

        let query = GeocellQuery::new(
            "category == cat && rating >= minRating",
            vec![json!("cafe"), json!(4)],
        )
        .unwrap();

        let found = engine.query(Some(&query), None, &cells(&["c"])).unwrap();
        let keys: Vec<&str> = found.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn test_order_by_field() {
        let engine = MemoryQueryEngine::new();
        engine
            .insert_all(vec![
                entity("a", 10.0, 10.0).with_property("rank", json!(2)),
                entity("b", 10.1, 10.1).with_property("rank", json!(1)),
                entity("c", 10.2, 10.2),
                entity("d", 10.3, 10.3).with_property("rank", json!(3)),
            ])
            .unwrap();

        let keys = |order: &str| -> Vec<String> {
            engine
                .query(None, Some(order), &cells(&["c"]))
                .unwrap()
                .into_iter()
                .map(|e| e.key().to_string())
                .collect()
        };

        assert_eq!(keys("rank"), vec!["b", "a", "d", "c"]);
        assert_eq!(keys("-rank"), vec!["d", "a", "b", "c"]);
        assert_eq!(keys("latitude"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_unordered_results_sorted_by_key() {
        let engine = MemoryQueryEngine::new();
        for key in ["m", "b", "x", "a"] {
            engine.insert(entity(key, 10.0, 10.0)).unwrap();
        }
        let found = engine.query(None, None, &cells(&["c"])).unwrap();
        let keys: Vec<&str> = found.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["a", "b", "m", "x"]);
    }

    #[test]
    fn test_entity_fields() {
        let e = entity("k", 1.5, -2.5).with_property("name", json!("n"));
        assert_eq!(e.field("key"), Some(json!("k")));
        assert_eq!(e.field("latitude"), Some(json!(1.5)));
        assert_eq!(e.field("longitude"), Some(json!(-2.5)));
        assert_eq!(e.field("name"), Some(json!("n")));
        assert_eq!(e.field("missing"), None);
    }

    #[test]
    fn test_entity_serde_roundtrip() {
        let e = entity("k", 1.5, -2.5)
            .with_property("name", json!("n"))
            .with_data(Bytes::from_static(b"payload"));
        let json = serde_json::to_string(&e).unwrap();
        let back: GeoEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let engine = Arc::new(MemoryQueryEngine::new());
        let writer = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..200 {
                    engine
                        .insert(entity(&format!("w{}", i), 10.0 + i as f64 * 0.01, 10.0))
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..50 {
                        engine.query(None, None, &cells(&["c"])).unwrap();
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(engine.len(), 200);
        assert_eq!(engine.stats().query_count, 200);
    }
}
