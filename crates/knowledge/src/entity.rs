//! Extracted entities and their validation.
//!
//! The extraction tool returns loosely-typed JSON. `ExtractedEntities::parse`
//! is the only way in: it drops duplicate records, then checks every record
//! against the `Entity` shape and fails with `AppError::Validation` otherwise.

use liftrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Value the model uses when it cannot identify an elevator.
pub const UNKNOWN_ENTITY: &str = "unknown";

/// One elevator mentioned in a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical model name, e.g. "Elevador PVE 30"
    #[serde(rename = "Elevator", default)]
    pub elevator: Option<String>,
}

impl Entity {
    pub fn new(elevator: impl Into<String>) -> Self {
        Self {
            elevator: Some(elevator.into()),
        }
    }

    /// The identified model, or `None` when absent or `"unknown"`.
    pub fn known_elevator(&self) -> Option<&str> {
        self.elevator
            .as_deref()
            .filter(|value| *value != UNKNOWN_ENTITY)
    }
}

/// Entities extracted from one query, first occurrence order, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedEntities {
    entities: Vec<Entity>,
}

impl ExtractedEntities {
    /// Collect entities, dropping later duplicates.
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut seen = HashSet::new();
        let entities = entities
            .into_iter()
            .filter(|entity| seen.insert(entity.clone()))
            .collect();
        Self { entities }
    }

    /// Parse the extraction tool input, `{"entities": [{"Elevator": ..}, ..]}`.
    pub fn parse(payload: &Value) -> AppResult<Self> {
        let raw = payload
            .get("entities")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Extraction payload has no 'entities' array: {}",
                    payload
                ))
            })?;

        let entities = remove_duplicates(raw)
            .into_iter()
            .enumerate()
            .map(|(index, value)| parse_entity(index, value))
            .collect::<AppResult<Vec<_>>>()?;

        // Records differing only in ignored fields collapse here
        Ok(Self::new(entities))
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn first(&self) -> Option<&Entity> {
        self.entities.first()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Drop records that repeat an earlier record field for field.
///
/// Each object is canonicalized by sorting its fields, so key order does not
/// matter. First-seen order is preserved.
pub fn remove_duplicates(entities: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|entity| seen.insert(canonical_key(entity)))
        .cloned()
        .collect()
}

fn canonical_key(entity: &Value) -> Vec<(String, String)> {
    match entity.as_object() {
        Some(fields) => {
            let mut pairs: Vec<(String, String)> = fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect();
            pairs.sort();
            pairs
        }
        None => vec![(String::new(), entity.to_string())],
    }
}

fn parse_entity(index: usize, value: Value) -> AppResult<Entity> {
    if !value.is_object() {
        return Err(AppError::Validation(format!(
            "Entity {} is not an object: {}",
            index, value
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Entity {} is malformed: {}", index, e)))
}
