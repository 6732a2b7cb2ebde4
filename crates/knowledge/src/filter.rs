//! Metadata filter construction from extracted entities.

use crate::entity::ExtractedEntities;
use crate::ingest::allow_list_from_corpus;
use liftrag_core::config::FilterSettings;
use liftrag_core::AppResult;
use liftrag_llm::{FilterClause, MetadataFilter};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Metadata key the corpus stores the elevator model under.
pub const ELEVATOR_KEY: &str = "Elevator";

/// Builds knowledge-base filters from extracted entities.
///
/// A lenient builder accepts any identified model. A strict builder only
/// accepts models on its allow-list and drops the whole filter otherwise.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    allow_list: Option<BTreeSet<String>>,
}

impl FilterBuilder {
    pub fn lenient() -> Self {
        Self { allow_list: None }
    }

    pub fn strict<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_list: Some(allowed.into_iter().map(Into::into).collect()),
        }
    }

    /// Builder for the configured mode.
    ///
    /// In strict mode the allow-list is the configured values plus, when
    /// `corpus` is set, the models found in that corpus.
    pub fn from_settings(settings: &FilterSettings) -> AppResult<Self> {
        if !settings.strict {
            return Ok(Self::lenient());
        }

        let mut allowed: BTreeSet<String> = settings.allowed_values.iter().cloned().collect();
        if let Some(ref corpus) = settings.corpus {
            allowed.extend(allow_list_from_corpus(corpus)?);
        }
        debug!("Strict filtering with {} known models", allowed.len());

        Ok(Self::strict(allowed))
    }

    pub fn is_strict(&self) -> bool {
        self.allow_list.is_some()
    }

    /// Known values, sorted (empty for a lenient builder).
    pub fn allowed_values(&self) -> Vec<&str> {
        self.allow_list
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Filter for the given extraction, or `None` when retrieval should not be narrowed.
    ///
    /// Only the first entity is considered. An absent or `"unknown"` model yields
    /// no clause; zero clauses and values outside the allow-list are checked
    /// independently and both give `None`.
    pub fn build(&self, extracted: Option<&ExtractedEntities>) -> Option<MetadataFilter> {
        let entity = extracted?.first()?;

        if let Some(extra) = extracted.map(|e| e.len().saturating_sub(1)).filter(|n| *n > 0) {
            debug!("Ignoring {} additional extracted entities", extra);
        }

        let clauses: Vec<FilterClause> = entity
            .known_elevator()
            .map(|value| FilterClause {
                key: ELEVATOR_KEY.to_string(),
                value: value.to_string(),
            })
            .into_iter()
            .collect();

        let filter = MetadataFilter::all_of(clauses)?;

        if let Some(ref allowed) = self.allow_list {
            if let Some(rejected) = filter
                .clauses()
                .into_iter()
                .find(|clause| !allowed.contains(&clause.value))
            {
                info!(
                    "'{}' is not a known elevator model, searching without a filter",
                    rejected.value
                );
                return None;
            }
        }

        Some(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use serde_json::json;

    const KNOWN: [&str; 3] = ["Elevador PVE 30", "Elevador PVE 37", "Elevador PVE 52"];

    fn extracted(values: &[&str]) -> ExtractedEntities {
        ExtractedEntities::new(values.iter().map(|v| Entity::new(*v)))
    }

    #[test]
    fn test_absent_extraction() {
        assert_eq!(FilterBuilder::lenient().build(None), None);
    }

    #[test]
    fn test_no_entities() {
        let empty = ExtractedEntities::default();
        assert_eq!(FilterBuilder::lenient().build(Some(&empty)), None);
    }

    #[test]
    fn test_single_entity_is_bare_clause() {
        let filter = FilterBuilder::lenient()
            .build(Some(&extracted(&["Elevador PVE 30"])))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"equals": {"key": "Elevator", "value": "Elevador PVE 30"}})
        );
    }

    #[test]
    fn test_unknown_entity() {
        let builder = FilterBuilder::lenient();
        assert_eq!(builder.build(Some(&extracted(&["unknown"]))), None);

        let absent = ExtractedEntities::new([Entity { elevator: None }]);
        assert_eq!(builder.build(Some(&absent)), None);
    }

    #[test]
    fn test_only_first_entity_used() {
        let filter = FilterBuilder::lenient()
            .build(Some(&extracted(&["Elevador PVE 37", "Elevador PVE 52"])))
            .unwrap();
        assert_eq!(filter, MetadataFilter::equals(ELEVATOR_KEY, "Elevador PVE 37"));
    }

    #[test]
    fn test_unknown_first_entity_wins_over_later_known() {
        let builder = FilterBuilder::lenient();
        assert_eq!(
            builder.build(Some(&extracted(&["unknown", "Elevador PVE 52"]))),
            None
        );
    }

    #[test]
    fn test_strict_accepts_known_value() {
        let builder = FilterBuilder::strict(KNOWN);
        let filter = builder.build(Some(&extracted(&["Elevador PVE 52"])));
        assert_eq!(filter, Some(MetadataFilter::equals(ELEVATOR_KEY, "Elevador PVE 52")));
    }

    #[test]
    fn test_strict_rejects_unknown_value() {
        let builder = FilterBuilder::strict(KNOWN);
        assert_eq!(builder.build(Some(&extracted(&["Elevador XYZ 99"]))), None);
    }

    #[test]
    fn test_lenient_keeps_unlisted_value() {
        let builder = FilterBuilder::lenient();
        assert!(builder.build(Some(&extracted(&["Elevador XYZ 99"]))).is_some());
    }

    #[test]
    fn test_strict_with_empty_entities() {
        let builder = FilterBuilder::strict(KNOWN);
        assert_eq!(builder.build(Some(&ExtractedEntities::default())), None);
    }

    #[test]
    fn test_deterministic() {
        let builder = FilterBuilder::strict(KNOWN);
        let input = extracted(&["Elevador PVE 30"]);
        assert_eq!(builder.build(Some(&input)), builder.build(Some(&input)));
    }

    #[test]
    fn test_from_settings() {
        let settings = FilterSettings::default();
        let builder = FilterBuilder::from_settings(&settings).unwrap();
        assert!(builder.is_strict());
        assert_eq!(builder.allowed_values(), KNOWN.to_vec());

        let lenient = FilterSettings {
            strict: false,
            ..FilterSettings::default()
        };
        assert!(!FilterBuilder::from_settings(&lenient).unwrap().is_strict());
    }

    #[test]
    fn test_from_settings_merges_corpus() {
        use crate::ingest::{write_corpus, CorpusRecord, RecordMetadata};

        let temp = tempfile::TempDir::new().unwrap();
        let corpus = temp.path().join("info.json");
        let record = CorpusRecord {
            file_name: "ficha.txt".to_string(),
            content: vec!["Capacidad".to_string()],
            metadata: Some(RecordMetadata {
                elevator: "Elevador PVE 80".to_string(),
            }),
        };
        write_corpus(&corpus, &[record]).unwrap();

        let settings = FilterSettings {
            corpus: Some(corpus),
            ..FilterSettings::default()
        };
        let builder = FilterBuilder::from_settings(&settings).unwrap();
        assert!(builder
            .build(Some(&extracted(&["Elevador PVE 80"])))
            .is_some());
        assert!(builder
            .build(Some(&extracted(&["Elevador PVE 30"])))
            .is_some());
    }

    #[test]
    fn test_allowed_values_sorted() {
        let builder = FilterBuilder::strict(["b", "a"]);
        assert!(builder.is_strict());
        assert_eq!(builder.allowed_values(), vec!["a", "b"]);
        assert!(FilterBuilder::lenient().allowed_values().is_empty());
    }
}
