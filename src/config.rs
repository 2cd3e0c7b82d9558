//! Query-catalog configuration.
//!
//! Export tooling usually declares its queries in a configuration document
//! rather than in code. `QuerySetConfig` is that document's schema: it is
//! created once at the application boundary (from a JSON file or an embedding
//! host's config layer) and turned into a [`QuerySet`] before decoding
//! starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BufrqError;
use crate::query_set::QuerySet;

/// One named query in the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    /// The export name the result is retrieved under.
    pub name: String,
    /// The query string, e.g. `*/BRITCSTC/TMBR` or a bracketed list.
    pub query: String,
}

/// The full catalog: an optional subset allowlist plus the named queries.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct QuerySetConfig {
    /// Subset tags to limit decoding to. Empty means no explicit limit.
    #[serde(default)]
    pub subsets: Vec<String>,

    /// The named queries, applied in order. A repeated name replaces the
    /// earlier entry, matching `QuerySet::add` semantics.
    #[serde(default)]
    pub queries: Vec<QueryEntry>,
}

impl QuerySetConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BufrqError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BufrqError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds the query set, parsing every query string.
    pub fn into_query_set(self) -> Result<QuerySet, BufrqError> {
        let mut query_set = QuerySet::with_subsets(self.subsets);
        for entry in &self.queries {
            query_set.add(&entry.name, &entry.query)?;
        }
        Ok(query_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_round_trip() {
        let json = r#"{
            "subsets": ["NC000001"],
            "queries": [
                {"name": "latitude", "query": "*/CLAT"},
                {"name": "brightness", "query": "[*/BRITCSTC/TMBR, */BRITHSTC/TMBR]"}
            ]
        }"#;

        let config = QuerySetConfig::from_json_str(json).unwrap();
        assert_eq!(config.subsets, vec!["NC000001".to_string()]);
        assert_eq!(config.queries.len(), 2);

        let query_set = config.into_query_set().unwrap();
        assert_eq!(
            query_set.names(),
            vec!["brightness".to_string(), "latitude".to_string()]
        );
        assert_eq!(query_set.queries_for("brightness").unwrap().len(), 2);
        assert!(query_set.includes_subset("NC000001"));
        assert!(!query_set.includes_subset("NC000002"));
    }

    #[test]
    fn test_missing_sections_default() {
        let config = QuerySetConfig::from_json_str("{}").unwrap();
        assert!(config.subsets.is_empty());
        assert!(config.queries.is_empty());

        let query_set = config.into_query_set().unwrap();
        assert!(query_set.includes_subset("anything"));
    }

    #[test]
    fn test_bad_query_string_is_rejected() {
        let config = QuerySetConfig::from_json_str(
            r#"{"queries": [{"name": "broken", "query": "NC000001"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            config.into_query_set(),
            Err(BufrqError::InvalidQueryPath(..))
        ));
    }

    #[test]
    fn test_malformed_json_errors() {
        assert!(matches!(
            QuerySetConfig::from_json_str("{not json"),
            Err(BufrqError::SerdeJson(_))
        ));
    }
}
