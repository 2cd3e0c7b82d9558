//! The declarative catalog of named queries with subset filtering.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::BufrqError;
use crate::query::{parse_query_str, Query, SubsetFilter};

/// A named catalog of queries, built up-front before any decoding starts.
///
/// A `QuerySet` may be constructed with an allowlist of subset tags; as
/// queries are added, `present_subsets` tracks exactly the subsets named by
/// the queries and converges to the allowlist whenever an any-subset query is
/// present. [`QuerySet::includes_subset`] is what a decoder consults to skip
/// messages no query cares about.
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    includes_all_subsets: bool,
    add_has_been_called: bool,
    limit_subsets: BTreeSet<String>,
    present_subsets: BTreeSet<String>,
    query_map: BTreeMap<String, Vec<Query>>,
}

impl QuerySet {
    /// An unrestricted query set: every subset is included until queries say
    /// otherwise.
    pub fn new() -> Self {
        QuerySet {
            includes_all_subsets: true,
            ..QuerySet::default()
        }
    }

    /// A query set limited to the given subset tags. An empty list means no
    /// explicit limit.
    pub fn with_subsets<I, S>(subsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let limit_subsets: BTreeSet<String> = subsets.into_iter().map(Into::into).collect();
        QuerySet {
            includes_all_subsets: limit_subsets.is_empty(),
            limit_subsets,
            ..QuerySet::default()
        }
    }

    /// Parses `query_str` and stores the result under `name`, replacing any
    /// prior entry for the same name.
    pub fn add(&mut self, name: &str, query_str: &str) -> Result<(), BufrqError> {
        let queries = parse_query_str(query_str)?;
        self.add_queries(name, queries);
        Ok(())
    }

    /// Stores already-parsed queries under `name`. This is the seam for
    /// collaborators that carry their own query grammar.
    pub fn add_queries(&mut self, name: &str, queries: Vec<Query>) {
        if !self.add_has_been_called {
            self.add_has_been_called = true;
            self.includes_all_subsets = false;
        }

        for query in &queries {
            if self.limit_subsets.is_empty() {
                self.includes_all_subsets = query.subset().is_any();
                if let SubsetFilter::Named(subset) = query.subset() {
                    self.present_subsets.insert(subset.clone());
                }
            } else if query.subset().is_any() {
                self.present_subsets = self.limit_subsets.clone();
            } else if let SubsetFilter::Named(subset) = query.subset() {
                self.present_subsets.insert(subset.clone());
                self.present_subsets = self
                    .present_subsets
                    .intersection(&self.limit_subsets)
                    .cloned()
                    .collect();
            }
        }

        self.query_map.insert(name.to_string(), queries);
    }

    /// Whether messages tagged `subset` are of interest to this query set.
    pub fn includes_subset(&self, subset: &str) -> bool {
        if self.includes_all_subsets {
            return true;
        }

        if self.query_map.is_empty() {
            self.limit_subsets.contains(subset)
        } else {
            self.present_subsets.contains(subset)
        }
    }

    /// The query names, in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.query_map.keys().cloned().collect()
    }

    /// The queries stored under `name`.
    pub fn queries_for(&self, name: &str) -> Result<&[Query], BufrqError> {
        self.query_map
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| BufrqError::UnknownName(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.query_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.query_map.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn present_subsets(&self) -> &BTreeSet<String> {
        &self.present_subsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_set_includes_everything() {
        let query_set = QuerySet::new();
        assert!(query_set.includes_subset("NC000001"));
        assert!(query_set.includes_subset("anything"));
    }

    #[test]
    fn test_allowlist_without_queries() {
        let query_set = QuerySet::with_subsets(["NC000001", "NC000002"]);
        assert!(query_set.includes_subset("NC000002"));
        assert!(!query_set.includes_subset("NC000003"));
    }

    #[test]
    fn test_any_subset_query_converges_to_allowlist() {
        let mut query_set = QuerySet::with_subsets(["NC000001"]);
        query_set.add("T", "*/BRIT/TMBR").unwrap();

        assert_eq!(
            query_set.present_subsets().iter().collect::<Vec<_>>(),
            vec!["NC000001"]
        );
        assert!(query_set.includes_subset("NC000001"));
        assert!(!query_set.includes_subset("NC000002"));
    }

    #[test]
    fn test_named_queries_intersect_with_allowlist() {
        let mut query_set = QuerySet::with_subsets(["NC000001", "NC000002"]);
        query_set.add("lat", "NC000001/CLAT").unwrap();
        query_set.add("lon", "NC000009/CLON").unwrap();

        // NC000009 is outside the allowlist and must not survive.
        assert!(query_set.includes_subset("NC000001"));
        assert!(!query_set.includes_subset("NC000009"));
    }

    #[test]
    fn test_named_queries_without_allowlist() {
        let mut query_set = QuerySet::new();
        query_set.add("lat", "NC000001/CLAT").unwrap();

        assert!(query_set.includes_subset("NC000001"));
        assert!(!query_set.includes_subset("NC000002"));
    }

    #[test]
    fn test_any_subset_add_reenables_all_subsets() {
        let mut query_set = QuerySet::new();
        query_set.add("T", "*/BRIT/TMBR").unwrap();

        // The first add drops includes-all, the any-subset query restores it.
        assert!(query_set.includes_subset("NC999999"));
    }

    #[test]
    fn test_add_replaces_prior_entry() {
        let mut query_set = QuerySet::new();
        query_set.add("T", "*/BRIT/TMBR").unwrap();
        query_set.add("T", "[*/BRITCSTC/TMBR, */BRITHSTC/TMBR]").unwrap();

        assert_eq!(query_set.names(), vec!["T".to_string()]);
        assert_eq!(query_set.queries_for("T").unwrap().len(), 2);
    }

    #[test]
    fn test_names_are_sorted() {
        let mut query_set = QuerySet::new();
        query_set.add("zenith", "*/SAZA").unwrap();
        query_set.add("latitude", "*/CLAT").unwrap();

        assert_eq!(
            query_set.names(),
            vec!["latitude".to_string(), "zenith".to_string()]
        );
    }

    #[test]
    fn test_queries_for_unknown_name() {
        let query_set = QuerySet::new();
        assert!(matches!(
            query_set.queries_for("nope"),
            Err(BufrqError::UnknownName(_))
        ));
    }
}
