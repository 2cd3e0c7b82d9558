//! Query value types and the query-path grammar.
//!
//! A query names one leaf of the BUFR repetition tree by a slash-delimited
//! path whose first component selects the message subset (`*` admits any
//! subset). The decoder resolves parsed queries against the message schema;
//! this module only carries the declarative form.

use std::fmt;

use crate::error::BufrqError;

/// The subset selector of a query: either any message type, or one named
/// subset tag such as `NC000001`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubsetFilter {
    Any,
    Named(String),
}

impl SubsetFilter {
    pub fn is_any(&self) -> bool {
        matches!(self, SubsetFilter::Any)
    }

    /// The subset tag, or `*` for the any-subset filter.
    pub fn name(&self) -> &str {
        match self {
            SubsetFilter::Any => "*",
            SubsetFilter::Named(name) => name,
        }
    }
}

/// One parsed query: a subset filter plus the component path to a leaf node.
///
/// `Query` values are immutable once parsed. The same type also represents
/// the dimension paths a decoder attaches to a field's target, so that group
/// -by validation can compare paths component-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    subset: SubsetFilter,
    path: Vec<String>,
}

impl Query {
    pub fn new<I, S>(subset: SubsetFilter, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query {
            subset,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subset(&self) -> &SubsetFilter {
        &self.subset
    }

    /// Path components below the subset root.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Parses a single `subset/COMP/...` path.
    pub fn parse(path_str: &str) -> Result<Self, BufrqError> {
        let comps = split_path(path_str);
        if comps.len() < 2 {
            return Err(BufrqError::InvalidQueryPath(
                path_str.to_string(),
                "a query needs a subset component and at least one node".to_string(),
            ));
        }

        let subset = match comps[0] {
            "*" => SubsetFilter::Any,
            name => SubsetFilter::Named(name.to_string()),
        };

        Ok(Query::new(subset, comps[1..].iter().copied()))
    }
}

/// Renders the canonical `subset/COMP/...` form. This string is what dim-path
/// comparison and error messages operate on.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subset.name())?;
        for comp in &self.path {
            write!(f, "/{}", comp)?;
        }
        Ok(())
    }
}

/// Breaks a slash-delimited path into components, dropping empty ones (a
/// leading or doubled `/` contributes nothing).
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|comp| !comp.is_empty()).collect()
}

/// Parses a query string into one or more queries.
///
/// Accepts a single path (`*/ROSEQ1/FOST`) or a bracketed, comma-separated
/// list (`[*/BRITCSTC/TMBR, */BRITHSTC/TMBR]`). Components may carry a
/// trailing occurrence suffix (`CLAT[2]`), which is kept as part of the
/// component.
pub fn parse_query_str(query_str: &str) -> Result<Vec<Query>, BufrqError> {
    let trimmed = query_str.trim();

    let inner = if trimmed.starts_with('[') {
        match trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(inner) => inner,
            None => {
                return Err(BufrqError::InvalidQueryPath(
                    query_str.to_string(),
                    "unterminated query list".to_string(),
                ))
            }
        }
    } else {
        trimmed
    };

    let queries = inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Query::parse)
        .collect::<Result<Vec<_>, _>>()?;

    if queries.is_empty() {
        return Err(BufrqError::InvalidQueryPath(
            query_str.to_string(),
            "no query paths given".to_string(),
        ));
    }

    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_drops_empty_components() {
        assert_eq!(split_path("/a//b/c/"), vec!["a", "b", "c"]);
        assert_eq!(split_path(""), Vec::<&str>::new());
        assert_eq!(split_path("*/ROSEQ1/FOST"), vec!["*", "ROSEQ1", "FOST"]);
    }

    #[test]
    fn test_parse_any_subset_query() {
        let query = Query::parse("*/ROSEQ1/ROSEQ2/FOST").unwrap();
        assert!(query.subset().is_any());
        assert_eq!(query.path(), ["ROSEQ1", "ROSEQ2", "FOST"]);
        assert_eq!(query.to_string(), "*/ROSEQ1/ROSEQ2/FOST");
    }

    #[test]
    fn test_parse_named_subset_query() {
        let query = Query::parse("NC000001/CLAT").unwrap();
        assert_eq!(query.subset(), &SubsetFilter::Named("NC000001".to_string()));
        assert_eq!(query.path(), ["CLAT"]);
    }

    #[test]
    fn test_parse_keeps_occurrence_suffix() {
        let query = Query::parse("*/ROSEQ1/CLATH[2]").unwrap();
        assert_eq!(query.path(), ["ROSEQ1", "CLATH[2]"]);
    }

    #[test]
    fn test_parse_multi_query_list() {
        let queries = parse_query_str("[*/BRITCSTC/TMBR, */BRITHSTC/TMBR]").unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].to_string(), "*/BRITCSTC/TMBR");
        assert_eq!(queries[1].to_string(), "*/BRITHSTC/TMBR");
    }

    #[test]
    fn test_parse_rejects_bare_subset() {
        assert!(Query::parse("NC000001").is_err());
        assert!(parse_query_str("").is_err());
    }

    #[test]
    fn test_parse_rejects_unterminated_list() {
        assert!(parse_query_str("[*/A/B, */C/D").is_err());
    }
}
