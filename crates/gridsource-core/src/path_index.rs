//! Hierarchical index over flat metric identifiers.
//!
//! Identifiers look like `/domain/location/leaf`. The domain is the first
//! segment and the leaf the last; everything in between (slashes
//! included) is the location, so `/dc1/row4/rackA/temp` lands under
//! domain `dc1`, location `row4/rackA`.
//!
//! ```text
//! MetricTree
//!   └── domain
//!         └── location
//!               └── [leaf, leaf, ...]   (insertion order)
//! ```

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};

/// domain → location → leaves, all in order of first sighting.
pub type MetricTree = IndexMap<String, IndexMap<String, Vec<String>>>;

/// The three parts of a parsed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricPath<'a> {
    pub domain: &'a str,
    pub location: &'a str,
    pub leaf: &'a str,
}

impl<'a> MetricPath<'a> {
    /// Split `/domain/location/leaf` into its parts.
    pub fn parse(identifier: &'a str) -> CoreResult<Self> {
        let malformed = |reason| CoreError::MalformedMetricIdentifier {
            identifier: identifier.to_string(),
            reason,
        };

        let rest = identifier
            .strip_prefix('/')
            .ok_or_else(|| malformed("must start with '/'"))?;
        let (domain, rest) = rest
            .split_once('/')
            .ok_or_else(|| malformed("expected three segments"))?;
        let (location, leaf) = rest
            .rsplit_once('/')
            .ok_or_else(|| malformed("expected three segments"))?;

        if domain.is_empty() {
            return Err(malformed("empty domain"));
        }
        if location.is_empty() {
            return Err(malformed("empty location"));
        }
        if leaf.is_empty() {
            return Err(malformed("empty leaf"));
        }

        Ok(Self {
            domain,
            location,
            leaf,
        })
    }

    /// Recompose a full identifier.
    pub fn compose(domain: &str, location: &str, leaf: &str) -> String {
        format!("/{domain}/{location}/{leaf}")
    }
}

/// Every identifier containing `needle` as a literal substring, in input order.
pub fn filter(identifiers: &[String], needle: &str) -> Vec<String> {
    identifiers
        .iter()
        .filter(|m| m.contains(needle))
        .cloned()
        .collect()
}

/// Flat identifier list plus its domain/location/leaf tree.
#[derive(Debug, Clone, Default)]
pub struct MetricPathIndex {
    identifiers: Vec<String>,
    tree: MetricTree,
    rejected: Vec<String>,
}

impl MetricPathIndex {
    /// Build the index. Malformed identifiers are logged and recorded in
    /// [`rejected`](Self::rejected) but never abort the build.
    pub fn build<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();

        for identifier in identifiers {
            let identifier = identifier.into();
            match MetricPath::parse(&identifier) {
                Ok(path) => {
                    index
                        .tree
                        .entry(path.domain.to_string())
                        .or_default()
                        .entry(path.location.to_string())
                        .or_default()
                        .push(path.leaf.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "skipping metric identifier");
                    index.rejected.push(identifier.clone());
                }
            }
            index.identifiers.push(identifier);
        }

        debug!(
            identifiers = index.identifiers.len(),
            domains = index.tree.len(),
            rejected = index.rejected.len(),
            "metric path index built"
        );
        index
    }

    /// All identifiers the index was built from, including rejected ones.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn tree(&self) -> &MetricTree {
        &self.tree
    }

    pub fn search(&self, needle: &str) -> Vec<String> {
        filter(&self.identifiers, needle)
    }

    pub fn domains(&self) -> Vec<String> {
        self.tree.keys().cloned().collect()
    }

    /// Locations under `domain`; empty if the domain is unknown.
    pub fn locations(&self, domain: &str) -> Vec<String> {
        self.tree
            .get(domain)
            .map(|locations| locations.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Full identifiers of every leaf under `domain`/`location`.
    pub fn leaves(&self, domain: &str, location: &str) -> Vec<String> {
        self.tree
            .get(domain)
            .and_then(|locations| locations.get(location))
            .map(|leaves| {
                leaves
                    .iter()
                    .map(|leaf| MetricPath::compose(domain, location, leaf))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetricPathIndex {
        MetricPathIndex::build(["/dc1/rackA/temp", "/dc1/rackA/humidity", "/dc1/rackB/temp"])
    }

    #[test]
    fn parse_three_segments() {
        let path = MetricPath::parse("/dc1/rackA/temp").unwrap();
        assert_eq!(path.domain, "dc1");
        assert_eq!(path.location, "rackA");
        assert_eq!(path.leaf, "temp");
    }

    #[test]
    fn parse_captures_nested_location_greedily() {
        let path = MetricPath::parse("/dc1/row4/rackA/temp").unwrap();
        assert_eq!(path.domain, "dc1");
        assert_eq!(path.location, "row4/rackA");
        assert_eq!(path.leaf, "temp");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["dc1/rackA/temp", "/dc1/temp", "/dc1", "/dc1//temp", "/dc1/rackA/", "//rackA/temp", ""] {
            assert!(MetricPath::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn tree_round_trip() {
        let index = sample();
        assert_eq!(index.domains(), vec!["dc1"]);
        assert_eq!(index.locations("dc1"), vec!["rackA", "rackB"]);
        assert_eq!(
            index.leaves("dc1", "rackA"),
            vec!["/dc1/rackA/temp", "/dc1/rackA/humidity"]
        );
        assert_eq!(index.leaves("dc1", "rackB"), vec!["/dc1/rackB/temp"]);
    }

    #[test]
    fn malformed_identifiers_are_recorded_not_fatal() {
        let index = MetricPathIndex::build(["/dc1/rackA/temp", "bogus", "/dc2/x"]);
        assert_eq!(index.rejected(), &["bogus".to_string(), "/dc2/x".to_string()]);
        assert_eq!(index.domains(), vec!["dc1"]);
        assert_eq!(index.identifiers().len(), 3);
    }

    #[test]
    fn build_is_deterministic() {
        let a = sample();
        let b = sample();
        assert_eq!(a.tree(), b.tree());
    }

    #[test]
    fn unknown_paths_are_empty() {
        let index = sample();
        assert!(index.locations("dc9").is_empty());
        assert!(index.leaves("dc1", "rackZ").is_empty());
    }

    #[test]
    fn filter_is_literal_and_ordered() {
        let ids: Vec<String> = ["/a/b/temp", "/a/b/hum", "/c/d/temp.max", "/c/d/t.mp"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(filter(&ids, "temp"), vec!["/a/b/temp", "/c/d/temp.max"]);
        // `.` is not a wildcard.
        assert_eq!(filter(&ids, "t.m"), vec!["/c/d/t.mp"]);
    }
}
