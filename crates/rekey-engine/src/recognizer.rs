//! Heuristic element/role classification.
//!
//! A recognizer is an ordered list of named pattern sets; each pattern set
//! maps role names to matchers that run against an element's canonical
//! attribute string. Two calling modes exist: form assembly
//! (`complete_match = true`), which yields at most one winning bucket, and
//! link classification (`complete_match = false`), which keeps every match.

use crate::element::PageElement;
use crate::{Error, Result};
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single matcher. Plain strings match as case-insensitive substrings;
/// the `regex:` prefix compiles the remainder as a regular expression,
/// mirroring the prefixed live-pattern syntax used for element targeting.
#[derive(Debug, Clone)]
pub enum Matcher {
    Substring(String),
    Pattern(Regex),
}

impl Matcher {
    /// Parse a matcher string, e.g. `"password"` or `"regex:(?i)log.?in"`.
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(v) = s.strip_prefix("regex:") {
            let re = Regex::new(v)
                .map_err(|e| Error::Config(format!("bad matcher regex '{}': {}", v, e)))?;
            return Ok(Matcher::Pattern(re));
        }
        Ok(Matcher::Substring(s.to_lowercase()))
    }

    /// Whether this matcher accepts the canonical string.
    pub fn matches(&self, canonical: &str) -> bool {
        match self {
            Matcher::Substring(needle) => canonical.to_lowercase().contains(needle),
            Matcher::Pattern(re) => re.is_match(canonical),
        }
    }
}

impl<'de> Deserialize<'de> for Matcher {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Matcher::parse(&s).map_err(de::Error::custom)
    }
}

/// Matchers for one role within a pattern set.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRule {
    /// Role name, e.g. "username", "submit", "changePassword".
    pub role: String,
    /// An element holds the role if any of these match.
    pub matchers: Vec<Matcher>,
}

/// A named, ordered set of role rules.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSet {
    pub name: String,
    pub roles: Vec<RoleRule>,
}

impl PatternSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Add a role with its matcher strings. Panics on an invalid regex;
    /// only used for the built-in rule tables, which are test-covered.
    pub(crate) fn role(mut self, role: &str, matchers: &[&str]) -> Self {
        let matchers = matchers
            .iter()
            .map(|m| Matcher::parse(m).expect("built-in matcher"))
            .collect();
        self.roles.push(RoleRule {
            role: role.to_string(),
            matchers,
        });
        self
    }

    /// Roles of this set that the element satisfies. An element may hold
    /// several roles at once.
    pub fn roles_of(&self, element: &PageElement) -> Vec<&str> {
        let canonical = element.canonical();
        self.roles
            .iter()
            .filter(|rule| rule.matchers.iter().any(|m| m.matches(&canonical)))
            .map(|rule| rule.role.as_str())
            .collect()
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} roles)", self.name, self.roles.len())
    }
}

/// Elements grouped by role for one pattern set.
#[derive(Debug, Clone)]
pub struct RoleBuckets {
    /// Index of the pattern set in the recognizer list.
    pub recognizer: usize,
    /// Role name → indices into the element slice, document order.
    pub by_role: BTreeMap<String, Vec<usize>>,
}

impl RoleBuckets {
    /// First element index assigned to `role`, if any.
    pub fn first(&self, role: &str) -> Option<usize> {
        self.by_role.get(role).and_then(|v| v.first().copied())
    }
}

fn bucket_for(elements: &[PageElement], set: &PatternSet, index: usize) -> RoleBuckets {
    let mut by_role: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, el) in elements.iter().enumerate() {
        if !el.visible {
            continue;
        }
        for role in set.roles_of(el) {
            by_role.entry(role.to_string()).or_default().push(i);
        }
    }
    RoleBuckets {
        recognizer: index,
        by_role,
    }
}

/// Classify elements against an ordered recognizer list.
///
/// With `complete_match` a pattern set qualifies only when every declared
/// role matched at least one element; among qualifying sets the one with
/// the most matched non-button input elements wins, ties broken by
/// earliest declaration, and exactly that one bucket is returned. Without
/// `complete_match` every set's bucket is returned with all matches kept.
pub fn find_item_buckets_by_recognizers(
    elements: &[PageElement],
    recognizers: &[PatternSet],
    complete_match: bool,
) -> Vec<RoleBuckets> {
    let buckets: Vec<RoleBuckets> = recognizers
        .iter()
        .enumerate()
        .map(|(i, set)| bucket_for(elements, set, i))
        .collect();

    if !complete_match {
        return buckets;
    }

    let mut winner: Option<(usize, RoleBuckets)> = None;
    for bucket in buckets {
        let set = &recognizers[bucket.recognizer];
        let complete = set
            .roles
            .iter()
            .all(|rule| bucket.by_role.get(&rule.role).is_some_and(|v| !v.is_empty()));
        if !complete {
            continue;
        }
        let mut matched: Vec<usize> = bucket.by_role.values().flatten().copied().collect();
        matched.sort_unstable();
        matched.dedup();
        let score = matched
            .iter()
            .filter(|&&i| elements[i].is_non_button_input())
            .count();
        // Strictly-greater keeps the earliest declaration on ties.
        if winner.as_ref().map_or(true, |(best, _)| score > *best) {
            winner = Some((score, bucket));
        }
    }
    winner.into_iter().map(|(_, b)| b).collect()
}
