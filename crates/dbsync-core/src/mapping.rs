//! Remote-to-local path mapping
//!
//! A [`PathMapper`] holds (remote root -> local root) rules and rewrites a
//! linked table's stored path to its local equivalent. Roots are compared
//! component by component, ignoring case, so `\\srv\data` matches
//! `\\SRV\Data\brass.mdb` but never `\\srv\database\x.mdb`. When several
//! remote roots match, the deepest one wins.

use dbsync_fs::NormalizedPath;

use crate::{Error, Result};

/// Association between a remote directory and its local counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    pub remote_root: NormalizedPath,
    pub local_root: NormalizedPath,
}

impl MappingRule {
    pub fn new(remote_root: NormalizedPath, local_root: NormalizedPath) -> Self {
        Self {
            remote_root,
            local_root,
        }
    }
}

/// Outcome of resolving one reference path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path lies under a remote root; this is its local equivalent
    Mapped(NormalizedPath),
    /// The path already lies under one of the local roots
    AlreadyLocal,
    /// No rule applies; the reference must be left alone
    Unresolved,
}

/// Rewrites remote paths to local ones using the most specific rule.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    /// Sorted deepest remote root first
    rules: Vec<MappingRule>,
}

impl PathMapper {
    /// Build a mapper, collapsing duplicate rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingRule`] when one remote root is mapped to
    /// two different local roots, and [`Error::ConfigInvalid`] for an empty
    /// remote root.
    pub fn new(rules: impl IntoIterator<Item = MappingRule>) -> Result<Self> {
        let mut kept: Vec<MappingRule> = Vec::new();

        for rule in rules {
            if rule.remote_root.is_empty() {
                return Err(Error::invalid("mapping rule", "remote root is empty"));
            }
            match kept
                .iter()
                .find(|k| k.remote_root.eq_ignore_case(&rule.remote_root))
            {
                Some(existing) if existing.local_root.eq_ignore_case(&rule.local_root) => {}
                Some(existing) => {
                    return Err(Error::ConflictingRule {
                        remote_root: rule.remote_root.to_string(),
                        first: existing.local_root.to_string(),
                        second: rule.local_root.to_string(),
                    });
                }
                None => kept.push(rule),
            }
        }

        // stable sort keeps configuration order among equal depths
        kept.sort_by(|a, b| b.remote_root.depth().cmp(&a.remote_root.depth()));
        Ok(Self { rules: kept })
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Map `reference` to its local equivalent.
    ///
    /// The remainder after the matched root keeps its original case and is
    /// joined to the local root with a single separator.
    pub fn resolve(&self, reference: &NormalizedPath) -> Resolution {
        let remote = self.rules.iter().find_map(|rule| {
            reference
                .strip_prefix_ignore_case(&rule.remote_root)
                .map(|rest| (rule, rest))
        });

        let local_depth = self
            .rules
            .iter()
            .filter(|rule| reference.starts_with_ignore_case(&rule.local_root))
            .map(|rule| rule.local_root.depth())
            .max();

        match (remote, local_depth) {
            (Some((rule, _)), Some(depth)) if depth >= rule.remote_root.depth() => {
                Resolution::AlreadyLocal
            }
            (Some((rule, rest)), _) if rest.is_empty() => {
                Resolution::Mapped(rule.local_root.clone())
            }
            (Some((rule, rest)), _) => Resolution::Mapped(rule.local_root.join(rest)),
            (None, Some(_)) => Resolution::AlreadyLocal,
            (None, None) => Resolution::Unresolved,
        }
    }
}
