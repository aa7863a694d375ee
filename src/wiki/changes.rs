// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pending change tracking.
//!
//! Mutating an article touches one or more physical paths. Those paths are
//! collected in a [`ChangeSet`] until the next commit stages all of them in
//! one go. Nothing is ever removed from a change set except by draining it
//! into a commit.

use crate::path::to_forward_slashes;

use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Set of relative paths awaiting the next commit.
///
/// # Invariant
///
/// - No duplicate paths.
/// - Paths always use forward slashes.
/// - Iteration order is stable, so staging order is reproducible.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    paths: BTreeSet<String>,
}

impl ChangeSet {
    /// Construct new empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a changed path.
    ///
    /// Returns true if the path was not recorded yet.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(to_forward_slashes(&path.into()))
    }

    /// Record a listing of changed paths.
    pub fn extend(&mut self, paths: impl IntoIterator<Item = impl Into<String>>) {
        for path in paths {
            self.insert(path);
        }
    }

    /// Check if path has been recorded.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&to_forward_slashes(path))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Iterate over recorded paths in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Take every recorded path, leaving the change set empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl IntoIterator for ChangeSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut changes = Self::new();
        changes.extend(iter);
        changes
    }
}

impl Display for ChangeSet {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let paths = self.iter().collect::<Vec<_>>();
        write!(fmt, "{}", paths.join(", "))
    }
}
