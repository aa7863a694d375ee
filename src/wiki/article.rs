// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Article nodes.
//!
//! An __article__ is one node of the wiki tree. It is backed either by a
//! single file (a __leaf__), or by a directory holding an index file plus
//! the files of its children (a __category__). Which of the two it is
//! follows from whether it has children, and flipping between them always
//! moves files around on disk. See [`sync`](crate::wiki::sync) for those
//! transitions.
//!
//! Articles live in an arena owned by [`Wiki`](crate::wiki::Wiki). Parents
//! own the ordered list of their children's ids, while children only keep
//! their parent's id as a back-reference.

use crate::wiki::changes::ChangeSet;

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stable identity of an article within its wiki.
///
/// Ids survive renames and moves. They are never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArticleId(pub(crate) usize);

impl Display for ArticleId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "#{}", self.0)
    }
}

/// Materialization of an article on disk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ArticleKind {
    /// Single file at `<path><file_kind>`.
    #[default]
    Leaf,

    /// Directory at `<path>` with content in `<path>/_index<file_kind>`.
    Category,
}

/// A single node of the wiki tree.
#[derive(Debug, Clone)]
pub struct Article {
    pub(crate) name: String,
    pub(crate) file_name: String,
    pub(crate) file_kind: String,
    pub(crate) kind: ArticleKind,
    pub(crate) parent: Option<ArticleId>,
    pub(crate) children: Vec<ArticleId>,
    pub(crate) text: Option<String>,
    pub(crate) modified: bool,
    pub(crate) pending: ChangeSet,
    pub(crate) links: Vec<ArticleId>,
}

impl Article {
    /// Construct new detached article.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        file_kind: impl Into<String>,
        kind: ArticleKind,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            file_kind: file_kind.into(),
            kind,
            parent: None,
            children: Vec::new(),
            text: None,
            modified: false,
            pending: ChangeSet::new(),
            links: Vec::new(),
        }
    }

    /// Display name, taken from the heading line when there is one.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File system safe name, without file kind.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File kind including its leading dot, e.g., ".md".
    pub fn file_kind(&self) -> &str {
        &self.file_kind
    }

    pub fn kind(&self) -> ArticleKind {
        self.kind
    }

    pub fn is_category(&self) -> bool {
        self.kind == ArticleKind::Category
    }

    pub fn parent(&self) -> Option<ArticleId> {
        self.parent
    }

    pub fn children(&self) -> &[ArticleId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if cached text differs from what was last written to disk.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Paths touched since the last commit.
    pub fn pending(&self) -> &ChangeSet {
        &self.pending
    }

    /// Articles this article links to, as of its current text.
    pub fn links(&self) -> &[ArticleId] {
        &self.links
    }

    pub(crate) fn has_file_name(&self, file_name: &str) -> bool {
        self.file_name.to_lowercase() == file_name.to_lowercase()
    }

    pub(crate) fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl Display for Article {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.name)
    }
}

/// Canonicalize line endings to line feeds only.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Extract display name from a leading heading line.
///
/// Only the very first line counts. It must start with '#', and must have
/// something left after the markers are trimmed off.
pub fn heading_name(text: &str) -> Option<String> {
    let first = text.lines().next()?;
    let heading = first.strip_prefix('#')?.trim_start_matches('#').trim();
    if heading.is_empty() {
        None
    } else {
        Some(heading.to_string())
    }
}

/// Replace title of leading heading, keeping its level.
///
/// Returns `None` if text does not start with a non-empty heading.
pub fn retitle(text: &str, name: &str) -> Option<String> {
    heading_name(text)?;
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (text, None),
    };
    let level = first.chars().take_while(|ch| *ch == '#').count();

    let mut retitled = format!("{} {name}", "#".repeat(level));
    if let Some(rest) = rest {
        retitled.push('\n');
        retitled.push_str(rest);
    }

    Some(retitled)
}
