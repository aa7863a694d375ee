// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! A wiki knows three kinds of paths. A __wiki URL__ is the logical,
//! slash-separated path from the root article to some article using display
//! names, e.g., "Projects/Garden". A __physical path__ is the relative path
//! of an article's file or directory inside the repository, always written
//! with forward slashes because that is what the Git index stores. An
//! __absolute path__ is a physical path joined onto the repository's work
//! tree.
//!
//! Everything here is pure string manipulation. Walking the article tree to
//! build these paths is left to [`Wiki`](crate::wiki::Wiki).

use std::{cmp::Ordering, path::PathBuf};

/// Base name of the file holding a category's own content.
pub const INDEX_BASENAME: &str = "_index";

/// Name of the wiki configuration file at the repository root.
pub const CONFIG_FILE_NAME: &str = ".wikiconfig";

/// Separator used by wiki URLs and physical paths alike.
pub const SEPARATOR: char = '/';

/// Split wiki URL into its components.
///
/// Leading, trailing, and repeated separators are ignored, so "/a//b/" yields
/// `["a", "b"]`. An empty URL yields no components.
pub fn split_url(url: &str) -> Vec<&str> {
    url.trim_matches(SEPARATOR)
        .split(SEPARATOR)
        .filter(|component| !component.is_empty())
        .collect()
}

/// Join two relative paths with a forward slash.
///
/// An empty head means "repository root", so the tail is returned as-is.
pub fn join(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{head}{SEPARATOR}{tail}"),
    }
}

/// Convert any platform separators into forward slashes.
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Name of index file for a category of the given file kind.
pub fn index_file_name(file_kind: &str) -> String {
    format!("{INDEX_BASENAME}{file_kind}")
}

/// Split file name into stem and file kind.
///
/// The file kind keeps its leading dot, e.g., "notes.md" becomes
/// `("notes", ".md")`. Dot files and names without a dot have no file kind.
pub fn split_file_kind(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
    }
}

/// Check if base name of relative path is reserved for wiki infrastructure.
///
/// Configuration files start with "." and category index files start with
/// [`INDEX_BASENAME`]. Neither should ever become an article of its own.
pub fn is_reserved(path: &str) -> bool {
    let basename = path.rsplit(SEPARATOR).next().unwrap_or(path);
    basename.starts_with('.') || basename.starts_with(INDEX_BASENAME)
}

/// Turn an article name into a file system safe file name.
///
/// Keeps letters, digits, '-', and '_'. Runs of anything else collapse into a
/// single '-'. Leading '.' and '_' are stripped so a slug can never collide
/// with a reserved name. Case is preserved, uniqueness among siblings is
/// checked case-insensitively elsewhere.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug
        .trim_matches('-')
        .trim_start_matches(['.', '_'])
        .to_string();

    if slug.is_empty() {
        "untitled".into()
    } else {
        slug
    }
}

/// Compare two paths in natural order.
///
/// Digit runs compare by numeric value and everything else compares
/// case-insensitively, so "page2" sorts before "page10".
pub fn natural_cmp(lhs: &str, rhs: &str) -> Ordering {
    let mut lhs_chunks = Chunks::new(lhs);
    let mut rhs_chunks = Chunks::new(rhs);

    loop {
        let ordering = match (lhs_chunks.next(), rhs_chunks.next()) {
            (None, None) => return lhs.cmp(rhs),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(a)), Some(Chunk::Digits(b))) => {
                let a = a.trim_start_matches('0');
                let b = b.trim_start_matches('0');
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
            (Some(Chunk::Text(a)), Some(Chunk::Text(b))) => a.to_lowercase().cmp(&b.to_lowercase()),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = self
            .rest
            .find(|ch: char| ch.is_ascii_digit() != is_digit)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;

        Some(if is_digit {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

/// Determine default absolute path to wiki repository.
///
/// Uses XDG Base Directory path `$XDG_DATA_HOME/gitwiki` as the default
/// absolute path for a wiki. Does not check if the path returned actually
/// exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if data directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_wiki_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("gitwiki"))
        .ok_or(NoWayHome)
}

/// No way to determine user's data directory.
///
/// # See Also
///
/// - [`dirs::data_dir`](https://docs.rs/dirs/latest/dirs/fn.data_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's data directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
