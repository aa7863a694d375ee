// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wiki link extraction.
//!
//! Articles reference each other with `[[Target]]` or `[[Target|label]]`.
//! Targets are wiki URLs, where ':' may stand in for '/', so
//! `[[Projects:Garden]]` and `[[Projects/Garden]]` point to the same article.

use crate::{
    repo::VersionControl,
    wiki::{article::ArticleId, Result, Wiki},
};

use regex::{Captures, Regex};
use std::sync::LazyLock;

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|]*)(?:\|([^\[\]]*))?\]\]").expect("wiki link pattern is valid")
});

/// Single wiki link found in article text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Target as a slash separated wiki URL.
    pub target: String,

    /// Explicit label after '|', if any.
    pub label: Option<String>,
}

impl WikiLink {
    fn from_captures(captures: &Captures<'_>) -> Option<Self> {
        let target = captures.get(1)?.as_str().trim().replace(':', "/");
        if target.is_empty() {
            return None;
        }

        let label = captures
            .get(2)
            .map(|label| label.as_str().trim().to_string())
            .filter(|label| !label.is_empty());

        Some(Self { target, label })
    }

    /// Text to show for the link.
    ///
    /// Falls back to the last component of the target.
    pub fn display(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None => self
                .target
                .rsplit('/')
                .find(|component| !component.is_empty())
                .unwrap_or(&self.target),
        }
    }
}

/// Every wiki link in text, in order of appearance.
pub fn scan_links(text: &str) -> Vec<WikiLink> {
    WIKI_LINK
        .captures_iter(text)
        .filter_map(|captures| WikiLink::from_captures(&captures))
        .collect()
}

/// Replace every wiki link in text with whatever the callback returns.
pub fn replace_links(text: &str, mut replace: impl FnMut(&WikiLink) -> String) -> String {
    WIKI_LINK
        .replace_all(text, |captures: &Captures<'_>| {
            match WikiLink::from_captures(captures) {
                Some(link) => replace(&link),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

impl<R> Wiki<R>
where
    R: VersionControl,
{
    /// Recompute outgoing links from article's current text.
    ///
    /// Targets that do not resolve are dropped, and each article is listed
    /// at most once.
    pub fn refresh_links(&mut self, id: ArticleId) -> Result<()> {
        let text = self.text(id)?.to_string();
        let mut links = Vec::new();
        for link in scan_links(&text) {
            if let Some(target) = self.article_by_url(&link.target) {
                if !links.contains(&target) {
                    links.push(target);
                }
            }
        }

        self.get_mut(id)?.links = links;

        Ok(())
    }
}
