// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Per-article revision history.

use crate::{
    repo::VersionControl,
    wiki::{article::ArticleId, Result, Wiki},
};

use git2::Commit;

/// One commit that touched an article's content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub sha: String,
    pub author: String,
    pub committer: String,

    /// Seconds since the Unix epoch.
    pub author_time: i64,

    /// Seconds since the Unix epoch.
    pub commit_time: i64,

    pub summary: String,

    /// Relative path the entry was recorded for.
    pub path: String,
}

impl HistoryEntry {
    pub(crate) fn from_commit(commit: &Commit<'_>, path: &str) -> Self {
        Self {
            sha: commit.id().to_string(),
            author: commit.author().to_string(),
            committer: commit.committer().to_string(),
            author_time: commit.author().when().seconds(),
            commit_time: commit.time().seconds(),
            summary: commit.summary().unwrap_or_default().to_string(),
            path: path.into(),
        }
    }

    /// Short form of the commit id.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    /// Lines of the file as of this commit.
    ///
    /// Every line keeps its terminator. The last one gets a line feed added
    /// if the file did not end with one. A file absent at this commit has no
    /// lines.
    pub fn lines<R: VersionControl>(&self, wiki: &Wiki<R>) -> Result<Vec<String>> {
        let Some(content) = wiki.repository().file_at(&self.sha, &self.path)? else {
            return Ok(Vec::new());
        };

        let mut lines = content
            .split_inclusive('\n')
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if let Some(last) = lines.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }

        Ok(lines)
    }

    /// Unified diff of the file from this commit to HEAD.
    pub fn diff<R: VersionControl>(&self, wiki: &Wiki<R>) -> Result<String> {
        Ok(wiki.repository().diff_to_head(&self.sha, &self.path)?)
    }
}

impl<R> Wiki<R>
where
    R: VersionControl,
{
    /// Commits that changed article's content file, newest first.
    ///
    /// A wiki without any commit yet has an empty history.
    pub fn history(&self, id: ArticleId) -> Result<Vec<HistoryEntry>> {
        let path = self.content_path(id)?;
        Ok(self.repo.file_history(&path)?)
    }
}
