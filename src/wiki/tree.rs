// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tree navigation and structure.
//!
//! Resolves wiki URLs to articles, derives the three flavors of path for
//! each article, and links or unlinks parents and children. Attaching a
//! child to a leaf turns the leaf into a category first, and detaching the
//! last child of a category turns it back into a leaf.

use crate::{
    path::{index_file_name, join, slugify, split_url},
    repo::VersionControl,
    wiki::{
        article::{Article, ArticleId, ArticleKind},
        changes::ChangeSet,
        Result, Wiki, WikiError,
    },
};

use std::path::PathBuf;
use tracing::{debug, instrument};

/// One component of a path being descended into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) name: String,
    pub(crate) file_name: String,
    pub(crate) file_kind: String,
}

impl Segment {
    /// Component taken straight from disk, file name and name agree.
    pub(crate) fn verbatim(file_name: &str, file_kind: &str) -> Self {
        Self {
            name: file_name.into(),
            file_name: file_name.into(),
            file_kind: file_kind.into(),
        }
    }

    /// Component named by a user, file name gets slugified.
    pub(crate) fn named(name: &str, file_kind: &str) -> Self {
        Self {
            name: name.into(),
            file_name: slugify(name),
            file_kind: file_kind.into(),
        }
    }

    pub(crate) fn into_article(self, kind: ArticleKind) -> Article {
        Article::new(self.name, self.file_name, self.file_kind, kind)
    }
}

impl<R> Wiki<R>
where
    R: VersionControl,
{
    pub(crate) fn insert(&mut self, article: Article) -> ArticleId {
        let id = ArticleId(self.articles.len());
        self.articles.push(Some(article));
        id
    }

    /// Look up live article.
    pub fn article(&self, id: ArticleId) -> Option<&Article> {
        self.articles.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get(&self, id: ArticleId) -> Result<&Article> {
        self.article(id).ok_or(WikiError::UnknownArticle(id))
    }

    pub(crate) fn get_mut(&mut self, id: ArticleId) -> Result<&mut Article> {
        self.articles
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(WikiError::UnknownArticle(id))
    }

    pub fn is_root(&self, id: ArticleId) -> bool {
        id == self.root
    }

    /// Chain of ids from root down to, and including, the article.
    fn lineage(&self, id: ArticleId) -> Result<Vec<ArticleId>> {
        let mut lineage = vec![id];
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            lineage.push(parent);
            current = self.get(parent)?;
        }
        lineage.reverse();

        Ok(lineage)
    }

    /// Logical path from root using display names. Root is "".
    pub fn wiki_url(&self, id: ArticleId) -> Result<String> {
        let mut url = String::new();
        for ancestor in self.lineage(id)?.into_iter().skip(1) {
            url = join(&url, self.get(ancestor)?.name());
        }

        Ok(url)
    }

    /// Relative path of article without its file kind. Root is "".
    pub fn dir_path(&self, id: ArticleId) -> Result<String> {
        let mut path = String::new();
        for ancestor in self.lineage(id)?.into_iter().skip(1) {
            path = join(&path, self.get(ancestor)?.file_name());
        }

        Ok(path)
    }

    /// Relative path of article's file or directory.
    pub fn physical_path(&self, id: ArticleId) -> Result<String> {
        let dir = self.dir_path(id)?;
        let article = self.get(id)?;
        Ok(match article.kind() {
            ArticleKind::Category => dir,
            ArticleKind::Leaf => format!("{dir}{}", article.file_kind()),
        })
    }

    /// Relative path of the file holding article's text.
    pub fn content_path(&self, id: ArticleId) -> Result<String> {
        self.content_path_for(id, self.get(id)?.file_kind())
    }

    pub(crate) fn content_path_for(&self, id: ArticleId, file_kind: &str) -> Result<String> {
        let dir = self.dir_path(id)?;
        Ok(match self.get(id)?.kind() {
            ArticleKind::Category => join(&dir, &index_file_name(file_kind)),
            ArticleKind::Leaf => format!("{dir}{file_kind}"),
        })
    }

    /// Absolute path of article's file or directory.
    pub fn absolute_path(&self, id: ArticleId) -> Result<PathBuf> {
        Ok(self.path.join(self.physical_path(id)?))
    }

    /// Physical paths of article and every descendant, parents first.
    pub fn all_physical_paths(&self, id: ArticleId) -> Result<Vec<String>> {
        self.descendants(id)
            .into_iter()
            .map(|id| self.physical_path(id))
            .collect()
    }

    /// Article and every descendant in pre-order.
    pub fn descendants(&self, id: ArticleId) -> Vec<ArticleId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(article) = self.article(next) else {
                continue;
            };
            order.push(next);
            stack.extend(article.children.iter().rev());
        }

        order
    }

    /// Check if ancestor is a strict ancestor of id.
    pub fn is_ancestor(&self, ancestor: ArticleId, id: ArticleId) -> bool {
        let mut current = self.article(id).and_then(Article::parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.article(parent).and_then(Article::parent);
        }

        false
    }

    /// Find child by display name, then by file name, ignoring case.
    ///
    /// The file name is tried both as given and as the slug of the name, so
    /// "Rose Garden" finds `Rose-Garden.md` before its heading was ever read.
    pub fn child_by_name(&self, parent: ArticleId, name: &str) -> Option<ArticleId> {
        let children = self.article(parent)?.children();
        children
            .iter()
            .copied()
            .find(|child| self.article(*child).is_some_and(|a| a.has_name(name)))
            .or_else(|| self.child_by_file_name(parent, name))
            .or_else(|| self.child_by_file_name(parent, &slugify(name)))
    }

    pub(crate) fn child_by_file_name(&self, parent: ArticleId, file_name: &str) -> Option<ArticleId> {
        self.article(parent)?
            .children()
            .iter()
            .copied()
            .find(|child| self.article(*child).is_some_and(|a| a.has_file_name(file_name)))
    }

    /// Resolve URL relative to an article.
    ///
    /// Empty components are ignored, so "" resolves to `from` itself.
    pub fn resolve(&self, from: ArticleId, url: &str) -> Option<ArticleId> {
        self.article(from)?;
        split_url(url)
            .into_iter()
            .try_fold(from, |current, component| self.child_by_name(current, component))
    }

    /// Resolve URL from root.
    pub fn article_by_url(&self, url: &str) -> Option<ArticleId> {
        self.resolve(self.root, url)
    }

    /// Resolve URL, creating whatever is missing on the way.
    ///
    /// Missing intermediate components become categories, the final one a
    /// leaf. Created articles only exist in memory until written. Existing
    /// leaves along the way turn into categories.
    #[instrument(skip(self), level = "debug")]
    pub fn create_by_url(&mut self, from: ArticleId, url: &str, file_kind: &str) -> Result<ArticleId> {
        let segments = split_url(url)
            .into_iter()
            .map(|component| Segment::named(component, file_kind))
            .collect();
        self.descend_or_create(from, segments)
    }

    pub(crate) fn descend_or_create(&mut self, from: ArticleId, segments: Vec<Segment>) -> Result<ArticleId> {
        let count = segments.len();
        let mut current = from;
        for (idx, segment) in segments.into_iter().enumerate() {
            let found = self
                .child_by_name(current, &segment.name)
                .or_else(|| self.child_by_file_name(current, &segment.file_name));
            if let Some(child) = found {
                current = child;
                continue;
            }

            let kind = if idx + 1 < count {
                ArticleKind::Category
            } else {
                ArticleKind::Leaf
            };
            debug!("create {kind:?} {:?} beneath {current}", segment.name);
            let child = self.insert(segment.into_article(kind));
            let mut changes = ChangeSet::new();
            if let Err(err) = self.attach(current, child, &mut changes) {
                self.articles[child.0] = None;
                return Err(err);
            }
            self.commit_conversion(current, changes, "into a category")?;
            current = child;
        }

        Ok(current)
    }

    /// Append child to parent, committing if the parent had to turn into a
    /// category.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::InvalidOperation`] if child already has a parent,
    ///   or if attaching it would create a cycle.
    /// - Return [`WikiError::FileConflict`] if a sibling has the same file name.
    pub fn add_child(&mut self, parent: ArticleId, child: ArticleId) -> Result<()> {
        let mut changes = ChangeSet::new();
        self.attach(parent, child, &mut changes)?;
        self.commit_conversion(parent, changes, "into a category")
    }

    /// Detach child from parent, committing if the parent had to turn back
    /// into a leaf.
    ///
    /// The child stays in the arena as a detached article.
    pub fn remove_child(&mut self, parent: ArticleId, child: ArticleId) -> Result<()> {
        let mut changes = ChangeSet::new();
        self.detach(parent, child, &mut changes)?;
        self.commit_conversion(parent, changes, "into an article")
    }

    fn commit_conversion(&mut self, id: ArticleId, changes: ChangeSet, what: &str) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let message = format!("Turned '{}' {what}.", self.wiki_url(id)?);
        self.commit(id, &message, changes)
    }

    pub(crate) fn attach(&mut self, parent: ArticleId, child: ArticleId, changes: &mut ChangeSet) -> Result<()> {
        let file_name = self.get(child)?.file_name.clone();
        if self.get(child)?.parent.is_some() {
            return Err(WikiError::InvalidOperation(format!(
                "article {child} already has a parent"
            )));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(WikiError::InvalidOperation(format!(
                "article {child} cannot become its own descendant"
            )));
        }
        if self.child_by_file_name(parent, &file_name).is_some() {
            return Err(WikiError::FileConflict {
                path: self.path.join(join(&self.dir_path(parent)?, &file_name)),
            });
        }

        self.materialize_folder(parent, changes)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);

        Ok(())
    }

    pub(crate) fn detach(&mut self, parent: ArticleId, child: ArticleId, changes: &mut ChangeSet) -> Result<()> {
        let siblings = &mut self.get_mut(parent)?.children;
        let Some(position) = siblings.iter().position(|id| *id == child) else {
            return Err(WikiError::InvalidOperation(format!(
                "article {child} is not a child of {parent}"
            )));
        };
        siblings.remove(position);
        self.get_mut(child)?.parent = None;

        if !self.is_root(parent) && !self.get(parent)?.has_children() {
            self.materialize_file(parent, changes)?;
        }

        Ok(())
    }
}
