// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! File system synchronization.
//!
//! Every operation here keeps three things in agreement: the article tree,
//! the files in the work tree, and the pending change sets waiting to be
//! staged. Operations validate first and only then touch the disk, so a
//! rejected operation leaves all three untouched.
//!
//! # Leaf and Category Transitions
//!
//! ```text
//!             gains first child
//!   Leaf  ------------------------>  Category
//!   a.md  <------------------------  a/_index.md
//!             loses last child
//! ```
//!
//! Both transitions record the old and the new location as changed paths.
//! The internal `materialize_*` variants only collect those paths into a
//! caller supplied change set, so one logical operation can fold several
//! transitions into a single commit.

use crate::{
    path::{index_file_name, join, slugify},
    repo::VersionControl,
    wiki::{
        article::{heading_name, normalize_newlines, retitle, ArticleId, ArticleKind},
        changes::ChangeSet,
        Result, Wiki, WikiError,
    },
};

use mkdirp::mkdirp;
use std::{
    ffi::OsStr,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

impl<R> Wiki<R>
where
    R: VersionControl,
{
    /// Text of article, loading it from disk on first access.
    ///
    /// A missing content file reads as empty text.
    pub fn text(&mut self, id: ArticleId) -> Result<&str> {
        if self.get(id)?.text.is_none() {
            self.load_text(id)?;
        }

        Ok(self.get(id)?.text.as_deref().unwrap_or_default())
    }

    fn load_text(&mut self, id: ArticleId) -> Result<()> {
        let path = self.path.join(self.content_path(id)?);
        debug!("load article {id} from {:?}", path.display());
        let text = match fs::read_to_string(&path) {
            Ok(text) => normalize_newlines(&text),
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => return Err(WikiError::ReadArticle { source, path }),
        };

        let article = self.get_mut(id)?;
        article.text = Some(text);
        article.modified = false;
        self.derive_name(id)?;
        self.refresh_links(id)
    }

    fn derive_name(&mut self, id: ArticleId) -> Result<()> {
        let name = if self.is_root(id) {
            self.name()
        } else {
            let article = self.get(id)?;
            article
                .text
                .as_deref()
                .and_then(heading_name)
                .unwrap_or_else(|| article.file_name.clone())
        };
        self.get_mut(id)?.name = name;

        Ok(())
    }

    /// Assign new text to article.
    ///
    /// Line endings are normalized first. Returns false without touching
    /// anything if the normalized text equals the current one. Otherwise the
    /// article is marked modified, and its name and links are derived anew.
    pub fn set_text(&mut self, id: ArticleId, text: &str) -> Result<bool> {
        let text = normalize_newlines(text);
        if self.text(id)? == text {
            return Ok(false);
        }

        let article = self.get_mut(id)?;
        article.text = Some(text);
        article.modified = true;
        self.derive_name(id)?;
        self.refresh_links(id)?;

        Ok(true)
    }

    /// Drop cached text so the next read goes to disk.
    pub fn reload(&mut self, id: ArticleId) -> Result<()> {
        let article = self.get_mut(id)?;
        article.text = None;
        article.modified = false;

        Ok(())
    }

    /// Persist cached text to article's content file.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::CreateDirectory`] if parent directory is missing
    ///   and cannot be created.
    /// - Return [`WikiError::WriteArticle`] if the file cannot be written.
    #[instrument(skip(self), level = "debug")]
    pub fn write(&mut self, id: ArticleId) -> Result<()> {
        let text = self.text(id)?.to_string();
        let relative = self.content_path(id)?;
        let path = self.path.join(&relative);
        if let Some(parent) = path.parent() {
            mkdirp(parent).map_err(|source| WikiError::CreateDirectory {
                source,
                path: parent.to_path_buf(),
            })?;
        }

        debug!("write article {id} to {:?}", path.display());
        fs::write(&path, text).map_err(|source| WikiError::WriteArticle { source, path })?;
        let article = self.get_mut(id)?;
        article.pending.insert(relative);
        article.modified = false;

        self.fetch_unstaged_changes()
    }

    /// Turn leaf into category and commit.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::FileConflict`] if the directory already exists.
    #[instrument(skip(self), level = "debug")]
    pub fn convert_to_folder(&mut self, id: ArticleId) -> Result<()> {
        let mut changes = ChangeSet::new();
        self.materialize_folder(id, &mut changes)?;
        if changes.is_empty() {
            return Ok(());
        }

        let message = format!("Turned '{}' into a category.", self.wiki_url(id)?);
        self.commit(id, &message, changes)
    }

    /// Turn childless category back into leaf and commit.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::InvalidOperation`] for the root, or if the
    ///   category still has children.
    /// - Return [`WikiError::CategoryNotEmpty`] if its directory holds more
    ///   than the index file.
    /// - Return [`WikiError::FileConflict`] if the plain file already exists.
    #[instrument(skip(self), level = "debug")]
    pub fn convert_to_file(&mut self, id: ArticleId) -> Result<()> {
        let mut changes = ChangeSet::new();
        self.materialize_file(id, &mut changes)?;
        if changes.is_empty() {
            return Ok(());
        }

        let message = format!("Turned '{}' into an article.", self.wiki_url(id)?);
        self.commit(id, &message, changes)
    }

    pub(crate) fn materialize_folder(&mut self, id: ArticleId, changes: &mut ChangeSet) -> Result<()> {
        let article = self.get(id)?;
        if article.is_category() {
            return Ok(());
        }

        let file_kind = article.file_kind.clone();
        let old_relative = self.physical_path(id)?;
        let dir_relative = self.dir_path(id)?;
        let index_relative = join(&dir_relative, &index_file_name(&file_kind));
        let dir = self.path.join(&dir_relative);
        if dir.exists() {
            return Err(WikiError::FileConflict { path: dir });
        }

        mkdirp(&dir).map_err(|source| WikiError::CreateDirectory {
            source,
            path: dir.clone(),
        })?;
        let old = self.path.join(&old_relative);
        if old.exists() {
            rename(&old, &self.path.join(&index_relative))?;
        }

        self.get_mut(id)?.kind = ArticleKind::Category;
        info!("turned {old_relative:?} into category {dir_relative:?}");
        changes.insert(old_relative);
        changes.insert(index_relative);

        Ok(())
    }

    pub(crate) fn materialize_file(&mut self, id: ArticleId, changes: &mut ChangeSet) -> Result<()> {
        let article = self.get(id)?;
        if !article.is_category() {
            return Ok(());
        }
        if self.is_root(id) {
            return Err(WikiError::InvalidOperation(
                "root article always stays a category".into(),
            ));
        }
        if article.has_children() {
            return Err(WikiError::InvalidOperation(format!(
                "category {id} still has children"
            )));
        }

        let file_kind = article.file_kind.clone();
        let index_name = index_file_name(&file_kind);
        let dir_relative = self.dir_path(id)?;
        let index_relative = join(&dir_relative, &index_name);
        let file_relative = format!("{dir_relative}{file_kind}");
        let dir = self.path.join(&dir_relative);
        let file = self.path.join(&file_relative);
        if file.exists() {
            return Err(WikiError::FileConflict { path: file });
        }

        if dir.exists() {
            // INVARIANT: Never leave orphaned files behind in the work tree.
            let entries = fs::read_dir(&dir).map_err(|source| WikiError::ReadDirectory {
                source,
                path: dir.clone(),
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| WikiError::ReadDirectory {
                    source,
                    path: dir.clone(),
                })?;
                if entry.file_name().as_os_str() != OsStr::new(&index_name) {
                    return Err(WikiError::CategoryNotEmpty { path: dir });
                }
            }

            let index = dir.join(&index_name);
            if index.exists() {
                rename(&index, &file)?;
            }
            fs::remove_dir(&dir).map_err(|source| WikiError::RemoveDirectory {
                source,
                path: dir.clone(),
            })?;
        }

        self.get_mut(id)?.kind = ArticleKind::Leaf;
        info!("turned category {dir_relative:?} into {file_relative:?}");
        changes.insert(index_relative);
        changes.insert(file_relative);

        Ok(())
    }

    /// Rename article and optionally move it beneath a new parent.
    ///
    /// The new file name is a slug of the new name. Categories move as a
    /// whole directory. A leaf destination parent turns into a category,
    /// and a source parent losing its last child turns back into a leaf.
    /// Everything ends up in a single commit.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::InvalidOperation`] when moving the root, or
    ///   moving an article beneath itself or one of its descendants.
    /// - Return [`WikiError::FileConflict`] if a sibling at the destination
    ///   has the same file name, or the destination path already exists.
    #[instrument(skip(self), level = "debug")]
    pub fn move_article(
        &mut self,
        id: ArticleId,
        new_name: &str,
        new_parent: Option<ArticleId>,
    ) -> Result<()> {
        let old_parent = self
            .get(id)?
            .parent
            .ok_or_else(|| WikiError::InvalidOperation("root article cannot be moved".into()))?;
        let new_parent = new_parent.unwrap_or(old_parent);
        let new_name = new_name.trim();
        let new_file_name = slugify(new_name);
        let reparent = new_parent != old_parent;

        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(WikiError::InvalidOperation(format!(
                "article {id} cannot be moved beneath itself"
            )));
        }
        if !reparent && self.get(id)?.file_name == new_file_name {
            debug!("article {id} stays where it is");
            return Ok(());
        }

        let conflict = self
            .child_by_file_name(new_parent, &new_file_name)
            .filter(|sibling| *sibling != id);
        let parent_dir = self.dir_path(new_parent)?;
        if conflict.is_some() {
            return Err(WikiError::FileConflict {
                path: self.path.join(join(&parent_dir, &new_file_name)),
            });
        }

        let entry = match self.get(id)?.kind {
            ArticleKind::Leaf => format!("{new_file_name}{}", self.get(id)?.file_kind),
            ArticleKind::Category => new_file_name.clone(),
        };
        let old_relative = self.physical_path(id)?;
        let new_relative = join(&parent_dir, &entry);
        let old_absolute = self.path.join(&old_relative);
        let new_absolute = self.path.join(&new_relative);
        let case_only = old_relative.to_lowercase() == new_relative.to_lowercase();
        if new_absolute.exists() && !case_only {
            return Err(WikiError::FileConflict { path: new_absolute });
        }
        if reparent && !self.get(new_parent)?.is_category() {
            let dir = self.path.join(&parent_dir);
            if dir.exists() {
                return Err(WikiError::FileConflict { path: dir });
            }
        }

        let old_url = self.wiki_url(id)?;
        let retitled = retitle(self.text(id)?, new_name);
        let mut changes = ChangeSet::new();
        if reparent {
            changes.extend(self.all_physical_paths(id)?);
        }

        let article = self.get_mut(id)?;
        article.file_name = new_file_name;
        article.name = new_name.to_string();
        if !reparent {
            changes.insert(old_relative.as_str());
            changes.insert(new_relative.as_str());
        }

        if reparent {
            self.materialize_folder(new_parent, &mut changes)?;
        }

        if old_absolute.exists() {
            rename(&old_absolute, &new_absolute)?;
        }

        if reparent {
            self.detach(old_parent, id, &mut changes)?;
            self.attach(new_parent, id, &mut changes)?;
            changes.extend(self.all_physical_paths(id)?);
        }

        // INVARIANT: Heading carries the name across reloads.
        if let Some(text) = retitled {
            if self.set_text(id, &text)? {
                self.write(id)?;
            }
        }

        let message = format!("Moved '{old_url}' to '{}'.", self.wiki_url(id)?);
        self.commit(id, &message, changes)
    }

    /// Delete article with all of its descendants.
    ///
    /// Descendants go first, then the article's own file, or index file and
    /// directory. If the parent loses its last child it turns back into a
    /// leaf. With `commit` set, everything lands in one commit on the parent.
    /// Without it, the changed paths wait in the parent's pending set.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::InvalidOperation`] for the root.
    #[instrument(skip(self), level = "debug")]
    pub fn delete(&mut self, id: ArticleId, commit: bool) -> Result<()> {
        let parent = self
            .get(id)?
            .parent
            .ok_or_else(|| WikiError::InvalidOperation("root article cannot be deleted".into()))?;
        let url = self.wiki_url(id)?;
        let mut changes: ChangeSet = self.all_physical_paths(id)?.into_iter().collect();

        // INVARIANT: Reversed pre-order visits descendants before ancestors.
        let mut doomed = self.descendants(id);
        doomed.reverse();
        for doomed_id in &doomed {
            self.remove_backing_files(*doomed_id)?;
        }

        self.detach(parent, id, &mut changes)?;
        for doomed_id in doomed {
            if let Some(article) = self.articles[doomed_id.0].take() {
                changes.extend(article.pending);
            }
        }
        info!("deleted {url:?}");

        if commit {
            self.commit(parent, &format!("Deleted '{url}'"), changes)
        } else {
            self.get_mut(parent)?.pending.extend(changes);
            Ok(())
        }
    }

    fn remove_backing_files(&self, id: ArticleId) -> Result<()> {
        let article = self.get(id)?;
        let path = self.path.join(self.physical_path(id)?);
        if !article.is_category() {
            return remove_file_if_exists(&path);
        }

        remove_file_if_exists(&path.join(index_file_name(&article.file_kind)))?;
        if path.exists() {
            fs::remove_dir(&path).map_err(|source| WikiError::RemoveDirectory { source, path })?;
        }

        Ok(())
    }

    /// Change article's file kind, renaming its content file, and commit.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::FileConflict`] if the renamed file already exists.
    #[instrument(skip(self), level = "debug")]
    pub fn set_file_kind(&mut self, id: ArticleId, file_kind: &str) -> Result<()> {
        if self.get(id)?.file_kind == file_kind {
            return Ok(());
        }

        let old_relative = self.content_path(id)?;
        let new_relative = self.content_path_for(id, file_kind)?;
        let old = self.path.join(&old_relative);
        let new = self.path.join(&new_relative);
        if new.exists() {
            return Err(WikiError::FileConflict { path: new });
        }

        if old.exists() {
            rename(&old, &new)?;
        }
        self.get_mut(id)?.file_kind = file_kind.into();

        let message = format!("Changed file type of '{}' to '{file_kind}'", self.wiki_url(id)?);
        self.commit(id, &message, [old_relative, new_relative])
    }

    /// Stage pending and extra paths of article, then commit them.
    ///
    /// An empty message becomes "Update article '<url>'". Pending paths are
    /// only cleared once staging succeeded.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::Repository`] if staging or committing fails.
    #[instrument(skip(self, extra), level = "debug")]
    pub fn commit(
        &mut self,
        id: ArticleId,
        message: &str,
        extra: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<()> {
        let message = if message.is_empty() {
            format!("Update article '{}'", self.wiki_url(id)?)
        } else {
            message.to_string()
        };

        let mut changes = self.get_mut(id)?.pending.take();
        changes.extend(extra);
        if changes.is_empty() {
            debug!("nothing to commit for {id}");
            return Ok(());
        }

        debug!("stage {changes}");
        let committed = self
            .repo
            .stage(changes.iter())
            .and_then(|()| self.repo.commit(&message, &self.config.author));
        if let Err(err) = committed {
            warn!("commit failed, keeping pending paths: {err}");
            self.get_mut(id)?.pending.extend(changes.iter());
            return Err(err.into());
        }

        self.fetch_unstaged_changes()
    }

    /// Write every modified article and commit all pending paths at once.
    #[instrument(skip(self), level = "debug")]
    pub fn commit_all(&mut self) -> Result<()> {
        let ids = self.descendants(self.root);
        for id in &ids {
            if self.get(*id)?.modified {
                self.write(*id)?;
            }
        }

        let mut changes = ChangeSet::new();
        for id in ids {
            changes.extend(self.get_mut(id)?.pending.take());
        }

        let message = format!("Update wiki '{}'.", self.name());
        self.commit(self.root, &message, changes)
    }
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    debug!("rename {:?} to {:?}", from.display(), to.display());
    fs::rename(from, to).map_err(|source| WikiError::Rename {
        source,
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    })
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(WikiError::RemoveFile {
            source,
            path: PathBuf::from(path),
        }),
    }
}
