// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control adapter.
//!
//! The wiki never talks to Git directly. Everything it needs from version
//! control goes through the [`VersionControl`] trait: listing tracked paths,
//! finding unstaged changes, staging explicit paths, committing, reading
//! per-file history, and moving history between remotes. [`Git2Repository`]
//! implements it through libgit2.
//!
//! # Staging Semantics
//!
//! Callers hand over relative paths without saying what happened to them.
//! The adapter looks at the work tree to decide: an existing file is added,
//! an existing directory is added recursively, and a missing path is removed
//! from the index along with everything beneath it. This is what lets a
//! single commit capture a file turning into a directory, or a whole subtree
//! moving somewhere else.

pub mod remote;

use crate::{config::Author, wiki::history::HistoryEntry};

use git2::{
    ErrorCode, IndexAddOption, Oid, Patch, Repository, RepositoryInitOptions, Signature, Sort,
    Status, StatusOptions, Tree,
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Name of the remote used for pulling and pushing.
pub const ORIGIN: &str = "origin";

/// Branch used for freshly initialized wikis.
pub const DEFAULT_BRANCH: &str = "main";

/// Layer of indirection for version control access.
pub trait VersionControl {
    /// Absolute path to the work tree.
    fn workdir(&self) -> &Path;

    /// List every path currently tracked by the index.
    fn tracked_paths(&self) -> Result<Vec<String>>;

    /// List tracked paths whose work tree content differs from the index.
    fn unstaged_paths(&self) -> Result<HashSet<String>>;

    /// Stage explicit listing of relative paths.
    fn stage(&self, paths: impl IntoIterator<Item = impl AsRef<str>>) -> Result<()>;

    /// Commit current index on top of HEAD.
    fn commit(&self, message: &str, author: &Author) -> Result<Oid>;

    /// List commits that changed the given path, newest first.
    fn file_history(&self, path: &str) -> Result<Vec<HistoryEntry>>;

    /// Read content of path as of a given commit.
    fn file_at(&self, sha: &str, path: &str) -> Result<Option<String>>;

    /// Unified diff of path from a given commit to HEAD.
    fn diff_to_head(&self, sha: &str, path: &str) -> Result<String>;

    /// URL of the origin remote, if any.
    fn remote_url(&self) -> Result<Option<String>>;

    /// Point origin remote at URL, or remove it if URL is empty.
    fn set_remote_url(&self, url: &str) -> Result<()>;
}

/// Version control through libgit2.
pub struct Git2Repository {
    repository: Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for Git2Repository {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Git2Repository")
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl Git2Repository {
    /// Initialize new repository at target path.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    #[instrument(skip(path), level = "debug")]
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        info!("initialize new repository: {:?}", path.as_ref().display());
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(DEFAULT_BRANCH);
        let repository = Repository::init_opts(path.as_ref(), &opts)?;

        Self::new(repository)
    }

    /// Open existing repository at target path.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if libgit2 operations fail.
    /// - Return [`RepoError::Bare`] if repository has no work tree.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        debug!("open repository: {:?}", path.as_ref().display());
        Self::new(Repository::open(path.as_ref())?)
    }

    fn new(repository: Repository) -> Result<Self> {
        let workdir = repository
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| RepoError::Bare {
                gitdir: repository.path().to_path_buf(),
            })?;

        Ok(Self {
            repository,
            workdir,
        })
    }

    /// Access underlying libgit2 repository.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Name of the branch HEAD points to, even if it has no commits yet.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repository.find_reference("HEAD")?;
        let branch = head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .unwrap_or(DEFAULT_BRANCH)
            .to_string();

        Ok(branch)
    }

    fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        match self.repository.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(err) if is_unborn(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn blob_id(&self, tree: &Tree<'_>, path: &str) -> Result<Option<Oid>> {
        match tree.get_path(Path::new(path)) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn blob_at_commit(&self, sha: &str, path: &str) -> Result<Option<git2::Blob<'_>>> {
        let commit = self.repository.find_commit(Oid::from_str(sha)?)?;
        let tree = commit.tree()?;
        match self.blob_id(&tree, path)? {
            Some(id) => Ok(Some(self.repository.find_blob(id)?)),
            None => Ok(None),
        }
    }
}

impl VersionControl for Git2Repository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn tracked_paths(&self) -> Result<Vec<String>> {
        let index = self.repository.index()?;
        let mut paths = Vec::new();

        for entry in index.iter() {
            if let Ok(path) = std::str::from_utf8(&entry.path) {
                paths.push(path.to_string());
            }
        }

        Ok(paths)
    }

    fn unstaged_paths(&self) -> Result<HashSet<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        let statuses = self.repository.statuses(Some(&mut opts))?;

        let unstaged = Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_TYPECHANGE | Status::WT_RENAMED;
        let paths = statuses
            .iter()
            .filter(|entry| entry.status().intersects(unstaged))
            .filter_map(|entry| entry.path().map(str::to_owned))
            .collect();

        Ok(paths)
    }

    #[instrument(skip(self, paths), level = "debug")]
    fn stage(&self, paths: impl IntoIterator<Item = impl AsRef<str>>) -> Result<()> {
        let mut index = self.repository.index()?;

        for path in paths {
            let path = path.as_ref();
            let full_path = self.workdir.join(path);

            // INVARIANT: Let the work tree decide between add and remove.
            if full_path.is_file() {
                debug!("stage file {path:?}");
                index.add_path(Path::new(path))?;
            } else if full_path.is_dir() {
                debug!("stage directory {path:?}");
                index.add_all([path], IndexAddOption::DEFAULT, None)?;
                index.update_all([path], None)?;
            } else {
                debug!("stage removal of {path:?}");
                index.remove_path(Path::new(path))?;
                index.remove_dir(Path::new(path), 0)?;
            }
        }

        index.write()?;

        Ok(())
    }

    #[instrument(skip(self, author), level = "debug")]
    fn commit(&self, message: &str, author: &Author) -> Result<Oid> {
        // INVARIANT: Always use new tree produced by index after staging.
        let mut index = self.repository.index()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repository.find_tree(tree_oid)?;

        // INVARIANT: Always determine latest parent commits to append to.
        let signature = Signature::now(&author.name, &author.mail)?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repository.head().ok().and_then(|head| head.target()) {
            parents.push(self.repository.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        let oid = self.repository.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        info!("committed {oid}: {message}");

        Ok(oid)
    }

    fn file_history(&self, path: &str) -> Result<Vec<HistoryEntry>> {
        // INVARIANT: Fresh repositories have no commits, thus no history.
        if self.head_tree()?.is_none() {
            debug!("no history for {path:?}, HEAD is unborn");
            return Ok(Vec::new());
        }

        let mut revwalk = self.repository.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut entries = Vec::new();
        for oid in revwalk {
            let commit = self.repository.find_commit(oid?)?;
            let current = self.blob_id(&commit.tree()?, path)?;
            let previous = match commit.parent(0) {
                Ok(parent) => self.blob_id(&parent.tree()?, path)?,
                Err(_) => None,
            };

            if current != previous {
                entries.push(HistoryEntry::from_commit(&commit, path));
            }
        }

        Ok(entries)
    }

    fn file_at(&self, sha: &str, path: &str) -> Result<Option<String>> {
        Ok(self
            .blob_at_commit(sha, path)?
            .map(|blob| String::from_utf8_lossy(blob.content()).into_owned()))
    }

    fn diff_to_head(&self, sha: &str, path: &str) -> Result<String> {
        let old = self.blob_at_commit(sha, path)?;
        let new = match self.head_tree()? {
            Some(tree) => match self.blob_id(&tree, path)? {
                Some(id) => Some(self.repository.find_blob(id)?),
                None => None,
            },
            None => None,
        };

        // INVARIANT: A file absent on either side diffs against empty content.
        let old = old.as_ref().map(|blob| blob.content()).unwrap_or_default();
        let new = new.as_ref().map(|blob| blob.content()).unwrap_or_default();
        let as_path = Path::new(path);
        let mut patch = Patch::from_buffers(old, Some(as_path), new, Some(as_path), None)?;
        let buf = patch.to_buf()?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn remote_url(&self) -> Result<Option<String>> {
        match self.repository.find_remote(ORIGIN) {
            Ok(remote) => Ok(remote.url().map(str::to_owned)),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self), level = "debug")]
    fn set_remote_url(&self, url: &str) -> Result<()> {
        let exists = self.remote_url()?.is_some();
        if url.is_empty() {
            if exists {
                info!("remove remote {ORIGIN}");
                self.repository.remote_delete(ORIGIN)?;
            }
            return Ok(());
        }

        if exists {
            self.repository.remote_set_url(ORIGIN, url)?;
        } else {
            self.repository.remote(ORIGIN, url)?;
        }

        // INVARIANT: Local branch tracks its namesake on origin.
        let branch = self.current_branch()?;
        let mut config = self.repository.config()?;
        config.set_str(&format!("branch.{branch}.remote"), ORIGIN)?;
        config.set_str(&format!("branch.{branch}.merge"), &format!("refs/heads/{branch}"))?;
        info!("remote {ORIGIN} now points to {url}");

        Ok(())
    }
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

/// All possible error types for version control interaction.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Repository has no work tree to hold articles.
    #[error("repository at {:?} is bare", gitdir.display())]
    Bare { gitdir: PathBuf },

    /// Remote could not be reached or refused the transfer.
    #[error("transport failed: {source}")]
    Transport {
        #[source]
        source: git2::Error,
    },

    /// Remote or local reference could not be updated.
    #[error("failed to update {refname}: {message}")]
    RefUpdate { refname: String, message: String },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = RepoError> = std::result::Result<T, E>;
