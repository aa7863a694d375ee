// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wiki domain representation.
//!
//! A __wiki__ is a Git repository whose tracked files form a tree of
//! articles. Every article is either a plain file, or, once it has children,
//! a directory with an index file holding its own content. The wiki keeps
//! that tree in memory and keeps it in sync with the work tree and the index
//! through every mutation.
//!
//! # Repository Layout
//!
//! ```text
//! .wikiconfig              configuration, see [`WikiConfig`]
//! _index.md                content of the root article
//! Garden.md                leaf article "Garden"
//! Projects/_index.md       content of category "Projects"
//! Projects/Roses.md        leaf article "Projects/Roses"
//! ```
//!
//! Base names starting with "." or "_index" are infrastructure and never
//! become articles of their own.
//!
//! # Commits
//!
//! Mutations only collect the paths they touch. Each logical operation ends
//! with exactly one commit that stages all of them together, so moving a
//! whole subtree, or turning a file into a directory, shows up as a single
//! entry in the history.
//!
//! # See Also
//!
//! 1. [`article`] for the node type.
//! 2. [`sync`] for file system synchronization.
//! 3. [`VersionControl`] for the repository seam.

pub mod article;
pub mod changes;
pub mod history;
pub mod links;
pub mod sync;
pub mod tree;

use crate::{
    config::{Author, ConfigError, RemoteSettings, WikiConfig, WikiSettings},
    path::{
        is_reserved, join, natural_cmp, split_file_kind, split_url, to_forward_slashes,
        CONFIG_FILE_NAME, INDEX_BASENAME,
    },
    render::Renderers,
    repo::{Git2Repository, RepoError, VersionControl},
    wiki::{
        article::{Article, ArticleId, ArticleKind},
        changes::ChangeSet,
        tree::Segment,
    },
};

use auth_git2::GitAuthenticator;
use mkdirp::mkdirp;
use std::{
    collections::{HashMap, HashSet},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// A wiki backed by a version controlled work tree.
///
/// Owns the article arena, the repository handle, and the configuration.
/// Articles never hold a handle of their own; everything goes through here.
#[derive(Debug)]
pub struct Wiki<R = Git2Repository>
where
    R: VersionControl,
{
    pub(crate) path: PathBuf,
    pub(crate) config: WikiConfig,
    pub(crate) repo: R,
    pub(crate) articles: Vec<Option<Article>>,
    pub(crate) root: ArticleId,
    unstaged: HashSet<String>,
}

/// Outcome of a pull or push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Remote and local history now agree.
    Completed,

    /// No remote URL is configured, nothing was attempted.
    NoRemote,

    /// Transfer failed, details went through the progress callback.
    Failed,
}

impl Wiki<Git2Repository> {
    /// Open existing wiki.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::NotARepository`] if there is no ".git" at path.
    /// - Return [`WikiError::Repository`] if libgit2 operations fail.
    /// - Return [`WikiError::Config`] if the configuration file is malformed.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.join(".git").exists() {
            return Err(WikiError::NotARepository {
                path: path.to_path_buf(),
            });
        }

        info!("open wiki at {:?}", path.display());
        Self::load(Git2Repository::open(path)?)
    }

    /// Initialize new wiki.
    ///
    /// Creates the directory if needed, initializes a repository in it, writes
    /// the configuration, seeds the root article with a template, and commits
    /// all of it as the first commit.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::CreateDirectory`] if path cannot be created.
    /// - Return [`WikiError::Repository`] if libgit2 operations fail.
    #[instrument(skip(path, template), level = "debug")]
    pub fn create(
        name: &str,
        path: impl AsRef<Path>,
        remote_url: &str,
        file_kind: &str,
        author_name: &str,
        author_mail: &str,
        template: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        mkdirp(path).map_err(|source| WikiError::CreateDirectory {
            source,
            path: path.to_path_buf(),
        })?;

        let repo = Git2Repository::init(path)?;
        repo.set_remote_url(remote_url)?;
        let config = WikiConfig {
            wiki: WikiSettings {
                name: name.into(),
                default_file_kind: file_kind.into(),
            },
            author: Author {
                name: author_name.into(),
                mail: author_mail.into(),
            },
            remote: RemoteSettings {
                url: remote_url.into(),
            },
        };

        let mut wiki = Self::new(repo, config);
        let root = wiki.root;
        wiki.write_config_file()?;
        wiki.set_text(root, template)?;
        wiki.write(root)?;
        let message = format!("Initialize wiki '{}'.", wiki.name());
        wiki.commit(root, &message, ChangeSet::new())?;

        Ok(wiki)
    }

    /// Pull from remote and rebuild the article tree.
    ///
    /// Every article id handed out before a successful pull is invalid
    /// afterwards.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::Repository`] if local libgit2 operations fail.
    ///   Transport and reference update failures are reported through the
    ///   progress callback instead.
    #[instrument(skip(self, authenticator, progress), level = "debug")]
    pub fn pull(
        &mut self,
        authenticator: &GitAuthenticator,
        mut progress: impl FnMut(&str),
    ) -> Result<Transfer> {
        if self.remote_url()?.is_none() {
            debug!("no remote configured, skip pull");
            return Ok(Transfer::NoRemote);
        }

        match self.repo.fetch(authenticator, &mut progress) {
            Ok(()) => {
                self.reload_tree()?;
                progress("Pull successful.\n");
                Ok(Transfer::Completed)
            }
            Err(err @ (RepoError::Transport { .. } | RepoError::RefUpdate { .. })) => {
                warn!("pull failed: {err}");
                progress(&format!("Pull failed -> {err}\n"));
                Ok(Transfer::Failed)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Push committed history to remote.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::Repository`] if local libgit2 operations fail.
    ///   Transport and reference update failures are reported through the
    ///   progress callback instead.
    #[instrument(skip(self, authenticator, progress), level = "debug")]
    pub fn push(
        &mut self,
        authenticator: &GitAuthenticator,
        mut progress: impl FnMut(&str),
    ) -> Result<Transfer> {
        if self.remote_url()?.is_none() {
            debug!("no remote configured, skip push");
            return Ok(Transfer::NoRemote);
        }

        match self.repo.push(authenticator, &mut progress) {
            Ok(()) => {
                progress("Push successful.\n");
                Ok(Transfer::Completed)
            }
            Err(err @ (RepoError::Transport { .. } | RepoError::RefUpdate { .. })) => {
                warn!("push failed: {err}");
                progress(&format!("Push failed -> {err}\n"));
                Ok(Transfer::Failed)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<R> Wiki<R>
where
    R: VersionControl,
{
    /// Construct new wiki with an empty tree.
    ///
    /// Only the root article exists afterwards. Use [`Wiki::load`] to pick up
    /// what the repository already tracks.
    pub fn new(repo: R, config: WikiConfig) -> Self {
        let path = repo.workdir().to_path_buf();
        let mut wiki = Self {
            path,
            config,
            repo,
            articles: Vec::new(),
            root: ArticleId(0),
            unstaged: HashSet::new(),
        };
        wiki.root = wiki.insert_root();

        wiki
    }

    /// Load wiki from repository contents.
    ///
    /// Reads configuration, fetches the unstaged change set, and imports
    /// every tracked article.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::Config`] if the configuration file is malformed.
    /// - Return [`WikiError::Repository`] if the index cannot be read.
    pub fn load(repo: R) -> Result<Self> {
        let config = read_config(repo.workdir())?;
        let mut wiki = Self::new(repo, config);
        wiki.fetch_unstaged_changes()?;
        wiki.import_current_index()?;

        Ok(wiki)
    }

    fn insert_root(&mut self) -> ArticleId {
        let article = Article::new(
            self.name(),
            "",
            self.config.wiki.default_file_kind.clone(),
            ArticleKind::Category,
        );
        self.insert(article)
    }

    fn reload_tree(&mut self) -> Result<()> {
        // INVARIANT: Ids are never reused, so old slots stay empty.
        for slot in self.articles.iter_mut() {
            *slot = None;
        }
        self.config = read_config(&self.path)?;
        self.root = self.insert_root();
        self.fetch_unstaged_changes()?;
        self.import_current_index()
    }

    /// Absolute path to the work tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    /// Access the version control handle shared by every article.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn root(&self) -> ArticleId {
        self.root
    }

    /// Display name of the wiki.
    ///
    /// Falls back to the work tree's directory name if none is configured.
    pub fn name(&self) -> String {
        if !self.config.wiki.name.is_empty() {
            return self.config.wiki.name.clone();
        }

        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.config.wiki.name = name.into();
        let root = self.root;
        self.get_mut(root)?.name = self.name();
        self.write_config()
    }

    pub fn default_file_kind(&self) -> &str {
        &self.config.wiki.default_file_kind
    }

    pub fn set_default_file_kind(&mut self, file_kind: &str) -> Result<()> {
        self.config.wiki.default_file_kind = file_kind.into();
        self.write_config()
    }

    pub fn author(&self) -> &Author {
        &self.config.author
    }

    pub fn set_author(&mut self, name: &str, mail: &str) -> Result<()> {
        self.config.author = Author {
            name: name.into(),
            mail: mail.into(),
        };
        self.write_config()
    }

    /// URL of the remote, preferring the configuration file over Git's.
    pub fn remote_url(&self) -> Result<Option<String>> {
        if !self.config.remote.url.is_empty() {
            return Ok(Some(self.config.remote.url.clone()));
        }

        Ok(self.repo.remote_url()?.filter(|url| !url.is_empty()))
    }

    pub fn set_remote_url(&mut self, url: &str) -> Result<()> {
        self.repo.set_remote_url(url)?;
        self.config.remote.url = url.into();
        self.write_config()
    }

    pub(crate) fn write_config_file(&mut self) -> Result<()> {
        let path = self.path.join(CONFIG_FILE_NAME);
        fs::write(&path, self.config.to_string())
            .map_err(|source| WikiError::WriteConfig { source, path })?;

        let root = self.root;
        self.get_mut(root)?.pending.insert(CONFIG_FILE_NAME);

        Ok(())
    }

    fn write_config(&mut self) -> Result<()> {
        self.write_config_file()?;
        self.commit(self.root, "Update wiki configuration.", ChangeSet::new())
    }

    /// Import every tracked path into the article tree.
    ///
    /// Paths are visited in natural order so siblings come out in a stable,
    /// human friendly order. Infrastructure files are skipped. Each remaining
    /// path becomes a leaf, and every directory along the way a category.
    /// Categories take their file kind from their own index file when one is
    /// tracked.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::Repository`] if the index cannot be read.
    #[instrument(skip(self), level = "debug")]
    pub fn import_current_index(&mut self) -> Result<()> {
        let mut tracked = self.repo.tracked_paths()?;
        tracked.sort_by(|a, b| natural_cmp(a, b));

        let mut index_kinds = HashMap::new();
        for path in &tracked {
            let (dir, base) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
            if let Some(file_kind) = base.strip_prefix(INDEX_BASENAME) {
                index_kinds.insert(dir.to_string(), file_kind.to_string());
            }
        }

        if let Some(file_kind) = index_kinds.get("") {
            let root = self.root;
            self.get_mut(root)?.file_kind = file_kind.clone();
        }

        for path in tracked.iter().filter(|path| !is_reserved(path)) {
            let components = split_url(path);
            let Some((last, dirs)) = components.split_last() else {
                continue;
            };
            let (stem, file_kind) = split_file_kind(last);

            let mut prefix = String::new();
            let mut segments = Vec::with_capacity(components.len());
            for dir in dirs {
                prefix = join(&prefix, dir);
                let dir_kind = index_kinds
                    .get(&prefix)
                    .map(String::as_str)
                    .unwrap_or(file_kind);
                segments.push(Segment::verbatim(dir, dir_kind));
            }
            segments.push(Segment::verbatim(stem, file_kind));

            debug!("import {path:?}");
            if let Err(err) = self.descend_or_create(self.root, segments) {
                warn!("cannot import {path:?}: {err}");
            }
        }

        Ok(())
    }

    /// Refresh cached set of unstaged paths.
    pub fn fetch_unstaged_changes(&mut self) -> Result<()> {
        self.unstaged = self.repo.unstaged_paths()?;
        Ok(())
    }

    /// Check if relative path has unstaged changes.
    ///
    /// Git always reports forward slashes, so the path is normalized first.
    pub fn is_path_unstaged(&self, path: &str) -> bool {
        self.unstaged.contains(&to_forward_slashes(path))
    }

    /// Check if the work tree has any unstaged change at all.
    pub fn has_any_unstaged_changes(&self) -> bool {
        !self.unstaged.is_empty()
    }

    /// Every unstaged path in sorted order.
    pub fn unstaged_paths(&self) -> Vec<&str> {
        let mut paths = self.unstaged.iter().map(String::as_str).collect::<Vec<_>>();
        paths.sort_unstable();
        paths
    }

    /// Check if article's content file has uncommitted edits on disk.
    pub fn has_unstaged_changes(&self, id: ArticleId) -> Result<bool> {
        Ok(self.is_path_unstaged(&self.content_path(id)?))
    }

    /// Create new article beneath parent and commit it.
    ///
    /// The article's file name is a slug of its name. If the parent is a
    /// leaf, it turns into a category as part of the same commit.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::FileConflict`] if a sibling already has the same
    ///   file name, ignoring case.
    /// - Return [`WikiError::Repository`] if staging or committing fails.
    #[instrument(skip(self), level = "debug")]
    pub fn create_article(
        &mut self,
        name: &str,
        file_kind: &str,
        parent: ArticleId,
    ) -> Result<ArticleId> {
        let name = name.trim();
        let segment = Segment::named(name, file_kind);
        if self.child_by_file_name(parent, &segment.file_name).is_some() {
            return Err(WikiError::FileConflict {
                path: self.path.join(join(&self.dir_path(parent)?, &segment.file_name)),
            });
        }

        let id = self.insert(segment.into_article(ArticleKind::Leaf));
        let mut changes = ChangeSet::new();
        if let Err(err) = self.attach(parent, id, &mut changes) {
            self.articles[id.0] = None;
            return Err(err);
        }

        self.set_text(id, &format!("# {name}\n"))?;
        self.write(id)?;
        let message = format!("Initial commit for '{}'", self.wiki_url(id)?);
        self.commit(id, &message, changes)?;

        Ok(id)
    }

    /// Create every missing article along URL, each with its own commit.
    ///
    /// Unlike [`Wiki::create_by_url`], every created article is written with
    /// a heading, so implicit parents survive on disk even after their
    /// children are gone. Existing articles along the way are reused.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::InvalidOperation`] if URL has no components.
    /// - Return [`WikiError::Repository`] if staging or committing fails.
    #[instrument(skip(self), level = "debug")]
    pub fn create_articles_by_url(&mut self, url: &str, file_kind: &str) -> Result<ArticleId> {
        let components = split_url(url);
        if components.is_empty() {
            return Err(WikiError::InvalidOperation(format!(
                "no article name in url {url:?}"
            )));
        }

        let mut current = self.root;
        for component in components {
            current = match self.child_by_name(current, component) {
                Some(child) => child,
                None => self.create_article(component, file_kind, current)?,
            };
        }

        Ok(current)
    }

    /// Render article to HTML with the renderer registered for its kind.
    pub fn render(&mut self, id: ArticleId, renderers: &Renderers) -> Result<String> {
        let renderer = renderers.for_kind(self.get(id)?.file_kind());
        let text = self.text(id)?.to_string();

        Ok(renderer.render(&text, |url| self.article_by_url(url).is_some()))
    }

    /// Render every article into an output directory.
    ///
    /// Categories become `<dir>/index.html`, leaves `<path>.html`.
    ///
    /// # Errors
    ///
    /// - Return [`WikiError::CreateDirectory`] or [`WikiError::WriteExport`]
    ///   if output cannot be written.
    #[instrument(skip(self, output, renderers), level = "debug")]
    pub fn export(&mut self, output: impl AsRef<Path>, renderers: &Renderers) -> Result<()> {
        let output = output.as_ref();
        for id in self.descendants(self.root) {
            let html = self.render(id, renderers)?;
            let dir = self.dir_path(id)?;
            let target = if self.get(id)?.is_category() {
                output.join(join(&dir, "index.html"))
            } else {
                output.join(format!("{dir}.html"))
            };

            if let Some(parent) = target.parent() {
                mkdirp(parent).map_err(|source| WikiError::CreateDirectory {
                    source,
                    path: parent.to_path_buf(),
                })?;
            }
            debug!("export {:?}", target.display());
            fs::write(&target, html).map_err(|source| WikiError::WriteExport {
                source,
                path: target.clone(),
            })?;
        }

        Ok(())
    }

    /// Indented listing of the whole tree.
    pub fn dump(&self) -> Result<String> {
        let mut out = String::new();
        self.dump_into(self.root, 0, &mut out)?;
        Ok(out)
    }

    fn dump_into(&self, id: ArticleId, depth: usize, out: &mut String) -> Result<()> {
        let article = self.get(id)?;
        out.push_str(&format!(
            "{}{}{} (category: {}, url: {:?}, path: {:?})\n",
            "  ".repeat(depth),
            article.name(),
            article.file_kind(),
            article.is_category(),
            self.wiki_url(id)?,
            self.physical_path(id)?,
        ));

        for child in article.children() {
            self.dump_into(*child, depth + 1, out)?;
        }

        Ok(())
    }
}

fn read_config(workdir: &Path) -> Result<WikiConfig> {
    let path = workdir.join(CONFIG_FILE_NAME);
    match fs::read_to_string(&path) {
        Ok(data) => Ok(data.parse()?),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("no configuration at {:?}, using defaults", path.display());
            Ok(WikiConfig::default())
        }
        Err(source) => Err(WikiError::ReadConfig { source, path }),
    }
}

/// All possible error types for wiki interaction.
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// Path holds no version control metadata.
    #[error("{:?} is not a repository", path.display())]
    NotARepository { path: PathBuf },

    /// Article id does not belong to a live article.
    #[error("article {0} does not exist")]
    UnknownArticle(ArticleId),

    /// Target of a create or rename already exists.
    #[error("{:?} already exists", path.display())]
    FileConflict { path: PathBuf },

    /// Operation would break the tree, rejected before any change.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Category directory holds more than its index file.
    #[error("category directory {:?} is not empty", path.display())]
    CategoryNotEmpty { path: PathBuf },

    /// Article content cannot be read.
    #[error("failed to read article at {:?}", path.display())]
    ReadArticle {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Article content cannot be written.
    #[error("failed to write article at {:?}", path.display())]
    WriteArticle {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be created.
    #[error("failed to create directory at {:?}", path.display())]
    CreateDirectory {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be listed.
    #[error("failed to read directory at {:?}", path.display())]
    ReadDirectory {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be removed.
    #[error("failed to remove directory at {:?}", path.display())]
    RemoveDirectory {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be removed.
    #[error("failed to remove file at {:?}", path.display())]
    RemoveFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File or directory cannot be moved.
    #[error("failed to move {:?} to {:?}", from.display(), to.display())]
    Rename {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Configuration file cannot be read.
    #[error("failed to read configuration at {:?}", path.display())]
    ReadConfig {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file cannot be written.
    #[error("failed to write configuration at {:?}", path.display())]
    WriteConfig {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Exported HTML cannot be written.
    #[error("failed to write export at {:?}", path.display())]
    WriteExport {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration parsing fails.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version control operations fail.
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Friendly result alias :3
pub type Result<T, E = WikiError> = std::result::Result<T, E>;
