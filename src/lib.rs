// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git backed hierarchical wiki.
//!
//! A wiki is a Git repository whose tracked files form a tree of articles.
//! Articles become directories with an index file as soon as they gain
//! children, and plain files again once they lose the last one. Every
//! structural change lands in the repository as exactly one commit.
//!
//! Start with [`Wiki::open`] or [`Wiki::create`].

pub mod config;
pub mod path;
pub mod render;
pub mod repo;
pub mod wiki;

pub use config::WikiConfig;
pub use render::{Renderer, Renderers};
pub use repo::{Git2Repository, VersionControl};
pub use wiki::{
    article::{Article, ArticleId, ArticleKind},
    Transfer, Wiki, WikiError,
};
