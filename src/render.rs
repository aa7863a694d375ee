// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Article rendering.
//!
//! Each file kind maps to exactly one [`Renderer`] through a [`Renderers`]
//! table. Kinds without an entry go through the table's fallback, which is
//! plain text unless configured otherwise.

use crate::wiki::links::replace_links;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use pulldown_cmark::{html as md_html, Options, Parser};
use std::collections::BTreeMap;

/// Way of turning article text into HTML.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// CommonMark with tables, strikethrough, and task lists.
    Markdown,

    /// Preformatted text, escaped as-is.
    #[default]
    Plain,
}

impl Renderer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Plain => "plain",
        }
    }

    /// Render text into a standalone HTML page.
    ///
    /// The `exists` callback decides whether a wiki link target resolves.
    /// Links to missing articles get `class="missing"`.
    pub fn render(&self, text: &str, exists: impl Fn(&str) -> bool) -> String {
        let body = match self {
            Self::Markdown => html! { (PreEscaped(render_markdown(text, exists))) },
            Self::Plain => html! { pre { (text) } },
        };

        page(body).into_string()
    }
}

fn page(body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
            }
            body {
                (body)
            }
        }
    }
}

fn render_markdown(text: &str, exists: impl Fn(&str) -> bool) -> String {
    let text = replace_links(text, |link| {
        let href = format!("/{}/", link.target);
        if exists(&link.target) {
            format!("[{}](<{href}>)", link.display())
        } else {
            html! { a class="missing" href=(href) { (link.display()) } }.into_string()
        }
    });

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut body = String::new();
    md_html::push_html(&mut body, Parser::new_ext(&text, options));
    body
}

/// Closed table from file kind to renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderers {
    table: BTreeMap<String, Renderer>,
    fallback: Renderer,
}

impl Renderers {
    /// Construct empty table, everything goes to the fallback.
    pub fn new(fallback: Renderer) -> Self {
        Self {
            table: BTreeMap::new(),
            fallback,
        }
    }

    /// Map file kind, e.g., ".md", to renderer.
    pub fn register(&mut self, file_kind: impl Into<String>, renderer: Renderer) -> &mut Self {
        self.table.insert(file_kind.into(), renderer);
        self
    }

    /// Renderer for file kind, ignoring case.
    pub fn for_kind(&self, file_kind: &str) -> Renderer {
        self.table
            .get(&file_kind.to_lowercase())
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Renderer {
        self.fallback
    }

    /// Every registered file kind with its renderer.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Renderer)> {
        self.table.iter().map(|(kind, renderer)| (kind.as_str(), *renderer))
    }
}

impl Default for Renderers {
    fn default() -> Self {
        let mut renderers = Self::new(Renderer::Plain);
        renderers
            .register(".md", Renderer::Markdown)
            .register(".markdown", Renderer::Markdown)
            .register(".txt", Renderer::Plain);
        renderers
    }
}
