// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use gitwiki::{
    path::{default_wiki_dir, split_url},
    repo::remote::IndicatifPrompter,
    wiki::{changes::ChangeSet, history::HistoryEntry},
    ArticleId, Renderers, Transfer, Wiki,
};

use anyhow::{anyhow, Result};
use auth_git2::GitAuthenticator;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::exit,
    time::Duration,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "gitwiki [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to wiki repository.
    #[arg(short, long, global = true, value_name = "path")]
    pub wiki: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let path = match self.wiki {
            Some(path) => path,
            None => default_wiki_dir()?,
        };

        match self.command {
            Command::Init(opts) => run_init(path, opts),
            Command::Tree => run_tree(&Wiki::open(&path)?),
            Command::New(opts) => run_new(&mut Wiki::open(&path)?, opts),
            Command::Mv(opts) => run_mv(&mut Wiki::open(&path)?, opts),
            Command::Rm(opts) => run_rm(&mut Wiki::open(&path)?, opts),
            Command::Cat(opts) => run_cat(&mut Wiki::open(&path)?, opts),
            Command::Put(opts) => run_put(&mut Wiki::open(&path)?, opts),
            Command::Render(opts) => run_render(&mut Wiki::open(&path)?, opts),
            Command::Export(opts) => run_export(&mut Wiki::open(&path)?, opts),
            Command::History(opts) => run_history(&Wiki::open(&path)?, opts),
            Command::Links(opts) => run_links(&mut Wiki::open(&path)?, opts),
            Command::Status => run_status(&Wiki::open(&path)?),
            Command::Pull => run_transfer(&mut Wiki::open(&path)?, Direction::Pull),
            Command::Push => run_transfer(&mut Wiki::open(&path)?, Direction::Push),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Initialize new wiki.
    #[command(override_usage = "gitwiki init [options] <name>")]
    Init(InitOptions),

    /// Show article tree.
    Tree,

    /// Create new article.
    #[command(override_usage = "gitwiki new [options] <url>")]
    New(NewOptions),

    /// Rename or move article.
    #[command(override_usage = "gitwiki mv [options] <url> <new_name>")]
    Mv(MoveOptions),

    /// Delete article with all of its children.
    #[command(override_usage = "gitwiki rm <url>")]
    Rm(UrlOptions),

    /// Print article text.
    #[command(override_usage = "gitwiki cat <url>")]
    Cat(UrlOptions),

    /// Replace article text and commit it.
    #[command(override_usage = "gitwiki put [options] <url>")]
    Put(PutOptions),

    /// Render article to HTML.
    #[command(override_usage = "gitwiki render <url>")]
    Render(UrlOptions),

    /// Render whole wiki into a directory.
    #[command(override_usage = "gitwiki export <output>")]
    Export(ExportOptions),

    /// Show commits that changed an article.
    #[command(override_usage = "gitwiki history [options] <url>")]
    History(HistoryOptions),

    /// List articles an article links to.
    #[command(override_usage = "gitwiki links <url>")]
    Links(UrlOptions),

    /// List paths with unstaged changes.
    Status,

    /// Pull from remote.
    Pull,

    /// Push to remote.
    Push,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Display name of the wiki.
    #[arg(value_name = "name")]
    pub name: String,

    /// URL of remote to pull from and push to.
    #[arg(short, long, value_name = "url")]
    pub remote: Option<String>,

    /// File kind of new articles.
    #[arg(short, long, value_name = "kind", default_value = ".md")]
    pub kind: String,

    /// Name used for commits.
    #[arg(long, value_name = "name", default_value = "Anonymous")]
    pub author_name: String,

    /// Mail address used for commits.
    #[arg(long, value_name = "mail", default_value = "anonymous@localhost")]
    pub author_mail: String,

    /// File holding initial text of the root article.
    #[arg(short, long, value_name = "path")]
    pub template: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UrlOptions {
    /// Wiki URL of article, e.g., "Projects/Garden".
    #[arg(value_name = "url")]
    pub url: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct NewOptions {
    /// Wiki URL of new article, missing parents are created.
    #[arg(value_name = "url")]
    pub url: String,

    /// File kind of new article, defaults to the wiki's.
    #[arg(short, long, value_name = "kind")]
    pub kind: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct MoveOptions {
    /// Wiki URL of article to move.
    #[arg(value_name = "url")]
    pub url: String,

    /// New name of article.
    #[arg(value_name = "new_name")]
    pub new_name: String,

    /// Wiki URL of new parent, "" for the root.
    #[arg(short, long, value_name = "url")]
    pub parent: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PutOptions {
    /// Wiki URL of article.
    #[arg(value_name = "url")]
    pub url: String,

    /// Read text from file instead of standard input.
    #[arg(short, long, value_name = "path")]
    pub file: Option<PathBuf>,

    /// Commit message.
    #[arg(short, long, value_name = "message", default_value = "")]
    pub message: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ExportOptions {
    /// Directory to write HTML into.
    #[arg(value_name = "output")]
    pub output: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct HistoryOptions {
    /// Wiki URL of article.
    #[arg(value_name = "url")]
    pub url: String,

    /// Show diff of each commit's version against HEAD.
    #[arg(short, long)]
    pub diff: bool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Pull,
    Push,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn lookup(wiki: &Wiki, url: &str) -> Result<ArticleId> {
    wiki.article_by_url(url)
        .ok_or_else(|| anyhow!("no article at {url:?}"))
}

fn run_init(path: PathBuf, opts: InitOptions) -> Result<()> {
    let template = match opts.template {
        Some(template) => fs::read_to_string(template)?,
        None => format!("# {}\n", opts.name),
    };

    let wiki = Wiki::create(
        &opts.name,
        &path,
        opts.remote.as_deref().unwrap_or_default(),
        &opts.kind,
        &opts.author_name,
        &opts.author_mail,
        &template,
    )?;
    info!("created wiki {:?} at {:?}", wiki.name(), path.display());

    Ok(())
}

fn run_tree(wiki: &Wiki) -> Result<()> {
    print!("{}", wiki.dump()?);
    Ok(())
}

fn run_new(wiki: &mut Wiki, opts: NewOptions) -> Result<()> {
    let components = split_url(&opts.url);
    let (name, parents) = components
        .split_last()
        .ok_or_else(|| anyhow!("article needs a name"))?;
    let kind = opts
        .kind
        .unwrap_or_else(|| wiki.default_file_kind().to_string());

    let parent = match parents {
        [] => wiki.root(),
        parents => wiki.create_articles_by_url(&parents.join("/"), &kind)?,
    };
    let id = wiki.create_article(name, &kind, parent)?;
    info!("created {:?}", wiki.wiki_url(id)?);

    Ok(())
}

fn run_mv(wiki: &mut Wiki, opts: MoveOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    let parent = match opts.parent {
        Some(url) => Some(lookup(wiki, &url)?),
        None => None,
    };

    wiki.move_article(id, &opts.new_name, parent)?;
    info!("moved {:?} to {:?}", opts.url, wiki.wiki_url(id)?);

    Ok(())
}

fn run_rm(wiki: &mut Wiki, opts: UrlOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    wiki.delete(id, true)?;
    Ok(())
}

fn run_cat(wiki: &mut Wiki, opts: UrlOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    print!("{}", wiki.text(id)?);
    Ok(())
}

fn run_put(wiki: &mut Wiki, opts: PutOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    let text = match opts.file {
        Some(file) => fs::read_to_string(file)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    if !wiki.set_text(id, &text)? {
        info!("{:?} is unchanged", opts.url);
        return Ok(());
    }
    wiki.write(id)?;
    wiki.commit(id, &opts.message, ChangeSet::new())?;

    Ok(())
}

fn run_render(wiki: &mut Wiki, opts: UrlOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    print!("{}", wiki.render(id, &Renderers::default())?);
    Ok(())
}

fn run_export(wiki: &mut Wiki, opts: ExportOptions) -> Result<()> {
    wiki.export(&opts.output, &Renderers::default())?;
    info!("exported {:?} to {:?}", wiki.name(), opts.output.display());
    Ok(())
}

fn run_history(wiki: &Wiki, opts: HistoryOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    for entry in wiki.history(id)? {
        print_history_entry(wiki, &entry, opts.diff)?;
    }

    Ok(())
}

fn print_history_entry(wiki: &Wiki, entry: &HistoryEntry, diff: bool) -> Result<()> {
    println!("{} {} ({})", entry.short_sha(), entry.summary, entry.author);
    if diff {
        print!("{}", entry.diff(wiki)?);
    }

    Ok(())
}

fn run_links(wiki: &mut Wiki, opts: UrlOptions) -> Result<()> {
    let id = lookup(wiki, &opts.url)?;
    wiki.text(id)?;

    let links = wiki
        .article(id)
        .map(|article| article.links().to_vec())
        .unwrap_or_default();
    for link in links {
        println!("{}", wiki.wiki_url(link)?);
    }

    Ok(())
}

fn run_status(wiki: &Wiki) -> Result<()> {
    for path in wiki.unstaged_paths() {
        println!("modified: {path}");
    }

    Ok(())
}

fn run_transfer(wiki: &mut Wiki, direction: Direction) -> Result<()> {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{elapsed_precise:.green}  {spinner}  {msg}")?;
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    let prompter = IndicatifPrompter::new(bar.clone());
    let authenticator = GitAuthenticator::default().set_prompter(prompter);
    let progress = |message: &str| {
        let message = message.trim();
        if !message.is_empty() {
            bar.set_message(message.to_string());
        }
    };

    let outcome = match direction {
        Direction::Pull => wiki.pull(&authenticator, progress)?,
        Direction::Push => wiki.push(&authenticator, progress)?,
    };
    bar.finish_and_clear();

    match outcome {
        Transfer::Completed => info!("{direction:?} complete"),
        Transfer::NoRemote => info!("no remote configured"),
        Transfer::Failed => return Err(anyhow!("{direction:?} failed")),
    }

    Ok(())
}
