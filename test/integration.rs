// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{
    create_wiki, head_changes, head_summary, set_of, tracked_paths, CommitRefusingRepository,
    RepoFixture,
};

use gitwiki::{
    path::split_url, wiki::changes::ChangeSet, ArticleKind, Renderers, Transfer, Wiki, WikiError,
};

use anyhow::Result;
use auth_git2::GitAuthenticator;
use git2::{Repository, RepositoryInitOptions};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn create_article_tracks_exactly_its_paths() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("ArticleOne", ".md", root)?;

    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "_index.md", "ArticleOne.md"])
    );
    assert_eq!(wiki.physical_path(id)?, "ArticleOne.md");
    assert_eq!(wiki.text(id)?, "# ArticleOne\n");
    assert_eq!(head_summary(dir.path())?, "Initial commit for 'ArticleOne'");

    Ok(())
}

#[test]
fn create_then_delete_child_round_trips_category() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let one = wiki.create_article("ArticleOne", ".md", root)?;
    let two = wiki.create_article("ArticleTwo", ".md", one)?;
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[
            ".wikiconfig",
            "_index.md",
            "ArticleOne/ArticleTwo.md",
            "ArticleOne/_index.md",
        ])
    );
    assert_eq!(wiki.article(one).map(|a| a.kind()), Some(ArticleKind::Category));
    assert!(dir.path().join("ArticleOne/_index.md").is_file());

    wiki.delete(two, true)?;
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "_index.md", "ArticleOne.md"])
    );
    assert_eq!(wiki.article(one).map(|a| a.kind()), Some(ArticleKind::Leaf));
    assert!(wiki.article(two).is_none());
    assert!(!dir.path().join("ArticleOne").exists());
    assert_eq!(fs::read_to_string(dir.path().join("ArticleOne.md"))?, "# ArticleOne\n");
    assert_eq!(head_summary(dir.path())?, "Deleted 'ArticleOne/ArticleTwo'");

    Ok(())
}

#[test]
fn conversion_commit_holds_old_and_new_location() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let one = wiki.create_article("ArticleOne", ".md", root)?;
    wiki.create_article("ArticleTwo", ".md", one)?;

    let changes = head_changes(dir.path())?;
    assert!(changes.contains("ArticleOne.md"));
    assert!(changes.contains("ArticleOne/_index.md"));
    assert!(changes.contains("ArticleOne/ArticleTwo.md"));

    Ok(())
}

#[test]
fn delete_removes_whole_subtree() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    let b = wiki.create_article("B", ".md", a)?;
    let c = wiki.create_article("C", ".md", b)?;
    wiki.create_article("D", ".md", root)?;

    wiki.delete(a, true)?;

    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "_index.md", "D.md"])
    );
    assert!(!dir.path().join("A").exists());
    assert!(wiki.article(b).is_none());
    assert!(wiki.article(c).is_none());
    assert_eq!(wiki.article(root).map(|a| a.children().len()), Some(1));

    Ok(())
}

#[test]
fn delete_without_commit_keeps_pending_paths() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    wiki.delete(a, false)?;

    assert!(wiki.article(root).is_some_and(|r| r.pending().contains("A.md")));
    assert!(tracked_paths(dir.path())?.contains("A.md"));

    wiki.commit_all()?;
    assert_eq!(tracked_paths(dir.path())?, set_of(&[".wikiconfig", "_index.md"]));

    Ok(())
}

#[test]
fn root_cannot_be_deleted_or_moved() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    assert!(matches!(wiki.delete(root, true), Err(WikiError::InvalidOperation(_))));
    assert!(matches!(
        wiki.move_article(root, "Elsewhere", None),
        Err(WikiError::InvalidOperation(_))
    ));

    Ok(())
}

#[test]
fn rename_keeps_identity() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    wiki.move_article(id, "Rose Garden", None)?;

    assert_eq!(wiki.article(id).map(|a| a.file_name()), Some("Rose-Garden"));
    assert_eq!(wiki.article_by_url("Rose Garden"), Some(id));
    assert!(!dir.path().join("Garden.md").exists());
    assert!(dir.path().join("Rose-Garden.md").is_file());
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "Rose-Garden.md", "_index.md"])
    );
    assert_eq!(head_summary(dir.path())?, "Moved 'Garden' to 'Rose Garden'.");

    Ok(())
}

#[test]
fn rename_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    wiki.set_text(id, "# Garden\nroses\n")?;
    wiki.write(id)?;
    wiki.commit(id, "", ChangeSet::new())?;
    wiki.move_article(id, "Rose Garden", None)?;
    assert_eq!(
        head_changes(dir.path())?,
        set_of(&["Garden.md", "Rose-Garden.md"])
    );
    drop(wiki);

    let mut wiki = Wiki::open(dir.path())?;
    let id = wiki
        .article_by_url("Rose Garden")
        .ok_or_else(|| anyhow::anyhow!("renamed article not found"))?;
    assert_eq!(wiki.text(id)?, "# Rose Garden\nroses\n");
    assert_eq!(wiki.wiki_url(id)?, "Rose Garden");
    assert_eq!(wiki.article_by_url("Rose Garden"), Some(id));

    Ok(())
}

#[test]
fn rename_to_same_slug_is_noop() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    wiki.move_article(id, "  Garden ", None)?;

    assert_eq!(head_summary(dir.path())?, "Initial commit for 'Garden'");

    Ok(())
}

#[test]
fn move_beneath_leaf_turns_it_into_category() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    let b = wiki.create_article("B", ".md", root)?;
    wiki.move_article(b, "B", Some(a))?;

    assert!(!dir.path().join("B.md").exists());
    assert!(dir.path().join("A/B.md").is_file());
    assert!(dir.path().join("A/_index.md").is_file());
    assert_eq!(wiki.article(a).map(|a| a.kind()), Some(ArticleKind::Category));
    assert_eq!(wiki.article(b).and_then(|b| b.parent()), Some(a));
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "A/B.md", "A/_index.md", "_index.md"])
    );
    assert_eq!(head_summary(dir.path())?, "Moved 'B' to 'A/B'.");

    Ok(())
}

#[test]
fn move_out_of_category_turns_it_back_into_leaf() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    let b = wiki.create_article("B", ".md", a)?;
    wiki.move_article(b, "B", Some(root))?;

    assert!(!dir.path().join("A").exists());
    assert!(dir.path().join("A.md").is_file());
    assert!(dir.path().join("B.md").is_file());
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "A.md", "B.md", "_index.md"])
    );

    Ok(())
}

#[test]
fn rename_category_moves_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    let b = wiki.create_article("B", ".md", a)?;
    wiki.move_article(a, "Alpha", None)?;

    assert!(!dir.path().join("A").exists());
    assert!(dir.path().join("Alpha/_index.md").is_file());
    assert!(dir.path().join("Alpha/B.md").is_file());
    assert_eq!(wiki.wiki_url(b)?, "Alpha/B");
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "Alpha/B.md", "Alpha/_index.md", "_index.md"])
    );

    Ok(())
}

#[test]
fn move_beneath_itself_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    let b = wiki.create_article("B", ".md", a)?;
    let before = tracked_paths(dir.path())?;

    let result = wiki.move_article(a, "A", Some(a));
    assert!(matches!(result, Err(WikiError::InvalidOperation(_))));
    let result = wiki.move_article(a, "A", Some(b));
    assert!(matches!(result, Err(WikiError::InvalidOperation(_))));

    assert_eq!(tracked_paths(dir.path())?, before);
    assert!(dir.path().join("A/_index.md").is_file());
    assert!(dir.path().join("A/B.md").is_file());
    assert_eq!(wiki.article(a).and_then(|a| a.parent()), Some(root));

    Ok(())
}

#[test]
fn move_onto_sibling_name_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    wiki.create_article("Garden", ".md", root)?;
    let roses = wiki.create_article("Roses", ".md", root)?;

    let result = wiki.move_article(roses, "garden", None);
    assert!(matches!(result, Err(WikiError::FileConflict { .. })));
    assert!(dir.path().join("Roses.md").is_file());
    assert_eq!(wiki.article(roses).map(|a| a.file_name()), Some("Roses"));

    let result = wiki.create_article("GARDEN", ".md", root);
    assert!(matches!(result, Err(WikiError::FileConflict { .. })));

    Ok(())
}

#[test]
fn folder_conversion_refuses_existing_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    fs::create_dir(dir.path().join("A"))?;

    let result = wiki.convert_to_folder(a);
    assert!(matches!(result, Err(WikiError::FileConflict { .. })));
    assert!(dir.path().join("A.md").is_file());
    assert_eq!(wiki.article(a).map(|a| a.kind()), Some(ArticleKind::Leaf));

    Ok(())
}

#[test]
fn file_conversion_refuses_stray_files() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let a = wiki.create_article("A", ".md", root)?;
    wiki.convert_to_folder(a)?;
    assert!(dir.path().join("A/_index.md").is_file());
    fs::write(dir.path().join("A/stray.txt"), "left behind")?;

    let result = wiki.convert_to_file(a);
    assert!(matches!(result, Err(WikiError::CategoryNotEmpty { .. })));
    assert!(dir.path().join("A/_index.md").is_file());
    assert!(!dir.path().join("A.md").exists());

    fs::remove_file(dir.path().join("A/stray.txt"))?;
    wiki.convert_to_file(a)?;
    assert!(dir.path().join("A.md").is_file());
    assert_eq!(head_summary(dir.path())?, "Turned 'A' into an article.");

    Ok(())
}

#[test]
fn import_resolves_every_article_by_its_url() -> Result<()> {
    let fixture = RepoFixture::new()?;
    fixture.stage_and_commit("_index.md", "# Home\n")?;
    fixture.stage_and_commit("Projects/_index.md", "# Projects\n")?;
    fixture.stage_and_commit("Projects/page10.md", "ten\n")?;
    fixture.stage_and_commit("Projects/Garden.md", "# Rose Garden\n")?;
    fixture.stage_and_commit("Projects/page2.md", "two\n")?;
    fixture.stage_and_commit("Notes.txt", "plain\n")?;

    let mut wiki = Wiki::open(fixture.path())?;
    let root = wiki.root();

    let projects = wiki.article_by_url("Projects").expect("projects imported");
    let article = wiki.article(projects).expect("projects is live");
    assert!(article.is_category());
    assert_eq!(article.file_kind(), ".md");

    let children = article
        .children()
        .iter()
        .filter_map(|id| wiki.article(*id).map(|a| a.file_name().to_string()))
        .collect::<Vec<_>>();
    assert_eq!(children, vec!["Garden", "page2", "page10"]);

    for id in wiki.descendants(root) {
        let url = wiki.wiki_url(id)?;
        assert_eq!(wiki.resolve(root, &split_url(&url).join("/")), Some(id));

        wiki.text(id)?;
        let url = wiki.wiki_url(id)?;
        assert_eq!(wiki.resolve(root, &url), Some(id));
    }

    assert_eq!(wiki.article_by_url("Projects/Rose Garden"), wiki.article_by_url("projects/garden"));
    assert_eq!(wiki.article_by_url("Projects/Missing"), None);

    Ok(())
}

#[test]
fn create_by_url_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let first = wiki.create_by_url(root, "Projects/Garden", ".md")?;
    let second = wiki.create_by_url(root, "/Projects//Garden/", ".md")?;
    assert_eq!(first, second);

    let projects = wiki.article_by_url("Projects").expect("projects created");
    assert!(wiki.article(projects).is_some_and(|a| a.is_category()));
    assert_eq!(wiki.article(first).map(|a| a.kind()), Some(ArticleKind::Leaf));
    assert_eq!(wiki.physical_path(first)?, "Projects/Garden.md");

    Ok(())
}

#[test]
fn text_assignment_normalizes_line_endings() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    assert!(!wiki.set_text(id, "# Garden\r\n")?);
    assert!(wiki.article(id).is_some_and(|a| !a.is_modified()));

    assert!(wiki.set_text(id, "# Rose Garden\r\nroses\rtulips\r\n")?);
    assert_eq!(wiki.text(id)?, "# Rose Garden\nroses\ntulips\n");
    assert!(wiki.article(id).is_some_and(|a| a.is_modified()));
    assert_eq!(wiki.article(id).map(|a| a.name()), Some("Rose Garden"));

    wiki.write(id)?;
    assert!(wiki.article(id).is_some_and(|a| !a.is_modified()));
    wiki.reload(id)?;
    assert_eq!(wiki.text(id)?, "# Rose Garden\nroses\ntulips\n");

    Ok(())
}

#[test]
fn unstaged_changes_follow_work_tree() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    assert!(!wiki.has_unstaged_changes(id)?);

    fs::write(dir.path().join("Garden.md"), "# Garden\nedited elsewhere\n")?;
    wiki.fetch_unstaged_changes()?;
    assert!(wiki.has_unstaged_changes(id)?);
    assert!(wiki.is_path_unstaged("Garden.md"));
    assert_eq!(wiki.unstaged_paths(), vec!["Garden.md"]);

    wiki.reload(id)?;
    wiki.text(id)?;
    wiki.commit(id, "", [wiki.content_path(id)?])?;
    assert!(!wiki.has_unstaged_changes(id)?);
    assert_eq!(head_summary(dir.path())?, "Update article 'Garden'");

    Ok(())
}

#[test]
fn history_lists_commits_newest_first() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    wiki.create_article("Unrelated", ".md", root)?;
    wiki.set_text(id, "# Garden\nroses")?;
    wiki.write(id)?;
    wiki.commit(id, "", ChangeSet::new())?;

    let history = wiki.history(id)?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].summary, "Update article 'Garden'");
    assert_eq!(history[1].summary, "Initial commit for 'Garden'");
    assert_eq!(history[0].author, "John Doe <john@doe.com>");

    assert_eq!(history[0].lines(&wiki)?, vec!["# Garden\n", "roses\n"]);
    assert_eq!(history[1].lines(&wiki)?, vec!["# Garden\n"]);
    assert!(history[1].diff(&wiki)?.contains("+roses"));

    Ok(())
}

#[test]
fn history_of_fresh_repository_is_empty() -> Result<()> {
    let fixture = RepoFixture::new()?;
    let wiki = Wiki::open(fixture.path())?;

    assert!(wiki.history(wiki.root())?.is_empty());

    Ok(())
}

#[test]
fn diff_against_head_after_deletion() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    let history = wiki.history(id)?;
    wiki.delete(id, true)?;

    assert_eq!(head_summary(dir.path())?, "Deleted 'Garden'");
    let diff = history[0].diff(&wiki)?;
    assert!(diff.contains("-# Garden"));
    assert!(!diff.contains("+# Garden"));

    Ok(())
}

#[test]
fn links_resolve_after_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let target = wiki.create_article("Rose Garden", ".md", root)?;
    let home = wiki.create_article("Home", ".md", root)?;
    wiki.set_text(home, "# Home\nSee [[Rose Garden]].\n")?;
    wiki.write(home)?;
    wiki.commit(home, "", ChangeSet::new())?;
    assert_eq!(wiki.article(home).map(|a| a.links().to_vec()), Some(vec![target]));
    drop(wiki);

    let mut wiki = Wiki::open(dir.path())?;
    let target = wiki
        .article_by_url("Rose Garden")
        .ok_or_else(|| anyhow::anyhow!("link target not found"))?;
    let home = wiki
        .article_by_url("Home")
        .ok_or_else(|| anyhow::anyhow!("home not found"))?;
    wiki.text(home)?;
    assert_eq!(wiki.article(home).map(|a| a.links().to_vec()), Some(vec![target]));

    let html = wiki.render(home, &Renderers::default())?;
    assert!(!html.contains("class=\"missing\""));

    Ok(())
}

#[test]
fn implicit_parents_survive_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;

    let parent = wiki.create_articles_by_url("Projects", ".md")?;
    let child = wiki.create_article("Garden", ".md", parent)?;
    assert_eq!(wiki.create_articles_by_url("Projects/Garden", ".md")?, child);
    assert!(dir.path().join("Projects/_index.md").is_file());

    wiki.delete(child, true)?;
    drop(wiki);

    let mut wiki = Wiki::open(dir.path())?;
    let parent = wiki
        .article_by_url("Projects")
        .ok_or_else(|| anyhow::anyhow!("implicit parent vanished"))?;
    assert_eq!(wiki.text(parent)?, "# Projects\n");
    assert_eq!(wiki.physical_path(parent)?, "Projects.md");

    Ok(())
}

#[test]
fn failed_commit_keeps_pending_paths() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();
    wiki.create_article("Garden", ".md", root)?;
    drop(wiki);

    let mut wiki = Wiki::load(CommitRefusingRepository::open(dir.path())?)?;
    let id = wiki
        .article_by_url("Garden")
        .ok_or_else(|| anyhow::anyhow!("article not found"))?;
    wiki.set_text(id, "# Garden\nroses\n")?;
    wiki.write(id)?;

    assert!(wiki.commit(id, "", ChangeSet::new()).is_err());
    assert!(wiki
        .article(id)
        .is_some_and(|article| article.pending().contains("Garden.md")));

    Ok(())
}

#[test]
fn links_keep_only_resolved_targets() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let projects = wiki.create_article("Projects", ".md", root)?;
    let roses = wiki.create_article("Roses", ".md", projects)?;
    let garden = wiki.create_article("Garden", ".md", root)?;
    wiki.set_text(
        garden,
        "# Garden\n[[Projects:Roses]] [[Missing]] [[projects/roses|again]] [[Projects]]\n",
    )?;

    assert_eq!(
        wiki.article(garden).map(|a| a.links().to_vec()),
        Some(vec![roses, projects])
    );

    Ok(())
}

#[test]
fn open_rejects_plain_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let result = Wiki::open(dir.path());
    assert!(matches!(result, Err(WikiError::NotARepository { .. })));

    Ok(())
}

#[test]
fn configuration_persists_across_open() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;

    wiki.set_author("Jane Roe", "jane@roe.com")?;
    wiki.set_default_file_kind(".txt")?;
    assert_eq!(head_summary(dir.path())?, "Update wiki configuration.");
    drop(wiki);

    let wiki = Wiki::open(dir.path())?;
    assert_eq!(wiki.name(), "Test Wiki");
    assert_eq!(wiki.author().to_string(), "Jane Roe <jane@roe.com>");
    assert_eq!(wiki.default_file_kind(), ".txt");
    assert_eq!(wiki.remote_url()?, None);

    Ok(())
}

#[test]
fn file_kind_change_renames_content() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let id = wiki.create_article("Garden", ".md", root)?;
    wiki.set_file_kind(id, ".txt")?;

    assert!(!dir.path().join("Garden.md").exists());
    assert!(dir.path().join("Garden.txt").is_file());
    assert_eq!(
        tracked_paths(dir.path())?,
        set_of(&[".wikiconfig", "Garden.txt", "_index.md"])
    );
    assert_eq!(head_summary(dir.path())?, "Changed file type of 'Garden' to '.txt'");

    Ok(())
}

#[test]
fn export_writes_page_per_article() -> Result<()> {
    let dir = TempDir::new()?;
    let out = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let one = wiki.create_article("ArticleOne", ".md", root)?;
    wiki.create_article("ArticleTwo", ".md", one)?;
    wiki.export(out.path(), &Renderers::default())?;

    assert!(out.path().join("index.html").is_file());
    assert!(out.path().join("ArticleOne/index.html").is_file());
    let html = fs::read_to_string(out.path().join("ArticleOne/ArticleTwo.html"))?;
    assert!(html.contains("<h1>ArticleTwo</h1>"));

    Ok(())
}

#[test]
fn dump_lists_every_article() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let root = wiki.root();

    let one = wiki.create_article("ArticleOne", ".md", root)?;
    wiki.create_article("ArticleTwo", ".md", one)?;

    let dump = wiki.dump()?;
    let lines = dump.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("  ArticleOne.md (category: true"));
    assert!(lines[2].starts_with("    ArticleTwo.md (category: false"));

    Ok(())
}

#[test]
fn transfer_without_remote_does_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let mut wiki = create_wiki(&dir)?;
    let authenticator = GitAuthenticator::default();

    let mut messages = Vec::new();
    assert_eq!(
        wiki.pull(&authenticator, |msg| messages.push(msg.to_string()))?,
        Transfer::NoRemote
    );
    assert_eq!(
        wiki.push(&authenticator, |msg| messages.push(msg.to_string()))?,
        Transfer::NoRemote
    );
    assert!(messages.is_empty());

    Ok(())
}

#[test]
fn push_then_pull_through_local_remote() -> Result<()> {
    let remote = TempDir::new()?;
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    Repository::init_opts(remote.path(), &opts)?;
    let url = remote.path().to_string_lossy().into_owned();

    let first_dir = TempDir::new()?;
    let mut first = Wiki::create(
        "Shared",
        first_dir.path(),
        &url,
        ".md",
        "John Doe",
        "john@doe.com",
        "# Shared\n",
    )?;
    let authenticator = GitAuthenticator::default();
    let mut messages = Vec::new();
    assert_eq!(
        first.push(&authenticator, |msg| messages.push(msg.to_string()))?,
        Transfer::Completed
    );
    assert_eq!(messages.last().map(String::as_str), Some("Push successful.\n"));

    let second_dir = TempDir::new()?;
    Repository::clone(&url, second_dir.path())?;
    let mut second = Wiki::open(second_dir.path())?;
    let root = second.root();
    second.create_article("FromSecond", ".md", root)?;
    assert_eq!(second.push(&authenticator, |_| {})?, Transfer::Completed);

    assert_eq!(first.pull(&authenticator, |_| {})?, Transfer::Completed);
    assert!(first.article_by_url("FromSecond").is_some());
    assert!(first_dir.path().join("FromSecond.md").is_file());

    Ok(())
}
