use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use wikiql_core::assets::{
    ListAssetsOptions, UploadOptions, delete_asset, list_asset_folders, list_assets, upload_asset,
};
use wikiql_core::config::{load_config, resolve_config_path};
use wikiql_core::diff::{
    DEFAULT_CONTEXT_LINES, diff_lines, diff_lines_aligned, diff_stats, format_diff,
};
use wikiql_core::history::{get_page_version, get_page_versions, revert_page};
use wikiql_core::links::{
    MAX_HEADING_DEPTH, extract_headings, extract_links, find_broken_links, generate_toc,
    is_internal_link,
};
use wikiql_core::lint::lint_markdown;
use wikiql_core::pages::{
    CreatePageOptions, DEFAULT_LIST_LIMIT, GetPageOptions, ListPagesFilter, PageOrder, PageUpdate,
    SearchOptions, create_page, delete_page, get_page, list_pages, move_page, render_page,
    search_pages, update_page,
};
use wikiql_core::similarity::rank_similar;
use wikiql_core::system::{get_health, get_stats};
use wikiql_core::tags::{list_tags, search_tags};
use wikiql_core::tree::render_tree;
use wikiql_core::{Identifier, Page, PagePath, PageRef, Session, logging, validate_identifier};

#[derive(Debug, Parser)]
#[command(
    name = "wikiql",
    version,
    about = "Command-line client for a wiki GraphQL API"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print results as pretty JSON")]
    json: bool,
    #[arg(short, long, global = true, help = "Enable debug logging on stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Pages(PagesArgs),
    Tags(TagsArgs),
    Assets(AssetsArgs),
    #[command(about = "Show remote system information")]
    Health,
    #[command(about = "Aggregate page counts by status, locale and tag")]
    Stats,
    History(HistoryArgs),
    #[command(about = "Lint a local markdown file")]
    Lint(LintArgs),
    #[command(about = "Diff a remote page against a local file")]
    Diff(DiffArgs),
    #[command(about = "List links found in a remote page")]
    Links(LinksArgs),
    #[command(about = "Print a table of contents for a local markdown file")]
    Toc(TocArgs),
    #[command(about = "Rank pages by word overlap with a page")]
    Similar(SimilarArgs),
}

#[derive(Debug, Args)]
struct PagesArgs {
    #[command(subcommand)]
    command: PagesSubcommand,
}

#[derive(Debug, Subcommand)]
enum PagesSubcommand {
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, help = "Case-insensitive author name substring")]
        author: Option<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        #[arg(
            long,
            value_name = "FIELD",
            default_value = "title",
            help = "title, path, created, updated or id"
        )]
        order_by: String,
    },
    Get {
        #[arg(value_name = "ID_OR_PATH")]
        page: String,
        #[arg(long, help = "Include every page below this one")]
        children: bool,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long, help = "Print the page content")]
        content: bool,
    },
    Create {
        path: String,
        title: String,
        #[command(flatten)]
        body: BodyArgs,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long)]
        editor: Option<String>,
        #[arg(long, help = "Create unpublished")]
        draft: bool,
        #[arg(long)]
        private: bool,
    },
    Update {
        id: String,
        #[command(flatten)]
        body: BodyArgs,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long, conflicts_with = "unpublish")]
        publish: bool,
        #[arg(long)]
        unpublish: bool,
    },
    Move {
        id: String,
        destination: String,
        #[arg(long)]
        locale: Option<String>,
    },
    Delete {
        id: String,
    },
    Search {
        query: String,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        #[arg(long)]
        locale: Option<String>,
    },
    Tree {
        #[arg(long)]
        locale: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    Render {
        id: String,
    },
}

#[derive(Debug, Args)]
struct BodyArgs {
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,
    #[arg(long, value_name = "PATH", help = "Read page content from a file")]
    file: Option<PathBuf>,
}

impl BodyArgs {
    fn read(&self) -> Result<Option<String>> {
        match (&self.content, &self.file) {
            (Some(content), _) => Ok(Some(content.clone())),
            (None, Some(path)) => read_text(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Debug, Args)]
struct TagsArgs {
    #[arg(long, value_name = "QUERY", help = "Search tag names instead of listing")]
    search: Option<String>,
}

#[derive(Debug, Args)]
struct AssetsArgs {
    #[command(subcommand)]
    command: AssetsSubcommand,
}

#[derive(Debug, Subcommand)]
enum AssetsSubcommand {
    List {
        #[arg(long, help = "Filename prefix")]
        folder: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    Folders {
        #[arg(long, default_value_t = 0)]
        parent: u64,
    },
    Upload {
        file: PathBuf,
        #[arg(long)]
        folder_id: Option<u64>,
        #[arg(long)]
        rename: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
struct HistoryArgs {
    #[command(subcommand)]
    command: HistorySubcommand,
}

#[derive(Debug, Subcommand)]
enum HistorySubcommand {
    List { page_id: String },
    Show { page_id: String, version_id: String },
    Revert { page_id: String, version_id: String },
}

#[derive(Debug, Args)]
struct LintArgs {
    file: PathBuf,
}

#[derive(Debug, Args)]
struct DiffArgs {
    #[arg(value_name = "ID_OR_PATH")]
    page: String,
    file: PathBuf,
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    context: usize,
    #[arg(long, help = "Align lines instead of comparing by position")]
    aligned: bool,
}

#[derive(Debug, Args)]
struct LinksArgs {
    #[arg(value_name = "ID_OR_PATH")]
    page: String,
    #[arg(long, help = "Only internal links to pages that do not exist")]
    broken: bool,
}

#[derive(Debug, Args)]
struct TocArgs {
    file: PathBuf,
    #[arg(long, default_value_t = MAX_HEADING_DEPTH)]
    max_depth: usize,
}

#[derive(Debug, Args)]
struct SimilarArgs {
    #[arg(value_name = "ID_OR_PATH")]
    page: String,
    #[arg(long, default_value_t = 0.1)]
    threshold: f64,
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT, help = "Number of pages to compare against")]
    scan: usize,
}

struct App {
    session: Session,
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref(), |key| env::var(key).ok());
    let config = load_config(&config_path)?;
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_level().to_string()
    };
    logging::init(&level);
    debug!(config = %config_path.display(), "resolved configuration path");

    let Some(command) = cli.command else {
        let mut command = Cli::command();
        command.print_help()?;
        println!();
        return Ok(());
    };

    let mut app = App {
        session: Session::from_config(config),
        json: cli.json,
    };
    match command {
        Commands::Pages(PagesArgs { command }) => run_pages(&mut app, command),
        Commands::Tags(TagsArgs { search }) => run_tags(&mut app, search.as_deref()),
        Commands::Assets(AssetsArgs { command }) => run_assets(&mut app, command),
        Commands::Health => run_health(&mut app),
        Commands::Stats => run_stats(&mut app),
        Commands::History(HistoryArgs { command }) => run_history(&mut app, command),
        Commands::Lint(args) => run_lint(&app, &args),
        Commands::Diff(args) => run_diff(&mut app, &args),
        Commands::Links(args) => run_links(&mut app, &args),
        Commands::Toc(args) => run_toc(&app, &args),
        Commands::Similar(args) => run_similar(&mut app, &args),
    }
}

fn run_pages(app: &mut App, command: PagesSubcommand) -> Result<()> {
    match command {
        PagesSubcommand::List {
            tag,
            author,
            locale,
            limit,
            order_by,
        } => {
            let Some(order_by) = PageOrder::parse(&order_by) else {
                bail!("unknown --order-by value `{order_by}`");
            };
            let filter = ListPagesFilter {
                tag,
                author,
                locale,
                limit,
                order_by,
            };
            let pages = list_pages(&mut app.session, &filter)?;
            if app.json {
                return print_json(&pages);
            }
            println!("pages: {}", pages.len());
            for page in &pages {
                println!(
                    "  {} {} [{}] {}",
                    page.id, page.path, page.locale, page.title
                );
            }
            Ok(())
        }
        PagesSubcommand::Get {
            page,
            children,
            locale,
            content,
        } => {
            let page_ref = PageRef::parse(&page)?;
            let options = GetPageOptions {
                with_children: children,
                locale: locale.or_else(|| default_locale(app)),
            };
            let page = get_page(&mut app.session, &page_ref, &options)?;
            if app.json {
                return print_json(&page);
            }
            print_page(&page, content);
            Ok(())
        }
        PagesSubcommand::Create {
            path,
            title,
            body,
            description,
            tags,
            locale,
            editor,
            draft,
            private,
        } => {
            let path = PagePath::parse(&path)?;
            let settings = app.session.settings()?;
            let options = CreatePageOptions {
                content: body.read()?.unwrap_or_default(),
                description,
                tags,
                locale: Some(locale.unwrap_or_else(|| settings.default_locale.clone())),
                editor: Some(editor.unwrap_or_else(|| settings.default_editor.clone())),
                is_published: !draft,
                is_private: private,
            };
            let created = create_page(&mut app.session, &path, &title, &options)?;
            if app.json {
                return print_json(&created);
            }
            println!("created page");
            println!("id: {}", created.id);
            println!("path: {}", created.path);
            println!("title: {}", created.title);
            Ok(())
        }
        PagesSubcommand::Update {
            id,
            body,
            title,
            description,
            tags,
            publish,
            unpublish,
        } => {
            let id = validate_identifier(&id)?;
            let changes = PageUpdate {
                content: body.read()?,
                title,
                description,
                tags,
                is_published: match (publish, unpublish) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            let updated = update_page(&mut app.session, id, &changes)?;
            if app.json {
                return print_json(&updated);
            }
            println!("updated page");
            println!("id: {}", updated.id);
            println!("path: {}", updated.path);
            println!("title: {}", updated.title);
            println!(
                "updated_at: {}",
                updated.updated_at.as_deref().unwrap_or("n/a")
            );
            Ok(())
        }
        PagesSubcommand::Move {
            id,
            destination,
            locale,
        } => {
            let id = validate_identifier(&id)?;
            let destination = PagePath::parse(&destination)?;
            let locale = locale.or_else(|| default_locale(app));
            move_page(&mut app.session, id, &destination, locale.as_deref())?;
            println!("moved page {id} to {destination}");
            Ok(())
        }
        PagesSubcommand::Delete { id } => {
            let id = validate_identifier(&id)?;
            delete_page(&mut app.session, id)?;
            println!("deleted page {id}");
            Ok(())
        }
        PagesSubcommand::Search {
            query,
            limit,
            locale,
        } => {
            let results = search_pages(&mut app.session, &query, &SearchOptions { limit, locale })?;
            if app.json {
                return print_json(&results);
            }
            println!("total_hits: {}", results.total_hits);
            for hit in &results.results {
                println!("  {} [{}] {}", hit.path, hit.locale, hit.title);
            }
            if !results.suggestions.is_empty() {
                println!("suggestions: {}", results.suggestions.join(", "));
            }
            Ok(())
        }
        PagesSubcommand::Tree { locale, tag } => {
            let filter = ListPagesFilter {
                tag,
                locale,
                limit: usize::MAX,
                order_by: PageOrder::Path,
                ..ListPagesFilter::default()
            };
            let pages = list_pages(&mut app.session, &filter)?;
            if app.json {
                return print_json(&pages);
            }
            println!("{}", render_tree(&pages));
            Ok(())
        }
        PagesSubcommand::Render { id } => {
            let id = validate_identifier(&id)?;
            render_page(&mut app.session, id)?;
            println!("rendered page {id}");
            Ok(())
        }
    }
}

fn run_tags(app: &mut App, search: Option<&str>) -> Result<()> {
    if let Some(needle) = search {
        let found = search_tags(&mut app.session, needle)?;
        if app.json {
            return print_json(&found);
        }
        for tag in &found {
            println!("{tag}");
        }
        return Ok(());
    }

    let tags = list_tags(&mut app.session)?;
    if app.json {
        return print_json(&tags);
    }
    println!("tags: {}", tags.len());
    for tag in &tags {
        if tag.title.is_empty() || tag.title == tag.tag {
            println!("  {}", tag.tag);
        } else {
            println!("  {} ({})", tag.tag, tag.title);
        }
    }
    Ok(())
}

fn run_assets(app: &mut App, command: AssetsSubcommand) -> Result<()> {
    match command {
        AssetsSubcommand::List { folder, limit } => {
            let assets = list_assets(&mut app.session, &ListAssetsOptions { folder, limit })?;
            if app.json {
                return print_json(&assets);
            }
            println!("assets: {}", assets.len());
            for asset in &assets {
                println!(
                    "  {} {} {} {} bytes",
                    asset.id, asset.filename, asset.mime, asset.file_size
                );
            }
            Ok(())
        }
        AssetsSubcommand::Folders { parent } => {
            let folders = list_asset_folders(&mut app.session, parent)?;
            if app.json {
                return print_json(&folders);
            }
            println!("folders: {}", folders.len());
            for folder in &folders {
                println!("  {} {} ({})", folder.id, folder.name, folder.slug);
            }
            Ok(())
        }
        AssetsSubcommand::Upload {
            file,
            folder_id,
            rename,
        } => {
            let options = UploadOptions { folder_id, rename };
            let response = upload_asset(&mut app.session, &file, &options)?;
            if app.json {
                return print_json(&response);
            }
            println!("uploaded: {}", normalize_path(&file));
            println!("response: {response}");
            Ok(())
        }
        AssetsSubcommand::Delete { id } => {
            let id = validate_identifier(&id)?;
            delete_asset(&mut app.session, id)?;
            println!("deleted asset {id}");
            Ok(())
        }
    }
}

fn run_health(app: &mut App) -> Result<()> {
    let info = get_health(&mut app.session)?;
    if app.json {
        return print_json(&info);
    }
    println!("status: ok");
    println!("current_version: {}", info.current_version);
    println!("latest_version: {}", info.latest_version);
    println!("update_available: {}", format_flag(info.update_available()));
    println!("hostname: {}", info.hostname);
    println!("operating_system: {}", info.operating_system);
    println!("node_version: {}", info.node_version);
    println!("db_type: {}", info.db_type);
    Ok(())
}

fn run_stats(app: &mut App) -> Result<()> {
    let stats = get_stats(&mut app.session)?;
    if app.json {
        return print_json(&stats);
    }
    println!("total_pages: {}", stats.total_pages);
    println!("published_pages: {}", stats.published_pages);
    println!("draft_pages: {}", stats.draft_pages);
    println!("by_locale:");
    for (locale, count) in &stats.by_locale {
        println!("  {locale}: {count}");
    }
    println!("by_tag:");
    for (tag, count) in &stats.by_tag {
        println!("  {tag}: {count}");
    }
    Ok(())
}

fn run_history(app: &mut App, command: HistorySubcommand) -> Result<()> {
    match command {
        HistorySubcommand::List { page_id } => {
            let page_id = validate_identifier(&page_id)?;
            let history = get_page_versions(&mut app.session, page_id)?;
            if app.json {
                return print_json(&history);
            }
            println!("versions: {}", history.total);
            for entry in &history.trail {
                println!(
                    "  {} {} {} {}",
                    entry.version_id, entry.version_date, entry.action_type, entry.author_name
                );
            }
            Ok(())
        }
        HistorySubcommand::Show {
            page_id,
            version_id,
        } => {
            let (page_id, version_id) = version_pair(&page_id, &version_id)?;
            let version = get_page_version(&mut app.session, page_id, version_id)?;
            if app.json {
                return print_json(&version);
            }
            println!("version_id: {}", version.version_id);
            println!("page_id: {}", version.page_id);
            println!("path: {}", version.path);
            println!("title: {}", version.title);
            println!("author: {}", version.author_name);
            println!("date: {}", version.version_date);
            println!();
            println!("{}", version.content);
            Ok(())
        }
        HistorySubcommand::Revert {
            page_id,
            version_id,
        } => {
            let (page_id, version_id) = version_pair(&page_id, &version_id)?;
            revert_page(&mut app.session, page_id, version_id)?;
            println!("reverted page {page_id} to version {version_id}");
            Ok(())
        }
    }
}

fn run_lint(app: &App, args: &LintArgs) -> Result<()> {
    let content = read_text(&args.file)?;
    let report = lint_markdown(&content);
    if app.json {
        print_json(&report)?;
    } else {
        println!("file: {}", normalize_path(&args.file));
        println!("errors: {}", report.errors.len());
        println!("warnings: {}", report.warnings.len());
        for issue in &report.all {
            println!(
                "  {}:{} [{}] {}",
                issue.line,
                issue.severity.as_str(),
                issue.rule,
                issue.message
            );
        }
    }
    if !report.valid {
        bail!("lint failed with {} error(s)", report.errors.len());
    }
    Ok(())
}

fn run_diff(app: &mut App, args: &DiffArgs) -> Result<()> {
    let page = fetch_page(app, &args.page)?;
    let local = read_text(&args.file)?;
    let entries = if args.aligned {
        diff_lines_aligned(&page.content, &local)
    } else {
        diff_lines(&page.content, &local)
    };
    let stats = diff_stats(&entries);
    if app.json {
        return print_json(&entries);
    }
    println!("page: {}", page.path);
    println!("added: {}", stats.added);
    println!("removed: {}", stats.removed);
    if stats.has_changes() {
        println!("{}", format_diff(&entries, args.context));
    }
    Ok(())
}

fn run_links(app: &mut App, args: &LinksArgs) -> Result<()> {
    let page = fetch_page(app, &args.page)?;
    let links = if args.broken {
        let known = list_pages(&mut app.session, &all_pages())?;
        find_broken_links(&page.content, known.iter().map(|known| known.path.as_str()))
    } else {
        extract_links(&page.content)
    };
    if app.json {
        return print_json(&links);
    }
    println!("links: {}", links.len());
    for link in &links {
        let scope = if is_internal_link(&link.url) {
            "internal"
        } else {
            "external"
        };
        println!("  [{scope}] {} -> {}", link.text, link.url);
    }
    Ok(())
}

fn run_toc(app: &App, args: &TocArgs) -> Result<()> {
    let content = read_text(&args.file)?;
    let headings = extract_headings(&content, args.max_depth);
    if app.json {
        return print_json(&headings);
    }
    println!("{}", generate_toc(&headings));
    Ok(())
}

fn run_similar(app: &mut App, args: &SimilarArgs) -> Result<()> {
    let target = fetch_page(app, &args.page)?;
    let filter = ListPagesFilter {
        locale: Some(target.locale.clone()),
        limit: args.scan,
        ..all_pages()
    };
    let summaries = list_pages(&mut app.session, &filter)?;

    let mut candidates = Vec::new();
    for summary in summaries.iter().filter(|summary| summary.id != target.id) {
        let Ok(id) = Identifier::new(summary.id as i64) else {
            continue;
        };
        let page = get_page(&mut app.session, &PageRef::Id(id), &GetPageOptions::default())?;
        candidates.push((summary.path.clone(), page.content));
    }

    let mut ranked = rank_similar(&target.content, candidates, args.threshold);
    ranked.truncate(args.limit);
    if app.json {
        return print_json(&ranked);
    }
    println!("page: {}", target.path);
    println!("similar: {}", ranked.len());
    for (path, score) in &ranked {
        println!("  {score:.3} {path}");
    }
    Ok(())
}

fn fetch_page(app: &mut App, raw: &str) -> Result<Page> {
    let page_ref = PageRef::parse(raw)?;
    let options = GetPageOptions {
        with_children: false,
        locale: default_locale(app),
    };
    Ok(get_page(&mut app.session, &page_ref, &options)?)
}

fn all_pages() -> ListPagesFilter {
    ListPagesFilter {
        limit: usize::MAX,
        order_by: PageOrder::Path,
        ..ListPagesFilter::default()
    }
}

fn default_locale(app: &mut App) -> Option<String> {
    app.session
        .settings()
        .ok()
        .map(|settings| settings.default_locale.clone())
}

fn version_pair(page_id: &str, version_id: &str) -> Result<(Identifier, Identifier)> {
    Ok((validate_identifier(page_id)?, validate_identifier(version_id)?))
}

fn print_page(page: &Page, with_content: bool) {
    println!("id: {}", page.id);
    println!("path: {}", page.path);
    println!("title: {}", page.title);
    println!("description: {}", page.description);
    println!("locale: {}", page.locale);
    println!("editor: {}", page.editor);
    println!("author: {}", page.author_name);
    println!("published: {}", format_flag(page.is_published));
    println!("private: {}", format_flag(page.is_private));
    println!("created_at: {}", page.created_at);
    println!("updated_at: {}", page.updated_at);
    println!("tags: {}", page.tags.join(", "));
    if let Some(children) = &page.children {
        println!("children: {}", children.len());
        for child in children {
            println!("  {} {} {}", child.id, child.path, child.title);
        }
    }
    if with_content {
        println!();
        println!("{}", page.content);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", normalize_path(path)))
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, PagesSubcommand};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_splits_tags_and_reads_flags() {
        let cli = Cli::try_parse_from([
            "wikiql", "--json", "pages", "create", "/docs/new", "New", "--tags", "a,b", "--draft",
        ])
        .expect("parse");
        assert!(cli.json);
        let Some(Commands::Pages(args)) = cli.command else {
            panic!("expected pages command");
        };
        let PagesSubcommand::Create {
            path, tags, draft, ..
        } = args.command
        else {
            panic!("expected create");
        };
        assert_eq!(path, "/docs/new");
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
        assert!(draft);
    }

    #[test]
    fn content_and_file_conflict() {
        let result = Cli::try_parse_from([
            "wikiql", "pages", "update", "3", "--content", "x", "--file", "y.md",
        ]);
        assert!(result.is_err());
    }
}
