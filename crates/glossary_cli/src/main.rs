//! Command-line front end for the glossary core.
//!
//! # Responsibility
//! - Map subcommands onto `TermService` use-cases against one SQLite file.
//! - Render query pages and field-level validation feedback as plain text.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glossary_core::db::open_db;
use glossary_core::{
    core_version, default_log_level, init_logging, QueryPage, QuerySpec, SearchScope, SortKey,
    SqliteTermRepository, Term, TermDraft, TermId, TermService, TermServiceError,
    DEFAULT_PAGE_SIZE,
};
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "glossary", version = core_version(), about = "Personal glossary manager")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "GLOSSARY_DB", default_value = "glossary.sqlite3", global = true)]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "GLOSSARY_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error. Defaults per build mode.
    #[arg(long, env = "GLOSSARY_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a term.
    Add(TermArgs),
    /// Replace title, content and tags of a term.
    Update {
        id: TermId,
        #[command(flatten)]
        term: TermArgs,
    },
    /// Delete a term. Its tags stay available.
    Delete { id: TermId },
    /// Print one term.
    Show { id: TermId },
    /// Search, sort and page through terms.
    List(ListArgs),
    /// Print the tag vocabulary.
    Tags,
}

#[derive(Debug, Args)]
struct TermArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    /// Comma-separated tag names.
    #[arg(long)]
    tags: String,
}

impl TermArgs {
    fn to_draft(&self) -> TermDraft {
        TermDraft::from_tag_input(self.title.as_str(), self.content.as_str(), &self.tags)
    }
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Case-insensitive substring to look for.
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    scope: ScopeArg,
    #[arg(long, value_enum, default_value_t = SortArg::Newest)]
    sort: SortArg,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    All,
    Title,
    Content,
    Tags,
}

impl From<ScopeArg> for SearchScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::All => Self::All,
            ScopeArg::Title => Self::Title,
            ScopeArg::Content => Self::Content,
            ScopeArg::Tags => Self::Tags,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    Oldest,
    Title,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Newest => Self::NewestFirst,
            SortArg::Oldest => Self::OldestFirst,
            SortArg::Title => Self::TitleAlphabetical,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(validation) = err
                .downcast_ref::<TermServiceError>()
                .and_then(TermServiceError::validation)
            {
                for (field, message) in validation.fields() {
                    eprintln!("{}: {message}", field.as_str());
                }
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(level, log_dir).context("failed to start glossary logging")?;
    }

    let mut conn = open_db(&cli.db)
        .with_context(|| format!("failed to open glossary at `{}`", cli.db.display()))?;
    let repo = SqliteTermRepository::try_new(&mut conn)?;
    let mut service = TermService::new(repo);
    debug!("event=cli_command module=cli status=start");

    match cli.command {
        Command::Add(args) => {
            let term = service.create_term(&args.to_draft())?;
            println!("created {}", term.id);
        }
        Command::Update { id, term } => {
            let term = service.update_term(id, &term.to_draft())?;
            println!("updated {}", term.id);
        }
        Command::Delete { id } => {
            service.delete_term(id)?;
            println!("deleted {id}");
        }
        Command::Show { id } => match service.get_term(id)? {
            Some(term) => print_term(&term),
            None => bail!("term not found: {id}"),
        },
        Command::List(args) => {
            let spec = QuerySpec {
                text: args.search,
                scope: args.scope.into(),
                sort: args.sort.into(),
                page: args.page,
                page_size: args.page_size,
            };
            let page = service.query(&spec)?;
            print_page(&page, &spec);
        }
        Command::Tags => {
            for tag in service.list_tags()? {
                println!("{}", tag.name);
            }
        }
    }
    Ok(())
}

fn print_term(term: &Term) {
    println!("{}  {}", term.id, term.title);
    println!("  {}", term.content);
    println!("  tags: {}", term.tag_names().collect::<Vec<_>>().join(", "));
}

fn print_page(page: &QueryPage, spec: &QuerySpec) {
    for term in &page.items {
        print_term(term);
    }
    if page.total_pages == 0 {
        println!("no terms");
    } else {
        println!(
            "page {}/{} ({} matched)",
            spec.page, page.total_pages, page.total_matched
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use glossary_core::{SearchScope, SortKey, DEFAULT_PAGE_SIZE};

    #[test]
    fn add_splits_comma_separated_tags() {
        let cli = Cli::try_parse_from([
            "glossary",
            "add",
            "--title",
            "Closure",
            "--content",
            "Captures environment.",
            "--tags",
            "rust, fn",
        ])
        .unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add command");
        };
        let draft = args.to_draft();
        assert_eq!(draft.tag_names, vec!["rust", " fn"]);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn list_defaults_to_first_page_newest_first() {
        let cli = Cli::try_parse_from(["glossary", "list"]).unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.page, 1);
        assert_eq!(args.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(SearchScope::from(args.scope), SearchScope::All);
        assert_eq!(SortKey::from(args.sort), SortKey::NewestFirst);
    }

    #[test]
    fn list_maps_scope_and_sort_values() {
        let cli = Cli::try_parse_from([
            "glossary", "list", "--search", "web", "--scope", "tags", "--sort", "title",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.search, "web");
        assert_eq!(SearchScope::from(args.scope), SearchScope::Tags);
        assert_eq!(SortKey::from(args.sort), SortKey::TitleAlphabetical);
    }

    #[test]
    fn update_requires_a_valid_uuid() {
        let parsed = Cli::try_parse_from([
            "glossary", "update", "not-a-uuid", "--title", "t", "--content", "c", "--tags", "x",
        ]);
        assert!(parsed.is_err());
    }
}
