//! Argument parsing, logging setup, and command dispatch.

use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pawmatch_core::{DEFAULT_PAGE_SIZE, FIRST_PAGE, SortDirection, SortField};
use pawmatch_telemetry::{LogFormat, LoggingConfig, build_sha, command_span, init_logging};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliDependencies, CliResult, parse_url};
use crate::commands::auth::{handle_login, handle_logout, handle_status};
use crate::commands::browse::handle_browse;
use crate::commands::catalog::{handle_breeds, handle_search};
use crate::commands::favorites::{
    FavoriteEdit, handle_favorites_edit, handle_favorites_list,
};
use crate::commands::matching::handle_match;
use crate::state::StatePaths;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "https://frontend-take-home-service.fetch.com";

/// Parses CLI arguments, executes the requested command, and handles
/// user-facing telemetry emission. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: build_sha(),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    let deps = match CliDependencies::new(cli.timeout, &trace_id) {
        Ok(deps) => deps,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    let telemetry = deps.telemetry.clone();

    let result = dispatch(cli, &deps)
        .instrument(command_span(command_name, &trace_id))
        .await;

    let (exit_code, message, outcome) = match result {
        Ok(()) => (0, None, "success"),
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            eprintln!("error: {message}");
            (exit_code, Some(message), "error")
        }
    };

    if let Some(emitter) = &telemetry {
        emitter
            .emit(
                &trace_id,
                command_name,
                outcome,
                exit_code,
                message.as_deref(),
            )
            .await;
    }

    exit_code
}

async fn dispatch(cli: Cli, deps: &CliDependencies) -> CliResult<()> {
    let paths = StatePaths::resolve(
        cli.state_dir,
        env::var_os("XDG_STATE_HOME"),
        env::var_os("HOME"),
    );
    let ctx = AppContext::new(deps.client.clone(), cli.api_url, paths, cli.output);

    match cli.command {
        Command::Login(args) => handle_login(&ctx, args).await,
        Command::Logout => handle_logout(&ctx).await,
        Command::Status => handle_status(&ctx).await,
        Command::Breeds => handle_breeds(&ctx).await,
        Command::Search(args) => handle_search(&ctx, args).await,
        Command::Favorites(command) => match command {
            FavoritesCommand::List => handle_favorites_list(&ctx).await,
            FavoritesCommand::Add(args) => handle_favorites_edit(&ctx, FavoriteEdit::Add, &args.ids),
            FavoritesCommand::Remove(args) => {
                handle_favorites_edit(&ctx, FavoriteEdit::Remove, &args.ids)
            }
            FavoritesCommand::Toggle(args) => {
                handle_favorites_edit(&ctx, FavoriteEdit::Toggle, &args.ids)
            }
        },
        Command::Match => handle_match(&ctx).await,
        Command::Browse => handle_browse(&ctx).await,
    }
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Status => "status",
        Command::Breeds => "breeds",
        Command::Search(_) => "search",
        Command::Favorites(FavoritesCommand::List) => "favorites_list",
        Command::Favorites(FavoritesCommand::Add(_)) => "favorites_add",
        Command::Favorites(FavoritesCommand::Remove(_)) => "favorites_remove",
        Command::Favorites(FavoritesCommand::Toggle(_)) => "favorites_toggle",
        Command::Match => "match",
        Command::Browse => "browse",
    }
}

#[derive(Parser)]
#[command(
    name = "pawmatch",
    about = "Browse adoptable dogs, keep favorites, and generate a match",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "PAWMATCH_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "PAWMATCH_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "PAWMATCH_STATE_DIR",
        help = "Directory holding favorites and the saved session"
    )]
    pub(crate) state_dir: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "PAWMATCH_LOG_LEVEL",
        default_value = pawmatch_telemetry::DEFAULT_LOG_LEVEL
    )]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "PAWMATCH_LOG_FORMAT")]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start a session with the catalog service.
    Login(LoginArgs),
    /// End the session and forget the saved cookie.
    Logout,
    /// Report whether the saved session is still accepted.
    Status,
    /// List every breed.
    Breeds,
    /// Run one search and print the page.
    Search(SearchArgs),
    /// Inspect or edit favorites.
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Generate a match from the current favorites.
    Match,
    /// Interactive search session.
    Browse,
}

#[derive(Subcommand)]
pub(crate) enum FavoritesCommand {
    /// Show details for every favorite.
    List,
    /// Mark ids as favorites (already-favorited ids are left alone).
    Add(FavoriteIdsArgs),
    /// Unmark ids (ids that are not favorites are left alone).
    Remove(FavoriteIdsArgs),
    /// Flip membership for each id.
    Toggle(FavoriteIdsArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long, env = "PAWMATCH_NAME")]
    pub(crate) name: String,
    #[arg(long, env = "PAWMATCH_EMAIL")]
    pub(crate) email: String,
}

#[derive(Args)]
pub(crate) struct FavoriteIdsArgs {
    #[arg(required = true, help = "Dog identifiers")]
    pub(crate) ids: Vec<String>,
}

#[derive(Args)]
pub(crate) struct SearchArgs {
    #[arg(long = "breed", value_delimiter = ',', help = "Breed filter; repeat or comma-separate")]
    pub(crate) breeds: Vec<String>,
    #[arg(long, default_value_t = SortField::Category)]
    pub(crate) sort: SortField,
    #[arg(long, default_value = "asc", help = "asc, desc, or unset")]
    pub(crate) direction: SortDirection,
    #[arg(long, default_value_t = FIRST_PAGE)]
    pub(crate) page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub(crate) size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from([
            "pawmatch",
            "--api-url",
            "http://localhost:9999",
            "search",
            "--breed",
            "Pug,Beagle",
            "--sort",
            "age",
            "--direction",
            "desc",
            "--page",
            "3",
        ])
        .expect("valid arguments");
        assert_eq!(cli.api_url.as_str(), "http://localhost:9999/");
        assert_eq!(command_label(&cli.command), "search");
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.breeds, vec!["Pug", "Beagle"]);
        assert_eq!(args.sort, SortField::Age);
        assert_eq!(args.direction, SortDirection::Descending);
        assert_eq!(args.page, 3);
        assert_eq!(args.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn favorites_subcommands_require_ids() {
        assert!(Cli::try_parse_from(["pawmatch", "favorites", "add"]).is_err());
        let cli = Cli::try_parse_from(["pawmatch", "favorites", "toggle", "a", "b"])
            .expect("valid arguments");
        assert_eq!(command_label(&cli.command), "favorites_toggle");
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "pawmatch",
            "breeds",
            "--output",
            "json",
            "--log-format",
            "json",
            "--state-dir",
            "/tmp/pm",
        ])
        .expect("valid arguments");
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/pm")));
    }

    #[test]
    fn rejects_unknown_sort_field() {
        assert!(Cli::try_parse_from(["pawmatch", "search", "--sort", "zip"]).is_err());
    }
}
