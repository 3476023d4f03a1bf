//! Interactive search session.
//!
//! One line per command. Search-side commands (filters, sort, paging,
//! favoriting from results) close the favorites surface, so a match never
//! outlives the favorites it was drawn from.

use std::io::{self, Write};

use anyhow::anyhow;
use pawmatch_core::{
    BreedList, CatalogService, FavoriteSet, MatchFailure, MatchSession, PAGE_SIZE_OPTIONS,
    SearchController, SortField, load_breeds, load_favorite_details, run_match,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::catalog::search_once;
use crate::commands::matching::failure_to_error;
use crate::output::{render_items, render_match, render_results};

const HELP: &str = "\
commands:
  breed <name>     toggle a breed filter (no name clears all filters)
  sort <field>     sort by breed, age, or name (repeat to cycle asc/desc/off)
  page <n>         jump to page n
  size <n>         page size (10, 20, 50, 100)
  next | prev      move one page
  fav <#|id>       toggle a favorite from the current page
  favorites        show favorites
  unfav <#|id>     remove a favorite from the favorites list
  match            generate a match from your favorites
  help             show this help
  quit             leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BrowseCommand {
    Breed(Option<String>),
    Sort(SortField),
    Page(u32),
    Size(u32),
    Next,
    Prev,
    Fav(String),
    Favorites,
    Unfav(String),
    Match,
    Help,
    Quit,
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub(crate) fn parse_browse_command(line: &str) -> Result<Option<BrowseCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));
    let required = |what: &str| {
        if rest.is_empty() {
            Err(format!("`{verb}` needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };
    let number = |what: &str| -> Result<u32, String> {
        required(what)?
            .parse::<u32>()
            .map_err(|_| format!("`{verb}` needs {what}"))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "breed" => BrowseCommand::Breed((!rest.is_empty()).then(|| rest.to_string())),
        "sort" => BrowseCommand::Sort(required("a field")?.parse()?),
        "page" => BrowseCommand::Page(number("a page number")?),
        "size" => {
            let size = number("a page size")?;
            if !PAGE_SIZE_OPTIONS.contains(&size) {
                return Err(format!(
                    "page size must be one of {}",
                    PAGE_SIZE_OPTIONS.map(|option| option.to_string()).join(", ")
                ));
            }
            BrowseCommand::Size(size)
        }
        "next" | "n" => BrowseCommand::Next,
        "prev" | "p" => BrowseCommand::Prev,
        "fav" => BrowseCommand::Fav(required("a row number or id")?),
        "favorites" | "favs" => BrowseCommand::Favorites,
        "unfav" => BrowseCommand::Unfav(required("a row number or id")?),
        "match" => BrowseCommand::Match,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => return Err(format!("unknown command '{other}'; type `help`")),
    };
    Ok(Some(command))
}

/// State for one interactive session.
pub(crate) struct BrowseSession<'a> {
    catalog: &'a dyn CatalogService,
    controller: SearchController,
    favorites: FavoriteSet,
    matches: MatchSession,
    breeds: BreedList,
    output: OutputFormat,
}

impl<'a> BrowseSession<'a> {
    pub(crate) fn new(
        catalog: &'a dyn CatalogService,
        favorites: FavoriteSet,
        output: OutputFormat,
    ) -> Self {
        Self {
            catalog,
            controller: SearchController::default(),
            favorites,
            matches: MatchSession::default(),
            breeds: BreedList::default(),
            output,
        }
    }

    /// Load breeds and show the first page.
    pub(crate) async fn start(&mut self, out: &mut dyn Write) -> CliResult<()> {
        self.breeds = load_breeds(self.catalog).await;
        if let Some(message) = &self.breeds.error {
            writeln!(out, "{message}")?;
        }
        self.show_results(out).await
    }

    pub(crate) async fn execute(
        &mut self,
        command: BrowseCommand,
        out: &mut dyn Write,
    ) -> CliResult<Flow> {
        match command {
            BrowseCommand::Breed(None) => {
                self.matches.close();
                self.controller.clear_categories();
            }
            BrowseCommand::Breed(Some(name)) => {
                self.matches.close();
                if !self.breeds.breeds.is_empty() && !self.breeds.contains(&name) {
                    writeln!(out, "unknown breed '{name}'")?;
                    return Ok(Flow::Continue);
                }
                self.controller.toggle_category(&name);
            }
            BrowseCommand::Sort(field) => {
                self.matches.close();
                self.controller.select_sort(field);
            }
            BrowseCommand::Page(page) => {
                self.matches.close();
                if let Err(err) = self.controller.set_page(page) {
                    writeln!(out, "{err}")?;
                    return Ok(Flow::Continue);
                }
            }
            BrowseCommand::Size(size) => {
                self.matches.close();
                if let Err(err) = self.controller.set_page_size(size) {
                    writeln!(out, "{err}")?;
                    return Ok(Flow::Continue);
                }
            }
            BrowseCommand::Next => {
                self.matches.close();
                if !self.controller.next_page() {
                    writeln!(out, "already on the last page")?;
                    return Ok(Flow::Continue);
                }
            }
            BrowseCommand::Prev => {
                self.matches.close();
                if !self.controller.prev_page() {
                    writeln!(out, "already on the first page")?;
                    return Ok(Flow::Continue);
                }
            }
            BrowseCommand::Fav(token) => {
                let id = match self.result_id(&token) {
                    Ok(id) => id,
                    Err(message) => {
                        writeln!(out, "{message}")?;
                        return Ok(Flow::Continue);
                    }
                };
                self.matches.close();
                let outcome = self.favorites.toggle(&id);
                writeln!(out, "{}", outcome.message())?;
            }
            BrowseCommand::Favorites => {
                self.open_favorites(out).await?;
                return Ok(Flow::Continue);
            }
            BrowseCommand::Unfav(token) => {
                self.remove_favorite(&token, out)?;
                return Ok(Flow::Continue);
            }
            BrowseCommand::Match => {
                self.generate_match(out).await?;
                return Ok(Flow::Continue);
            }
            BrowseCommand::Help => {
                writeln!(out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            BrowseCommand::Quit => return Ok(Flow::Quit),
        }
        self.show_results(out).await?;
        Ok(Flow::Continue)
    }

    async fn show_results(&mut self, out: &mut dyn Write) -> CliResult<()> {
        match search_once(self.catalog, &mut self.controller).await {
            Ok(()) => render_results(out, &self.controller, &self.favorites, self.output),
            Err(CliError::Failure(err)) => {
                writeln!(out, "{err:#}")?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn open_favorites(&mut self, out: &mut dyn Write) -> CliResult<()> {
        if let Some(ticket) = self.matches.open(&self.favorites) {
            load_favorite_details(self.catalog, &mut self.matches, &ticket).await;
        }
        self.show_favorites(out)
    }

    fn show_favorites(&self, out: &mut dyn Write) -> CliResult<()> {
        if let Some(failure) = self.matches.failure() {
            surface_failure(failure, out)?;
        }
        if self.favorites.is_empty() {
            writeln!(out, "No favorites yet. Use `fav <#>` on a result.")?;
            return Ok(());
        }
        render_items(out, self.matches.favorite_details(), &self.favorites, self.output)?;
        if let Some(item) = self.matches.matched_item() {
            writeln!(out, "current match: {} ({})", item.name, item.id)?;
        }
        if self.matches.can_generate(&self.favorites) {
            writeln!(out, "type `match` to {}", self.matches.generate_label())?;
        }
        Ok(())
    }

    fn remove_favorite(&mut self, token: &str, out: &mut dyn Write) -> CliResult<()> {
        if !self.matches.is_open() {
            writeln!(out, "open the favorites list first with `favorites`")?;
            return Ok(());
        }
        let listed = self.matches.favorite_details().iter().map(|item| item.id.as_str());
        let id = match row_id(token, listed) {
            Ok(id) => id,
            Err(message) => {
                writeln!(out, "{message}")?;
                return Ok(());
            }
        };
        match self.matches.remove_favorite(&id, &mut self.favorites) {
            Some(outcome) => writeln!(out, "{}", outcome.message())?,
            None => writeln!(out, "{id} is not a favorite")?,
        }
        self.show_favorites(out)
    }

    async fn generate_match(&mut self, out: &mut dyn Write) -> CliResult<()> {
        if !self.matches.is_open() {
            self.open_favorites(out).await?;
        }
        if !self.matches.can_generate(&self.favorites) {
            writeln!(out, "add favorites before generating a match")?;
            return Ok(());
        }
        run_match(self.catalog, &mut self.matches, &self.favorites).await;
        if let Some(failure) = self.matches.failure() {
            return surface_failure(failure, out);
        }
        self.matches
            .matched_item()
            .map_or(Ok(()), |item| render_match(out, item, self.output))
    }

    fn result_id(&self, token: &str) -> Result<String, String> {
        row_id(
            token,
            self.controller
                .results()
                .items
                .iter()
                .map(|item| item.id.as_str()),
        )
    }
}

/// Resolve a 1-based row number against `ids`; anything non-numeric is
/// taken as an id.
fn row_id<'i>(token: &str, mut ids: impl Iterator<Item = &'i str>) -> Result<String, String> {
    if !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return Ok(token.to_string());
    }
    token
        .parse::<usize>()
        .ok()
        .and_then(|row| row.checked_sub(1))
        .and_then(|index| ids.nth(index))
        .map(str::to_string)
        .ok_or_else(|| format!("no row {token} in this listing"))
}

fn surface_failure(failure: &MatchFailure, out: &mut dyn Write) -> CliResult<()> {
    if failure.error.is_auth() {
        return Err(failure_to_error(failure));
    }
    writeln!(out, "{}", failure.message())?;
    Ok(())
}

pub(crate) async fn handle_browse(ctx: &AppContext) -> CliResult<()> {
    let mut out = io::stdout();
    let mut session = BrowseSession::new(&ctx.catalog, ctx.favorites(), ctx.output);
    session.start(&mut out).await?;
    writeln!(out, "type `help` for commands")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "pawmatch> ")?;
        out.flush()?;
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to read input: {err}")))?
        else {
            break;
        };
        match parse_browse_command(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                if session.execute(command, &mut out).await? == Flow::Quit {
                    break;
                }
            }
            Err(message) => writeln!(out, "{message}")?,
        }
    }
    Ok(())
}
