use std::io::{self, Write};

use pawmatch_core::{FavoriteSet, MatchSession, load_favorite_details};

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::matching::failure_to_error;
use crate::output::render_items;

/// How `favorites add|remove|toggle` applies each id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FavoriteEdit {
    Add,
    Remove,
    Toggle,
}

pub(crate) async fn handle_favorites_list(ctx: &AppContext) -> CliResult<()> {
    let favorites = ctx.favorites();
    let mut out = io::stdout().lock();
    if favorites.is_empty() {
        match ctx.output {
            OutputFormat::Json => writeln!(out, "[]")?,
            OutputFormat::Table => writeln!(out, "No favorites yet.")?,
        }
        return Ok(());
    }

    let mut session = MatchSession::default();
    if let Some(ticket) = session.open(&favorites) {
        load_favorite_details(&ctx.catalog, &mut session, &ticket).await;
    }
    if let Some(failure) = session.failure() {
        return Err(failure_to_error(failure));
    }
    render_items(&mut out, session.favorite_details(), &favorites, ctx.output)
}

pub(crate) fn handle_favorites_edit(
    ctx: &AppContext,
    edit: FavoriteEdit,
    ids: &[String],
) -> CliResult<()> {
    let mut favorites = ctx.favorites();
    let mut out = io::stdout().lock();
    for line in apply_edit(&mut favorites, edit, ids)? {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Apply `edit` to every id, returning one status line per id.
///
/// Add and remove are expressed as conditional toggles so the set keeps a
/// single mutation path.
pub(crate) fn apply_edit(
    favorites: &mut FavoriteSet,
    edit: FavoriteEdit,
    ids: &[String],
) -> CliResult<Vec<String>> {
    let ids: Vec<&str> = ids.iter().map(|id| id.trim()).collect();
    if ids.iter().any(|id| id.is_empty()) {
        return Err(CliError::validation("favorite ids must not be empty"));
    }
    let lines = ids
        .into_iter()
        .map(|id| {
            let present = favorites.contains(id);
            let skip = match edit {
                FavoriteEdit::Add => present,
                FavoriteEdit::Remove => !present,
                FavoriteEdit::Toggle => false,
            };
            if skip {
                let state = if present {
                    "already a favorite"
                } else {
                    "not a favorite"
                };
                format!("{id}: {state}")
            } else {
                format!("{id}: {}", favorites.toggle(id).message())
            }
        })
        .collect();
    Ok(lines)
}
