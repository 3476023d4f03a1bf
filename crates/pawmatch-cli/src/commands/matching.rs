use std::io;

use anyhow::anyhow;
use pawmatch_core::{MatchFailure, MatchSession, load_favorite_details, run_match};

use crate::client::{AppContext, CliError, CliResult, SESSION_REQUIRED};
use crate::output::render_match;

pub(crate) async fn handle_match(ctx: &AppContext) -> CliResult<()> {
    let favorites = ctx.favorites();
    if favorites.is_empty() {
        return Err(CliError::validation(
            "no favorites yet; add some with `pawmatch favorites add <ID>`",
        ));
    }

    let mut session = MatchSession::default();
    if let Some(ticket) = session.open(&favorites) {
        load_favorite_details(&ctx.catalog, &mut session, &ticket).await;
    }
    if let Some(failure) = session.failure() {
        return Err(failure_to_error(failure));
    }
    if !session.can_generate(&favorites) {
        return Err(CliError::failure(anyhow!(
            "none of your favorites are available in the catalog"
        )));
    }

    run_match(&ctx.catalog, &mut session, &favorites).await;
    if let Some(failure) = session.failure() {
        return Err(failure_to_error(failure));
    }
    let item = session
        .matched_item()
        .ok_or_else(|| CliError::failure(anyhow!("match did not complete")))?;
    render_match(&mut io::stdout().lock(), item, ctx.output)
}

/// Turn a surface failure into a CLI error, keeping the display message first.
pub(crate) fn failure_to_error(failure: &MatchFailure) -> CliError {
    if failure.error.is_auth() {
        return CliError::validation(SESSION_REQUIRED);
    }
    CliError::failure(anyhow!("{} ({})", failure.message(), failure.error))
}
