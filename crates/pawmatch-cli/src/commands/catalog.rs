use std::io;

use anyhow::anyhow;
use pawmatch_core::{
    CatalogError, CatalogService, QueryDescriptor, SearchController, SearchStatus, fetch_page,
    load_breeds,
};

use crate::cli::SearchArgs;
use crate::client::{AppContext, CliError, CliResult, SESSION_REQUIRED};
use crate::output::{render_breeds, render_results};

pub(crate) async fn handle_breeds(ctx: &AppContext) -> CliResult<()> {
    let list = load_breeds(&ctx.catalog).await;
    if let Some(message) = &list.error {
        return Err(CliError::failure(anyhow!(message.clone())));
    }
    render_breeds(&mut io::stdout().lock(), &list, ctx.output)
}

pub(crate) async fn handle_search(ctx: &AppContext, args: SearchArgs) -> CliResult<()> {
    let descriptor =
        QueryDescriptor::new(args.breeds, args.sort, args.direction, args.page, args.size)
            .map_err(|err| CliError::validation(err.to_string()))?;
    let mut controller = SearchController::new(descriptor);
    search_once(&ctx.catalog, &mut controller).await?;
    let favorites = ctx.favorites();
    render_results(&mut io::stdout().lock(), &controller, &favorites, ctx.output)
}

/// Run the controller's current search. Auth failures surface as errors so
/// the caller can point at `login`; other failures leave the controller in
/// its failed state and return the display message.
pub(crate) async fn search_once(
    service: &dyn CatalogService,
    controller: &mut SearchController,
) -> CliResult<()> {
    let Some(ticket) = controller.begin_search() else {
        return Ok(());
    };
    let outcome = fetch_page(service, &ticket).await;
    let auth_rejected = outcome.as_ref().err().is_some_and(CatalogError::is_auth);
    controller.apply(&ticket, outcome);
    if auth_rejected {
        return Err(CliError::validation(SESSION_REQUIRED));
    }
    match controller.status() {
        SearchStatus::Failed { message } => Err(CliError::failure(anyhow!(message.clone()))),
        _ => Ok(()),
    }
}
