//! Favorites surface and the two-step match flow.
//!
//! # Design
//! - Opening the surface starts an epoch; closing bumps it so late responses
//!   from the previous epoch are dropped on arrival.
//! - Each generate attempt gets its own counter inside the epoch, so a
//!   superseded attempt can never overwrite a fresher one.
//! - Match generation is two sequential calls: pick an id, then fetch its
//!   detail. Failures are tagged with the stage that produced them.

use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::favorites::{FavoriteSet, ToggleOutcome};
use crate::model::{Item, order_by_ids};
use crate::service::CatalogService;

/// Step of the flow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    /// Loading details for the favorites list.
    FavoriteDetails,
    /// Asking the service to pick a match.
    Generate,
    /// Loading the matched entry's detail.
    MatchedDetail,
}

impl MatchStage {
    /// User-facing message for a failure at this stage.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FavoriteDetails => "Could not load favorite dog details.",
            Self::Generate => "An error occurred while generating your match. Please try again.",
            Self::MatchedDetail => "Could not load details for the matched dog.",
        }
    }
}

/// Failure recorded on the surface.
#[derive(Debug)]
pub struct MatchFailure {
    /// Stage that failed.
    pub stage: MatchStage,
    /// Underlying cause.
    pub error: CatalogError,
}

impl MatchFailure {
    /// User-facing message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.stage.message()
    }
}

/// Handle for one in-flight call issued by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTicket {
    epoch: u64,
    attempt: u64,
    /// Identifiers to submit.
    pub ids: Vec<String>,
}

/// State of the favorites-and-match surface.
#[derive(Debug, Default)]
pub struct MatchSession {
    open: bool,
    epoch: u64,
    attempt: u64,
    favorite_details: Vec<Item>,
    details_loading: bool,
    loading_match: bool,
    matched_id: Option<String>,
    matched_item: Option<Item>,
    failure: Option<MatchFailure>,
}

impl MatchSession {
    /// Whether the surface is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Loaded favorite details, ordered like the favorite set.
    #[must_use]
    pub fn favorite_details(&self) -> &[Item] {
        &self.favorite_details
    }

    /// Whether favorite details are loading.
    #[must_use]
    pub const fn details_loading(&self) -> bool {
        self.details_loading
    }

    /// Whether a match attempt is in flight.
    #[must_use]
    pub const fn loading_match(&self) -> bool {
        self.loading_match
    }

    /// Identifier picked by the latest attempt.
    #[must_use]
    pub fn matched_id(&self) -> Option<&str> {
        self.matched_id.as_deref()
    }

    /// Detail of the matched entry.
    #[must_use]
    pub const fn matched_item(&self) -> Option<&Item> {
        self.matched_item.as_ref()
    }

    /// Latest failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&MatchFailure> {
        self.failure.as_ref()
    }

    /// Open the surface. Returns a ticket for loading favorite details when
    /// there is anything to load.
    pub fn open(&mut self, favorites: &FavoriteSet) -> Option<MatchTicket> {
        self.reset();
        self.open = true;
        if favorites.is_empty() {
            return None;
        }
        self.details_loading = true;
        Some(self.ticket(favorites.to_vec()))
    }

    /// Apply the favorite-details response. Returns `false` when stale.
    pub fn apply_favorite_details(
        &mut self,
        ticket: &MatchTicket,
        outcome: CatalogResult<Vec<Item>>,
    ) -> bool {
        if !self.is_current_epoch(ticket) {
            debug!("discarding favorite details for a closed surface");
            return false;
        }
        self.details_loading = false;
        match outcome {
            Ok(items) => {
                self.favorite_details = order_by_ids(&ticket.ids, items);
            }
            Err(error) => {
                warn!(error = %error, "favorite details failed");
                self.favorite_details.clear();
                self.failure = Some(MatchFailure {
                    stage: MatchStage::FavoriteDetails,
                    error,
                });
            }
        }
        true
    }

    /// Close the surface and drop all derived state. In-flight responses are
    /// discarded when they arrive.
    pub fn close(&mut self) {
        self.reset();
        self.open = false;
    }

    /// Whether a match can be requested right now.
    #[must_use]
    pub fn can_generate(&self, favorites: &FavoriteSet) -> bool {
        self.open
            && !favorites.is_empty()
            && !self.favorite_details.is_empty()
            && !self.loading_match
            && !self.details_loading
    }

    /// Label for the generate action.
    #[must_use]
    pub const fn generate_label(&self) -> &'static str {
        if self.matched_id.is_some() {
            "Generate New Match"
        } else {
            "Generate Match"
        }
    }

    /// Start a match attempt, clearing any previous match or error.
    pub fn begin_generate(&mut self, favorites: &FavoriteSet) -> Option<MatchTicket> {
        if !self.can_generate(favorites) {
            return None;
        }
        self.attempt += 1;
        self.loading_match = true;
        self.matched_id = None;
        self.matched_item = None;
        self.failure = None;
        Some(self.ticket(favorites.to_vec()))
    }

    /// Apply the generate response. On success, returns the ticket for the
    /// detail lookup of the picked id.
    pub fn apply_match_id(
        &mut self,
        ticket: &MatchTicket,
        outcome: CatalogResult<String>,
    ) -> Option<MatchTicket> {
        if !self.is_current_attempt(ticket) {
            debug!("discarding superseded match response");
            return None;
        }
        match outcome {
            Ok(id) => {
                self.matched_id = Some(id.clone());
                Some(MatchTicket {
                    ids: vec![id],
                    ..ticket.clone()
                })
            }
            Err(error) => {
                warn!(error = %error, "match generation failed");
                self.fail_match(MatchStage::Generate, error);
                None
            }
        }
    }

    /// Apply the matched-detail response. An empty result is a
    /// [`CatalogError::NotFound`].
    pub fn apply_matched_detail(
        &mut self,
        ticket: &MatchTicket,
        outcome: CatalogResult<Vec<Item>>,
    ) -> bool {
        if !self.is_current_attempt(ticket) || self.matched_id.is_none() {
            debug!("discarding superseded match detail");
            return false;
        }
        let found = outcome.and_then(|items| {
            items
                .into_iter()
                .find(|item| ticket.ids.contains(&item.id))
                .ok_or_else(|| CatalogError::NotFound {
                    ids: ticket.ids.clone(),
                })
        });
        match found {
            Ok(item) => {
                self.loading_match = false;
                self.matched_item = Some(item);
            }
            Err(error) => {
                warn!(error = %error, "matched detail failed");
                self.fail_match(MatchStage::MatchedDetail, error);
            }
        }
        true
    }

    /// Remove `id` from the favorites via the surface. Drops its cached detail
    /// and clears the match when it was the matched entry. An attempt still in
    /// flight was issued for the old set and is abandoned.
    ///
    /// Returns `None` when `id` is not a favorite.
    pub fn remove_favorite(
        &mut self,
        id: &str,
        favorites: &mut FavoriteSet,
    ) -> Option<ToggleOutcome> {
        if !favorites.contains(id) {
            return None;
        }
        let outcome = favorites.toggle(id);
        self.favorite_details.retain(|item| item.id != id);
        if self.loading_match {
            debug!(id, "favorites changed; abandoning in-flight match");
            self.attempt += 1;
            self.loading_match = false;
        }
        if self.matched_id.as_deref() == Some(id) {
            self.matched_id = None;
            self.matched_item = None;
        }
        Some(outcome)
    }

    fn fail_match(&mut self, stage: MatchStage, error: CatalogError) {
        self.loading_match = false;
        self.matched_id = None;
        self.matched_item = None;
        self.failure = Some(MatchFailure { stage, error });
    }

    fn ticket(&self, ids: Vec<String>) -> MatchTicket {
        MatchTicket {
            epoch: self.epoch,
            attempt: self.attempt,
            ids,
        }
    }

    fn reset(&mut self) {
        self.epoch += 1;
        self.favorite_details.clear();
        self.details_loading = false;
        self.loading_match = false;
        self.matched_id = None;
        self.matched_item = None;
        self.failure = None;
    }

    const fn is_current_epoch(&self, ticket: &MatchTicket) -> bool {
        self.open && ticket.epoch == self.epoch
    }

    const fn is_current_attempt(&self, ticket: &MatchTicket) -> bool {
        self.is_current_epoch(ticket) && ticket.attempt == self.attempt
    }
}

/// Load details for the favorites shown on an open surface.
pub async fn load_favorite_details(
    service: &dyn CatalogService,
    session: &mut MatchSession,
    ticket: &MatchTicket,
) -> bool {
    let outcome = service.fetch_by_ids(&ticket.ids).await;
    session.apply_favorite_details(ticket, outcome)
}

/// Run a full match attempt: generate, then fetch the matched detail.
///
/// Returns `false` when no attempt could be started or a response was stale.
pub async fn run_match(
    service: &dyn CatalogService,
    session: &mut MatchSession,
    favorites: &FavoriteSet,
) -> bool {
    let Some(ticket) = session.begin_generate(favorites) else {
        return false;
    };
    let picked = service.generate_match(&ticket.ids).await;
    let Some(detail_ticket) = session.apply_match_id(&ticket, picked) else {
        return session.failure().is_some();
    };
    let detail = service.fetch_by_ids(&detail_ticket.ids).await;
    session.apply_matched_detail(&detail_ticket, detail)
}
