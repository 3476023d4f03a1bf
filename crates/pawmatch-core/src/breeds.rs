//! Category list loading for the filter picker.

use tracing::warn;

use crate::service::CatalogService;

/// User-facing message when the list cannot be loaded.
pub const BREEDS_FAILED_MESSAGE: &str = "Could not load dog breeds. Please try again.";

/// Loaded category labels, or the reason they are missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BreedList {
    /// Labels sorted alphabetically.
    pub breeds: Vec<String>,
    /// Display message when loading failed.
    pub error: Option<String>,
}

impl BreedList {
    /// Whether `breed` is a known label.
    #[must_use]
    pub fn contains(&self, breed: &str) -> bool {
        self.breeds.binary_search_by(|known| known.as_str().cmp(breed)).is_ok()
    }
}

/// Fetch and sort the category labels. Failures degrade to an empty list with
/// a message; the picker stays usable without suggestions.
pub async fn load_breeds(service: &dyn CatalogService) -> BreedList {
    match service.fetch_breeds().await {
        Ok(mut breeds) => {
            breeds.sort();
            breeds.dedup();
            BreedList {
                breeds,
                error: None,
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to load breeds");
            BreedList {
                breeds: Vec::new(),
                error: Some(BREEDS_FAILED_MESSAGE.to_string()),
            }
        }
    }
}
