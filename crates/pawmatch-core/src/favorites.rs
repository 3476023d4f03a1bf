//! Favorites set with a durable, corruption-tolerant mirror.
//!
//! # Design
//! - [`FavoriteSet::toggle`] is the only mutation and writes the full set back
//!   through the store on every call.
//! - Loading never fails: unreadable content is logged and treated as empty.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::error::{StoreError, StoreResult};

/// Storage key holding the JSON array of favorite identifiers.
pub const FAVORITES_KEY: &str = "favoritedDogs";

/// Durable medium for the favorite identifiers.
pub trait FavoritesStore: Send {
    /// Read the stored set. A missing value is an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageCorruption`] for unparsable content and
    /// [`StoreError::Io`] when the medium cannot be read.
    fn load(&self) -> StoreResult<BTreeSet<String>>;

    /// Replace the stored set with `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when encoding or writing fails.
    fn save(&self, ids: &BTreeSet<String>) -> StoreResult<()>;
}

fn decode_ids(raw: &str) -> StoreResult<BTreeSet<String>> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|ids| ids.into_iter().collect())
        .map_err(|err| StoreError::StorageCorruption {
            key: FAVORITES_KEY,
            detail: err.to_string(),
        })
}

fn encode_ids(ids: &BTreeSet<String>) -> StoreResult<String> {
    serde_json::to_string(ids).map_err(|source| StoreError::Encode { source })
}

/// In-process store holding the raw encoded value, like a key-value slot.
#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    raw: Mutex<Option<String>>,
}

impl MemoryFavoritesStore {
    /// Seed the slot with raw content, which may be malformed.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// Current raw content of the slot.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FavoritesStore for MemoryFavoritesStore {
    fn load(&self) -> StoreResult<BTreeSet<String>> {
        self.raw().map_or_else(|| Ok(BTreeSet::new()), |raw| decode_ids(&raw))
    }

    fn save(&self, ids: &BTreeSet<String>) -> StoreResult<()> {
        let encoded = encode_ids(ids)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        Ok(())
    }
}

/// JSON document on disk mapping [`FAVORITES_KEY`] to the identifier array.
///
/// Other top-level keys in the document are preserved on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> StoreResult<Option<Map<String, Value>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    operation: "favorites.read",
                    source,
                });
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(StoreError::StorageCorruption {
                key: FAVORITES_KEY,
                detail: "state document is not a JSON object".to_string(),
            }),
            Err(err) => Err(StoreError::StorageCorruption {
                key: FAVORITES_KEY,
                detail: err.to_string(),
            }),
        }
    }
}

impl FavoritesStore for JsonFileStore {
    fn load(&self) -> StoreResult<BTreeSet<String>> {
        let Some(document) = self.read_document()? else {
            return Ok(BTreeSet::new());
        };
        match document.get(FAVORITES_KEY) {
            None | Some(Value::Null) => Ok(BTreeSet::new()),
            Some(Value::String(raw)) => decode_ids(raw),
            Some(value) => serde_json::from_value::<Vec<String>>(value.clone())
                .map(|ids| ids.into_iter().collect())
                .map_err(|err| StoreError::StorageCorruption {
                    key: FAVORITES_KEY,
                    detail: err.to_string(),
                }),
        }
    }

    fn save(&self, ids: &BTreeSet<String>) -> StoreResult<()> {
        // A corrupt document is replaced; an unreadable one aborts the save.
        let mut document = match self.read_document() {
            Ok(document) => document.unwrap_or_default(),
            Err(StoreError::StorageCorruption { .. }) => Map::new(),
            Err(err) => return Err(err),
        };
        let encoded =
            serde_json::to_value(ids).map_err(|source| StoreError::Encode { source })?;
        document.insert(FAVORITES_KEY.to_string(), encoded);
        let body = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|source| StoreError::Encode { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                operation: "favorites.create_dir",
                source,
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|source| StoreError::Io {
            operation: "favorites.write",
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            operation: "favorites.rename",
            source,
        })
    }
}

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The identifier was added.
    Added,
    /// The identifier was removed.
    Removed,
}

impl ToggleOutcome {
    /// User-facing notification text.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "Added to favorites!",
            Self::Removed => "Removed from favorites!",
        }
    }
}

/// The user's favorite identifiers, mirrored to a [`FavoritesStore`].
pub struct FavoriteSet {
    ids: BTreeSet<String>,
    store: Box<dyn FavoritesStore>,
}

impl std::fmt::Debug for FavoriteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteSet").field("ids", &self.ids).finish_non_exhaustive()
    }
}

impl FavoriteSet {
    /// Load the set from `store`, falling back to empty on any failure.
    #[must_use]
    pub fn open(store: Box<dyn FavoritesStore>) -> Self {
        let ids = store.load().unwrap_or_else(|err| {
            warn!(error = %err, key = FAVORITES_KEY, "favorites unreadable; starting empty");
            BTreeSet::new()
        });
        Self { ids, store }
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Current identifiers, sorted.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// Identifiers as an owned list, in the order they are sent to the service.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Number of favorites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add `id` if absent, otherwise remove it, then persist the full set.
    ///
    /// A failed write is logged; the in-memory set stays authoritative.
    pub fn toggle(&mut self, id: &str) -> ToggleOutcome {
        let outcome = if self.ids.remove(id) {
            ToggleOutcome::Removed
        } else {
            self.ids.insert(id.to_string());
            ToggleOutcome::Added
        };
        if let Err(err) = self.store.save(&self.ids) {
            error!(error = %err, id, "failed to persist favorites");
        }
        outcome
    }
}
