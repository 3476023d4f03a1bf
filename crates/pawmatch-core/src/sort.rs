//! Sort field selection and the ascending → descending → unset cycle.
//!
//! # Design
//! - The cycle is a pure transition so it can be exercised without any surface.
//! - An unset direction is inert: the effective sort falls back to
//!   [`SortState::DEFAULT_EFFECTIVE`] regardless of the chosen field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Field the catalog can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Category label (breed).
    Category,
    /// Numeric age.
    Age,
    /// Display name.
    Name,
}

impl SortField {
    /// All sortable fields in display order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Category, Self::Age, Self::Name]
    }

    /// Field name understood by the remote search endpoint.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Category => "breed",
            Self::Age => "age",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.wire_name())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "breed" | "category" => Ok(Self::Category),
            "age" => Ok(Self::Age),
            "name" => Ok(Self::Name),
            other => Err(format!(
                "unknown sort field '{other}' (expected breed, age, or name)"
            )),
        }
    }
}

/// User-selected direction, including the inert `Unset` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
    /// No explicit direction; the default sort applies.
    Unset,
}

impl SortDirection {
    /// Short label used in listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
            Self::Unset => "unset",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            "unset" | "none" => Ok(Self::Unset),
            other => Err(format!(
                "unknown sort direction '{other}' (expected asc, desc, or unset)"
            )),
        }
    }
}

/// Direction actually submitted to the remote service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// `asc` on the wire.
    Asc,
    /// `desc` on the wire.
    Desc,
}

impl SortOrder {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Resolved field + order pair, always concrete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectiveSort {
    /// Field to sort by.
    pub field: SortField,
    /// Order to sort in.
    pub order: SortOrder,
}

impl EffectiveSort {
    /// Encode as the `field:order` query value.
    #[must_use]
    pub fn to_param(self) -> String {
        format!("{}:{}", self.field.wire_name(), self.order.as_str())
    }
}

/// Active sort field and its direction. Only one field is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SortState {
    /// Active field.
    pub field: SortField,
    /// Direction for the active field.
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::Category,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// Sort used whenever the direction is unset.
    pub const DEFAULT_EFFECTIVE: EffectiveSort = EffectiveSort {
        field: SortField::Category,
        order: SortOrder::Asc,
    };

    /// Apply a click on `clicked` and return the next state.
    #[must_use]
    pub const fn select(self, clicked: SortField) -> Self {
        let (field, direction) = next_sort(self.field, self.direction, clicked);
        Self { field, direction }
    }

    /// Resolve the sort that should be submitted.
    #[must_use]
    pub const fn effective(self) -> EffectiveSort {
        match self.direction {
            SortDirection::Ascending => EffectiveSort {
                field: self.field,
                order: SortOrder::Asc,
            },
            SortDirection::Descending => EffectiveSort {
                field: self.field,
                order: SortOrder::Desc,
            },
            SortDirection::Unset => Self::DEFAULT_EFFECTIVE,
        }
    }
}

/// Transition for a click on `clicked` given the active field and direction.
///
/// Switching fields always starts at ascending; clicking the active field
/// cycles ascending → descending → unset → ascending.
#[must_use]
pub const fn next_sort(
    current_field: SortField,
    current_direction: SortDirection,
    clicked: SortField,
) -> (SortField, SortDirection) {
    if !same_field(current_field, clicked) {
        return (clicked, SortDirection::Ascending);
    }
    let direction = match current_direction {
        SortDirection::Ascending => SortDirection::Descending,
        SortDirection::Descending => SortDirection::Unset,
        SortDirection::Unset => SortDirection::Ascending,
    };
    (clicked, direction)
}

const fn same_field(left: SortField, right: SortField) -> bool {
    matches!(
        (left, right),
        (SortField::Category, SortField::Category)
            | (SortField::Age, SortField::Age)
            | (SortField::Name, SortField::Name)
    )
}
