//! RSVP domain record, draft, and normalization helpers.

use serde::{Deserialize, Serialize};

use crate::types::{RsvpId, Timestamp};

/// Fully materialized RSVP record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpRecord {
    /// Storage-assigned identifier.
    pub id: RsvpId,
    /// Trimmed guest name, as first submitted.
    pub name: String,
    /// Whether the guest is coming.
    pub attending: bool,
    /// Dish the guest plans to bring, if any.
    pub dish: Option<String>,
    /// Time of first submission. Never updated.
    pub created_at: Timestamp,
}

/// Validated submission ready for the storage layer.
///
/// Build one with [`RsvpDraft::new`]; the name is trimmed and the dish is
/// normalized so an empty string never reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpDraft {
    /// Trimmed, non-empty guest name.
    pub name: String,
    /// Whether the guest is coming.
    pub attending: bool,
    /// Normalized dish.
    pub dish: Option<String>,
}

impl RsvpDraft {
    /// Normalizes a raw submission. Returns `None` when the name is blank.
    pub fn new(raw_name: &str, attending: bool, dish: Option<&str>) -> Option<Self> {
        let name = normalize_name(raw_name)?;
        Some(Self {
            name: name.to_string(),
            attending,
            dish: normalize_dish(dish),
        })
    }
}

/// Aggregate counts over the guest list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RsvpStats {
    /// Number of guests who responded.
    pub total: usize,
    /// Guests attending.
    pub attending: usize,
    /// Guests not attending.
    pub not_attending: usize,
}

impl RsvpStats {
    /// Tallies a record set.
    pub fn from_records(records: &[RsvpRecord]) -> Self {
        let attending = records.iter().filter(|r| r.attending).count();
        Self {
            total: records.len(),
            attending,
            not_attending: records.len() - attending,
        }
    }
}

/// Trims surrounding whitespace; `None` if nothing is left.
pub fn normalize_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Maps absent and empty dishes to `None`.
pub fn normalize_dish(dish: Option<&str>) -> Option<String> {
    match dish {
        Some(d) if !d.is_empty() => Some(d.to_string()),
        _ => None,
    }
}

/// Key used to compare guest names: trimmed and lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_trims_name_and_drops_empty_dish() {
        let draft = RsvpDraft::new("  Ana ", true, Some("")).expect("draft");
        assert_eq!(draft.name, "Ana");
        assert_eq!(draft.dish, None);
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(RsvpDraft::new("", true, None).is_none());
        assert!(RsvpDraft::new(" \t\n ", false, Some("Pie")).is_none());
    }

    #[test]
    fn dish_whitespace_is_kept() {
        assert_eq!(normalize_dish(Some(" ")), Some(" ".to_string()));
        assert_eq!(normalize_dish(None), None);
    }

    #[test]
    fn name_key_folds_case_and_whitespace() {
        assert_eq!(name_key(" ANA "), name_key("ana"));
        assert_ne!(name_key("Ana"), name_key("Anna"));
    }
}
