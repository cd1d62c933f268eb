//! Guest-list operations on top of a [`RsvpStore`].
//!
//! The repository owns the one-record-per-guest rule: a submission whose
//! trimmed name matches an existing record ignoring case updates that record
//! in place, anything else inserts. The lookup and the write are two separate
//! storage calls, so two simultaneous first submissions for the same name can
//! still both insert.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    persist::{RsvpStore, StorageError},
    rsvp::{RsvpDraft, RsvpRecord, RsvpStats},
    types::RsvpId,
};

/// Failures surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Name was missing or blank.
    #[error("Name is required")]
    NameRequired,
    /// Wipe secret did not match.
    #[error("Unauthorized")]
    Unauthorized,
    /// Backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of a successful upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new guest was recorded.
    Created(RsvpId),
    /// An existing guest's answer was replaced.
    Updated(RsvpId),
}

impl UpsertOutcome {
    /// True for [`UpsertOutcome::Updated`].
    pub fn is_update(self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Id of the affected record.
    pub fn id(self) -> RsvpId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Guest-list repository. Cheap to clone.
#[derive(Clone)]
pub struct RsvpRepository {
    store: Arc<dyn RsvpStore>,
}

impl RsvpRepository {
    /// Wraps an opened store.
    pub fn new(store: Arc<dyn RsvpStore>) -> Self {
        Self { store }
    }

    /// Every record, newest first.
    pub async fn list_all(&self) -> Result<Vec<RsvpRecord>, RepoError> {
        Ok(self.store.query_all().await?)
    }

    /// Totals over the full list.
    pub async fn stats(&self) -> Result<RsvpStats, RepoError> {
        let records = self.store.query_all().await?;
        Ok(RsvpStats::from_records(&records))
    }

    /// Records a submission, updating the guest's existing record if any.
    pub async fn upsert(
        &self,
        raw_name: &str,
        attending: bool,
        dish: Option<&str>,
    ) -> Result<UpsertOutcome, RepoError> {
        let draft = RsvpDraft::new(raw_name, attending, dish).ok_or(RepoError::NameRequired)?;

        match self.store.find_by_name_case_insensitive(&draft.name).await? {
            Some(existing) => {
                self.store
                    .update(existing.id, draft.attending, draft.dish.as_deref())
                    .await?;
                debug!(id = existing.id, "updated rsvp");
                Ok(UpsertOutcome::Updated(existing.id))
            }
            None => {
                let id = self
                    .store
                    .insert(&draft.name, draft.attending, draft.dish.as_deref())
                    .await?;
                info!(id, "new rsvp");
                Ok(UpsertOutcome::Created(id))
            }
        }
    }

    /// Deletes every record when `supplied` equals `expected`.
    ///
    /// The comparison is plain string equality, not constant time.
    pub async fn wipe_all(&self, supplied: Option<&str>, expected: &str) -> Result<usize, RepoError> {
        if supplied != Some(expected) {
            warn!("rejected wipe with wrong admin password");
            return Err(RepoError::Unauthorized);
        }
        let count = self.store.delete_all().await?;
        warn!(count, "wiped all rsvps");
        Ok(count)
    }
}
