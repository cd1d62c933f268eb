//! Process-local backend with the same semantics as the SQL stores.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use hashbrown::HashMap;

use crate::{
    rsvp::{RsvpRecord, name_key},
    types::RsvpId,
};

use super::{RsvpStore, StorageError, StorageResult};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<RsvpId, RsvpRecord>,
    by_name: HashMap<String, Vec<RsvpId>>,
    next_id: RsvpId,
}

impl MemoryState {
    fn insert(&mut self, name: &str, attending: bool, dish: Option<&str>) -> RsvpId {
        let id = self.next_id;
        self.next_id += 1;

        let rec = RsvpRecord {
            id,
            name: name.to_string(),
            attending,
            dish: dish.map(str::to_string),
            created_at: Utc::now(),
        };
        self.by_name.entry(name_key(name)).or_default().push(id);
        self.records.insert(id, rec);
        id
    }

    fn find(&self, name: &str) -> Option<&RsvpRecord> {
        self.by_name
            .get(&name_key(name))
            .and_then(|ids| ids.iter().min())
            .and_then(|id| self.records.get(id))
    }

    fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        self.by_name.clear();
        count
    }
}

/// In-memory implementation of [`RsvpStore`].
///
/// Ids keep increasing across wipes, matching `AUTOINCREMENT`.
#[derive(Debug)]
pub struct MemoryRsvpStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryRsvpStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRsvpStore {
    /// Creates an empty store whose first id is 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                ..MemoryState::default()
            }),
        }
    }

    /// Number of stored records, read through a poisoned lock if need be.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Message("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RsvpStore for MemoryRsvpStore {
    async fn ensure_schema(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn query_all(&self) -> StorageResult<Vec<RsvpRecord>> {
        let state = self.lock()?;
        let mut out: Vec<RsvpRecord> = state.records.values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn find_by_name_case_insensitive(
        &self,
        name: &str,
    ) -> StorageResult<Option<RsvpRecord>> {
        Ok(self.lock()?.find(name).cloned())
    }

    async fn insert(&self, name: &str, attending: bool, dish: Option<&str>) -> StorageResult<RsvpId> {
        Ok(self.lock()?.insert(name, attending, dish))
    }

    async fn update(&self, id: RsvpId, attending: bool, dish: Option<&str>) -> StorageResult<()> {
        let mut state = self.lock()?;
        let rec = state
            .records
            .get_mut(&id)
            .ok_or(StorageError::MissingRsvp(id))?;
        rec.attending = attending;
        rec.dish = dish.map(str::to_string);
        Ok(())
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        Ok(self.lock()?.clear())
    }
}
