use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Doctor, DoctorAvailabilitySlot, NewSlot};

use super::error::BulkUploadError;
use super::validator::ValidatedRecord;

/// Doctor lookup by username, exact and case-sensitive.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn find_doctor_by_username(&self, username: &str) -> Result<Option<Doctor>>;
}

/// Append-only store for availability slots.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Inserts every slot in one statement, so either all rows land or none do.
    async fn insert_slots(&self, slots: Vec<NewSlot>) -> Result<Vec<DoctorAvailabilitySlot>>;
}

pub struct SlotCommitter<'a, D: ?Sized, S: ?Sized> {
    directory: &'a D,
    store: &'a S,
}

impl<'a, D, S> SlotCommitter<'a, D, S>
where
    D: DoctorDirectory + ?Sized,
    S: SlotStore + ?Sized,
{
    pub fn new(directory: &'a D, store: &'a S) -> Self {
        Self { directory, store }
    }

    /// Resolves every record, then writes all slots only if every doctor exists.
    ///
    /// Returns the usernames that could not be resolved, in input order and
    /// once per offending record. An empty list means every slot was written.
    pub async fn commit(&self, records: &[ValidatedRecord]) -> Result<Vec<String>, BulkUploadError> {
        let mut resolved: HashMap<&str, Option<Uuid>> = HashMap::new();
        let mut unresolved = Vec::new();
        let mut pending = Vec::with_capacity(records.len());

        for record in records {
            let username = record.doctor_username();
            let doctor_id = match resolved.get(username) {
                Some(cached) => *cached,
                None => {
                    let found = self
                        .directory
                        .find_doctor_by_username(username)
                        .await?
                        .map(|doctor| doctor.id);
                    resolved.insert(username, found);
                    found
                }
            };

            match doctor_id {
                Some(doctor_id) => pending.push(NewSlot {
                    doctor_id,
                    date: record.date(),
                    start_time: record.start_time(),
                    end_time: record.end_time(),
                    is_available: true,
                }),
                None => unresolved.push(username.to_string()),
            }
        }

        if !unresolved.is_empty() {
            warn!("Bulk slot commit aborted, unresolved doctors: {:?}", unresolved);
            return Ok(unresolved);
        }

        if pending.is_empty() {
            return Ok(unresolved);
        }

        let inserted = self.store.insert_slots(pending).await?;
        debug!("Committed {} availability slots", inserted.len());

        Ok(unresolved)
    }
}
