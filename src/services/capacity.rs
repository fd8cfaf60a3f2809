//! Capacity ledger
//!
//! Owns `current_participants`. The cached count is only ever written here,
//! always recomputed from the live participation set, and always inside the
//! caller's unit of work.

use tracing::debug;

use crate::database::store::UnitOfWork;
use crate::models::EventCapacity;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::logging;

pub struct CapacityLedger;

impl CapacityLedger {
    /// Get or create the capacity record of an event
    pub async fn ensure(uow: &mut dyn UnitOfWork, event_id: i64, default_max: i32) -> Result<EventCapacity> {
        if let Some(capacity) = uow.find_capacity(event_id).await? {
            return Ok(capacity);
        }

        let live = Self::live_count(uow, event_id).await?;
        let capacity = uow
            .insert_capacity_if_absent(EventCapacity {
                event_id,
                max_participants: default_max.max(1),
                current_participants: live,
            })
            .await?;

        debug!(event_id = event_id, max = capacity.max_participants, "Capacity record created");
        Ok(capacity)
    }

    /// Ensure the record exists and hold its row lock for the rest of the unit of work
    pub async fn lock(uow: &mut dyn UnitOfWork, event_id: i64, default_max: i32) -> Result<EventCapacity> {
        Self::ensure(uow, event_id, default_max).await?;
        uow.lock_capacity(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })
    }

    pub fn is_full(capacity: &EventCapacity) -> bool {
        capacity.current_participants >= capacity.max_participants
    }

    /// Authoritative participant count, read from the participation set
    pub async fn live_count(uow: &mut dyn UnitOfWork, event_id: i64) -> Result<i32> {
        let count = uow.count_participants(event_id).await?;
        i32::try_from(count).map_err(|_| {
            EventDeskError::InvalidInput(format!("Participant count {} out of range", count))
        })
    }

    /// Recompute and persist the cached count; `None` when the event has no capacity record
    pub async fn resync(uow: &mut dyn UnitOfWork, event_id: i64) -> Result<Option<EventCapacity>> {
        let Some(mut capacity) = uow.find_capacity(event_id).await? else {
            return Ok(None);
        };

        let live = Self::live_count(uow, event_id).await?;
        logging::log_capacity_resync(event_id, capacity.current_participants, live);

        if capacity.current_participants != live {
            capacity.current_participants = live;
            uow.save_capacity(&capacity).await?;
        }
        Ok(Some(capacity))
    }

    /// Change the ceiling; status follow-up is up to the lifecycle
    pub async fn set_max(uow: &mut dyn UnitOfWork, capacity: EventCapacity, new_max: i32) -> Result<EventCapacity> {
        validate_max(new_max)?;

        let updated = EventCapacity { max_participants: new_max, ..capacity };
        uow.save_capacity(&updated).await?;
        Ok(updated)
    }
}

pub fn validate_max(max_participants: i32) -> Result<()> {
    if max_participants < 1 {
        return Err(EventDeskError::InvalidInput(
            "Max participants must be at least 1.".to_string(),
        ));
    }
    Ok(())
}
