//! Persistence seam for keeper records.
//!
//! Implementations must be atomic per record and must refuse to insert an
//! active record for a direction that already has one. Nothing is ever
//! deleted; deactivation flips `is_active`.

mod memory;
mod timeout;

pub use memory::InMemoryKeeperStore;
pub use timeout::TimeoutStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::keeper::Keeper;
use crate::keeper::KeeperId;

#[async_trait]
pub trait KeeperStore: Send + Sync {
    /// First active record held by `uuid`, in store order.
    async fn find_active_by_uuid(&self, uuid: &str) -> Result<Option<Keeper>, StoreError>;

    async fn find_active_by_uuid_and_direction(
        &self,
        uuid: &str,
        direction: &str,
    ) -> Result<Option<Keeper>, StoreError>;

    async fn find_all_active_by_uuid(&self, uuid: &str) -> Result<Vec<Keeper>, StoreError>;

    async fn find_all_active(&self) -> Result<Vec<Keeper>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when `keeper` is active and its
    /// direction already has an active record.
    async fn insert(&self, keeper: Keeper) -> Result<KeeperId, StoreError>;

    /// Flips an active record to inactive and records `actor` as its last
    /// mutator. Fails with [`StoreError::NotFound`] if the record is missing
    /// or already inactive.
    async fn mark_inactive(&self, id: &str, actor: &str) -> Result<(), StoreError>;
}

/// Shared insert check for implementations that keep records in a `Vec`.
pub fn check_direction_free(records: &[Keeper], keeper: &Keeper) -> Result<(), StoreError> {
    if !keeper.is_active {
        return Ok(());
    }
    match records
        .iter()
        .find(|record| record.is_active && record.direction == keeper.direction)
    {
        Some(holder) => Err(StoreError::Conflict {
            direction: keeper.direction.clone(),
            holder: holder.uuid.clone(),
        }),
        None => Ok(()),
    }
}

/// Shared deactivation for implementations that keep records in a `Vec`.
/// Returns the updated record.
pub fn deactivate_in_place<'a>(
    records: &'a mut [Keeper],
    id: &str,
    actor: &str,
) -> Result<&'a Keeper, StoreError> {
    let record = records
        .iter_mut()
        .find(|record| record.id == id && record.is_active)
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
    record.is_active = false;
    record.from_uuid = actor.to_string();
    Ok(record)
}
