use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::KeeperStore;
use super::check_direction_free;
use super::deactivate_in_place;
use crate::error::StoreError;
use crate::keeper::Keeper;
use crate::keeper::KeeperId;

/// Reference store backed by a `Vec`, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryKeeperStore {
    records: Mutex<Vec<Keeper>>,
    read_delay: Duration,
}

impl InMemoryKeeperStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Keeper>) -> Self {
        Self {
            records: Mutex::new(records),
            read_delay: Duration::ZERO,
        }
    }

    /// Delays every lookup, to widen check-then-write windows in tests.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Every record, active or not.
    pub async fn records(&self) -> Vec<Keeper> {
        self.records.lock().await.clone()
    }

    async fn read<T>(&self, f: impl FnOnce(&[Keeper]) -> T) -> T {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        let records = self.records.lock().await;
        f(&records)
    }
}

#[async_trait]
impl KeeperStore for InMemoryKeeperStore {
    async fn find_active_by_uuid(&self, uuid: &str) -> Result<Option<Keeper>, StoreError> {
        Ok(self
            .read(|records| {
                records
                    .iter()
                    .find(|record| record.is_active && record.uuid == uuid)
                    .cloned()
            })
            .await)
    }

    async fn find_active_by_uuid_and_direction(
        &self,
        uuid: &str,
        direction: &str,
    ) -> Result<Option<Keeper>, StoreError> {
        Ok(self
            .read(|records| {
                records
                    .iter()
                    .find(|record| {
                        record.is_active && record.uuid == uuid && record.direction == direction
                    })
                    .cloned()
            })
            .await)
    }

    async fn find_all_active_by_uuid(&self, uuid: &str) -> Result<Vec<Keeper>, StoreError> {
        Ok(self
            .read(|records| {
                records
                    .iter()
                    .filter(|record| record.is_active && record.uuid == uuid)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn find_all_active(&self) -> Result<Vec<Keeper>, StoreError> {
        Ok(self
            .read(|records| records.iter().filter(|record| record.is_active).cloned().collect())
            .await)
    }

    async fn insert(&self, keeper: Keeper) -> Result<KeeperId, StoreError> {
        let mut records = self.records.lock().await;
        check_direction_free(&records, &keeper)?;
        let id = keeper.id.clone();
        records.push(keeper);
        Ok(id)
    }

    async fn mark_inactive(&self, id: &str, actor: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        deactivate_in_place(&mut records, id, actor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn keeper(id: &str, uuid: &str, direction: &str, is_active: bool) -> Keeper {
        Keeper {
            id: id.to_string(),
            uuid: uuid.to_string(),
            direction: direction.to_string(),
            is_active,
            from_uuid: "max".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn lookups_skip_inactive_records() {
        let store = InMemoryKeeperStore::with_records(vec![
            keeper("1", "asdqwe", "teems", false),
            keeper("2", "asdqwe", "docs", true),
        ]);

        let found = store
            .find_active_by_uuid("asdqwe")
            .await
            .expect("lookup should succeed");
        assert_eq!(found.map(|keeper| keeper.id), Some("2".to_string()));
        assert_eq!(
            store
                .find_active_by_uuid_and_direction("asdqwe", "teems")
                .await
                .expect("lookup should succeed"),
            None
        );
        assert_eq!(store.find_all_active().await.expect("lookup").len(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_second_active_record_for_direction() {
        let store = InMemoryKeeperStore::with_records(vec![keeper("1", "asdqwe", "teems", true)]);

        let err = store
            .insert(keeper("2", "123qwe", "teems", true))
            .await
            .expect_err("direction is taken");

        assert_eq!(
            err,
            StoreError::Conflict {
                direction: "teems".to_string(),
                holder: "asdqwe".to_string(),
            }
        );
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn insert_allows_history_for_direction() {
        let store = InMemoryKeeperStore::with_records(vec![keeper("1", "asdqwe", "teems", false)]);

        let id = store
            .insert(keeper("2", "asdqwe", "teems", true))
            .await
            .expect("inactive records do not block");

        assert_eq!(id, "2");
        assert_eq!(store.records().await.len(), 2);
    }

    #[tokio::test]
    async fn mark_inactive_flips_once() {
        let store = InMemoryKeeperStore::with_records(vec![keeper("1", "asdqwe", "teems", true)]);

        store
            .mark_inactive("1", "root")
            .await
            .expect("first deactivation succeeds");
        assert_matches!(
            store.mark_inactive("1", "root").await,
            Err(StoreError::NotFound { .. })
        );

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_active);
        assert_eq!(records[0].from_uuid, "root");
    }
}
