use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::KeeperStore;
use crate::error::StoreError;
use crate::keeper::Keeper;
use crate::keeper::KeeperId;

/// Bounds every call on the wrapped store; an elapsed call becomes
/// [`StoreError::Unavailable`].
///
/// The wrapped future is dropped on timeout. Stores whose writes outlive
/// their caller must either abandon them or finish them as a unit, so a
/// timed-out mutation is either fully applied or not applied at all.
#[derive(Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn KeeperStore>,
    timeout: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn KeeperStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, timeout_ms, "keeper store call timed out");
                Err(StoreError::Unavailable(format!(
                    "{operation} timed out after {timeout_ms}ms"
                )))
            }
        }
    }
}

#[async_trait]
impl KeeperStore for TimeoutStore {
    async fn find_active_by_uuid(&self, uuid: &str) -> Result<Option<Keeper>, StoreError> {
        self.bounded("find_active_by_uuid", self.inner.find_active_by_uuid(uuid))
            .await
    }

    async fn find_active_by_uuid_and_direction(
        &self,
        uuid: &str,
        direction: &str,
    ) -> Result<Option<Keeper>, StoreError> {
        self.bounded(
            "find_active_by_uuid_and_direction",
            self.inner.find_active_by_uuid_and_direction(uuid, direction),
        )
        .await
    }

    async fn find_all_active_by_uuid(&self, uuid: &str) -> Result<Vec<Keeper>, StoreError> {
        self.bounded(
            "find_all_active_by_uuid",
            self.inner.find_all_active_by_uuid(uuid),
        )
        .await
    }

    async fn find_all_active(&self) -> Result<Vec<Keeper>, StoreError> {
        self.bounded("find_all_active", self.inner.find_all_active())
            .await
    }

    async fn insert(&self, keeper: Keeper) -> Result<KeeperId, StoreError> {
        self.bounded("insert", self.inner.insert(keeper)).await
    }

    async fn mark_inactive(&self, id: &str, actor: &str) -> Result<(), StoreError> {
        self.bounded("mark_inactive", self.inner.mark_inactive(id, actor))
            .await
    }
}
