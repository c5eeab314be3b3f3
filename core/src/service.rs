use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::KeepersConfig;
use crate::error::KeeperError;
use crate::error::StoreError;
use crate::keeper::Keeper;
use crate::keeper::KeeperId;
use crate::keeper::KeeperRequest;
use crate::keeper::require_field;
use crate::policy::ActiveKeeperPolicy;
use crate::policy::AuthorizationPolicy;
use crate::policy::Mutation;
use crate::store::KeeperStore;
use crate::store::TimeoutStore;

/// Grants, revokes and answers queries about stewardship.
///
/// Holds no keeper state of its own. Every check runs before the single write
/// of a mutation, so a failed call leaves the store untouched.
///
/// Mutations through one service and its clones take turns, so policy reads
/// and the write that follows them are not interleaved with another
/// mutation in the same process. Separate processes rely on the store's
/// insert-time uniqueness check alone.
#[derive(Clone)]
pub struct KeepersService {
    store: TimeoutStore,
    policy: Arc<dyn AuthorizationPolicy>,
    writes: Arc<Mutex<()>>,
}

impl KeepersService {
    pub fn new(
        store: Arc<dyn KeeperStore>,
        policy: Arc<dyn AuthorizationPolicy>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store: TimeoutStore::new(store, store_timeout),
            policy,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(store: Arc<dyn KeeperStore>, config: &KeepersConfig) -> Self {
        Self::new(
            store,
            Arc::new(ActiveKeeperPolicy::from_config(config)),
            config.store_timeout(),
        )
    }

    pub async fn add_keeper(&self, request: &KeeperRequest) -> Result<KeeperId, KeeperError> {
        let request = request.normalized()?;
        debug!(
            from_uuid = %request.from_uuid,
            uuid = %request.uuid,
            direction = %request.direction,
            "add keeper requested"
        );

        let _write = self.writes.lock().await;
        self.authorize(Mutation::Grant(&request)).await?;

        if let Some(existing) = self
            .store
            .find_active_by_uuid_and_direction(&request.uuid, &request.direction)
            .await
            .map_err(store_failure)?
        {
            warn!(uuid = %existing.uuid, direction = %existing.direction, "keeper already active");
            return Err(KeeperError::DirectionAlreadyActive {
                direction: existing.direction,
                holder: existing.uuid,
            });
        }

        let keeper = Keeper::new_active(&request, Utc::now());
        let id = self.store.insert(keeper).await.map_err(store_failure)?;
        info!(
            id = %id,
            from_uuid = %request.from_uuid,
            uuid = %request.uuid,
            direction = %request.direction,
            "added keeper"
        );
        Ok(id)
    }

    pub async fn deactivate_keeper(&self, request: &KeeperRequest) -> Result<(), KeeperError> {
        let request = request.normalized()?;
        debug!(
            from_uuid = %request.from_uuid,
            uuid = %request.uuid,
            direction = %request.direction,
            "deactivate keeper requested"
        );

        let _write = self.writes.lock().await;
        self.authorize(Mutation::Revoke(&request)).await?;

        let not_found = || KeeperError::NotFound {
            uuid: request.uuid.clone(),
            direction: request.direction.clone(),
        };
        let target = self
            .store
            .find_active_by_uuid_and_direction(&request.uuid, &request.direction)
            .await
            .map_err(store_failure)?
            .ok_or_else(not_found)?;

        match self.store.mark_inactive(&target.id, &request.from_uuid).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => return Err(not_found()),
            Err(err) => return Err(store_failure(err)),
        }
        info!(
            id = %target.id,
            from_uuid = %request.from_uuid,
            uuid = %request.uuid,
            direction = %request.direction,
            "deactivated keeper"
        );
        Ok(())
    }

    /// Directions `uuid` actively keeps, in store order. An unknown uuid
    /// simply keeps nothing.
    pub async fn get_directions(&self, uuid: &str) -> Result<Vec<String>, KeeperError> {
        let uuid = require_field("uuid", uuid)?;
        let directions: Vec<String> = self
            .store
            .find_all_active_by_uuid(&uuid)
            .await
            .map_err(store_failure)?
            .into_iter()
            .map(|keeper| keeper.direction)
            .collect();
        debug!(uuid = %uuid, count = directions.len(), "returned keeper directions");
        Ok(directions)
    }

    pub async fn get_all_active_keepers(&self) -> Result<Vec<Keeper>, KeeperError> {
        let keepers = self.store.find_all_active().await.map_err(store_failure)?;
        debug!(count = keepers.len(), "returned active keepers");
        Ok(keepers)
    }

    async fn authorize(&self, mutation: Mutation<'_>) -> Result<(), KeeperError> {
        let allowed = self
            .policy
            .authorize(&self.store, mutation)
            .await
            .map_err(store_failure)?;
        if allowed {
            return Ok(());
        }
        let actor = mutation.request().from_uuid.clone();
        warn!(actor = %actor, action = %mutation.action(), "keeper mutation denied");
        Err(KeeperError::AccessDenied {
            actor,
            action: mutation.action(),
        })
    }
}

fn store_failure(err: StoreError) -> KeeperError {
    if let StoreError::Unavailable(reason) = &err {
        warn!(reason = %reason, "keeper store failure");
    }
    KeeperError::from(err)
}
