use async_trait::async_trait;

use crate::config::KeepersConfig;
use crate::error::KeeperAction;
use crate::error::StoreError;
use crate::keeper::KeeperRequest;
use crate::store::KeeperStore;

#[derive(Clone, Copy, Debug)]
pub enum Mutation<'a> {
    Grant(&'a KeeperRequest),
    Revoke(&'a KeeperRequest),
}

impl Mutation<'_> {
    pub fn action(self) -> KeeperAction {
        match self {
            Mutation::Grant(_) => KeeperAction::Grant,
            Mutation::Revoke(_) => KeeperAction::Revoke,
        }
    }

    pub fn request(&self) -> &KeeperRequest {
        match self {
            Mutation::Grant(request) | Mutation::Revoke(request) => request,
        }
    }
}

/// Decides whether the request's actor may perform a mutation.
#[async_trait]
pub trait AuthorizationPolicy: Send + Sync {
    async fn authorize(
        &self,
        store: &dyn KeeperStore,
        mutation: Mutation<'_>,
    ) -> Result<bool, StoreError>;
}

/// An actor is authorized when they actively keep any direction.
///
/// Decisions are made from reads that precede the write they guard.
/// [`crate::KeepersService`] serializes its own mutations, but two processes
/// bootstrapping the same empty store can each see it empty and both
/// succeed when `allow_bootstrap` is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveKeeperPolicy {
    /// Lets the first self-grant into a store with no active keepers through.
    pub allow_bootstrap: bool,
    /// Lets the actor that granted the target record revoke it.
    pub allow_grantor_revoke: bool,
}

impl ActiveKeeperPolicy {
    pub fn from_config(config: &KeepersConfig) -> Self {
        Self {
            allow_bootstrap: config.allow_bootstrap,
            allow_grantor_revoke: config.allow_grantor_revoke,
        }
    }
}

#[async_trait]
impl AuthorizationPolicy for ActiveKeeperPolicy {
    async fn authorize(
        &self,
        store: &dyn KeeperStore,
        mutation: Mutation<'_>,
    ) -> Result<bool, StoreError> {
        let request = mutation.request();
        if store.find_active_by_uuid(&request.from_uuid).await?.is_some() {
            return Ok(true);
        }

        match mutation {
            Mutation::Grant(request) if self.allow_bootstrap => {
                Ok(request.from_uuid == request.uuid && store.find_all_active().await?.is_empty())
            }
            Mutation::Revoke(request) if self.allow_grantor_revoke => Ok(store
                .find_active_by_uuid_and_direction(&request.uuid, &request.direction)
                .await?
                .is_some_and(|target| target.from_uuid == request.from_uuid)),
            _ => Ok(false),
        }
    }
}
