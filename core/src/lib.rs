//! Stewardship of directions: who keeps what, and who may change it.
//!
//! [`KeepersService`] is the entry point. It runs every request through an
//! [`AuthorizationPolicy`] and the record invariants before touching a
//! [`KeeperStore`]:
//!
//! - a direction has at most one active keeper;
//! - records are never deleted, only deactivated;
//! - every mutation names the actor that performed it.

pub mod config;
mod error;
mod keeper;
pub mod policy;
mod service;
pub mod store;

pub use config::KeepersConfig;
pub use error::KeeperAction;
pub use error::KeeperError;
pub use error::StoreError;
pub use keeper::Keeper;
pub use keeper::KeeperId;
pub use keeper::KeeperRequest;
pub use keeper::keeper_request_schema;
pub use keeper::keeper_schema;
pub use policy::ActiveKeeperPolicy;
pub use policy::AuthorizationPolicy;
pub use policy::Mutation;
pub use service::KeepersService;
pub use store::InMemoryKeeperStore;
pub use store::KeeperStore;
