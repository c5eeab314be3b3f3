//! File-backed persistence for keeper records.

mod file_store;
pub mod model;

pub use file_store::AUDIT_LOG_FILE;
pub use file_store::JsonFileKeeperStore;
pub use file_store::RECORDS_FILE;
