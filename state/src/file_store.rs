use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use keepers_core::Keeper;
use keepers_core::KeeperId;
use keepers_core::KeeperStore;
use keepers_core::StoreError;
use keepers_core::store::check_direction_free;
use keepers_core::store::deactivate_in_place;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::warn;

use crate::model::AuditAction;
use crate::model::AuditActionType;

pub const RECORDS_FILE: &str = "keepers.json";
pub const AUDIT_LOG_FILE: &str = "audit.jsonl";

/// Keeps every record in one JSON array under `home` and appends each
/// mutation to an audit log next to it.
///
/// A mutation runs on its own task under the store lock: load, check, write
/// `keepers.json`, then append to `audit.jsonl`. Dropping the caller's future
/// before the write starts abandons the mutation; after that it runs to
/// completion. The records file is the commit point, so a failed audit append
/// is logged and the mutation still succeeds.
///
/// Calls are serialized within the process; two processes sharing a home are
/// not coordinated.
#[derive(Debug)]
pub struct JsonFileKeeperStore {
    files: Arc<StoreFiles>,
}

#[derive(Debug)]
struct StoreFiles {
    records_path: PathBuf,
    audit_log_path: PathBuf,
    lock: Mutex<()>,
}

type Commit<T> = Result<(T, AuditAction), StoreError>;

impl JsonFileKeeperStore {
    pub fn open(home: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(home).map_err(|err| {
            StoreError::Unavailable(format!("failed to create {}: {err}", home.display()))
        })?;
        Ok(Self {
            files: Arc::new(StoreFiles {
                records_path: home.join(RECORDS_FILE),
                audit_log_path: home.join(AUDIT_LOG_FILE),
                lock: Mutex::new(()),
            }),
        })
    }

    /// Every record, active or not, in insertion order.
    pub async fn records(&self) -> Result<Vec<Keeper>, StoreError> {
        let _guard = self.files.lock.lock().await;
        self.files.load().await
    }

    pub async fn audit_log(&self) -> Result<Vec<AuditAction>, StoreError> {
        let _guard = self.files.lock.lock().await;
        let path = &self.files.audit_log_path;
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_failure("read", path, err)),
        };
        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|err| parse_failure(path, err)))
            .collect()
    }

    async fn read_matching<T>(
        &self,
        f: impl FnOnce(Vec<Keeper>) -> T + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.files.lock.lock().await;
        Ok(f(self.files.load().await?))
    }

    async fn commit<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Keeper>) -> Commit<T> + Send + 'static,
    {
        let files = Arc::clone(&self.files);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = files.commit_locked(&tx, mutate).await;
            let _ = tx.send(outcome);
        });
        rx.await
            .map_err(|_| StoreError::Unavailable("keeper store writer stopped".to_string()))?
    }
}

impl StoreFiles {
    async fn commit_locked<T, F>(
        &self,
        caller: &oneshot::Sender<Result<T, StoreError>>,
        mutate: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Keeper>) -> Commit<T>,
    {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let (value, audit) = mutate(&mut records)?;
        if caller.is_closed() {
            debug!(keeper_id = %audit.keeper_id, "caller went away, dropping keeper mutation");
            return Err(StoreError::Unavailable(
                "keeper mutation abandoned by caller".to_string(),
            ));
        }
        self.save(records).await?;
        if let Err(err) = self.append_audit(&audit).await {
            warn!(
                keeper_id = %audit.keeper_id,
                error = %err,
                "keeper mutation committed without an audit entry"
            );
        }
        debug!(
            keeper_id = %audit.keeper_id,
            action = ?audit.action_type,
            path = %self.records_path.display(),
            "committed keeper mutation"
        );
        Ok(value)
    }

    async fn load(&self) -> Result<Vec<Keeper>, StoreError> {
        let data = match tokio::fs::read_to_string(&self.records_path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_failure("read", &self.records_path, err)),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|err| parse_failure(&self.records_path, err))
    }

    async fn save(&self, records: Vec<Keeper>) -> Result<(), StoreError> {
        let path = self.records_path.clone();
        tokio::task::spawn_blocking(move || write_json(&path, &records))
            .await
            .map_err(|err| StoreError::Unavailable(format!("keeper store writer failed: {err}")))?
    }

    async fn append_audit(&self, entry: &AuditAction) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(entry).map_err(|err| {
            StoreError::Unavailable(format!("failed to encode audit entry: {err}"))
        })?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .await
            .map_err(|err| io_failure("open", &self.audit_log_path, err))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|err| io_failure("append to", &self.audit_log_path, err))
    }
}

#[async_trait]
impl KeeperStore for JsonFileKeeperStore {
    async fn find_active_by_uuid(&self, uuid: &str) -> Result<Option<Keeper>, StoreError> {
        self.read_matching(|records| {
            records
                .into_iter()
                .find(|record| record.is_active && record.uuid == uuid)
        })
        .await
    }

    async fn find_active_by_uuid_and_direction(
        &self,
        uuid: &str,
        direction: &str,
    ) -> Result<Option<Keeper>, StoreError> {
        self.read_matching(|records| {
            records.into_iter().find(|record| {
                record.is_active && record.uuid == uuid && record.direction == direction
            })
        })
        .await
    }

    async fn find_all_active_by_uuid(&self, uuid: &str) -> Result<Vec<Keeper>, StoreError> {
        self.read_matching(|records| {
            records
                .into_iter()
                .filter(|record| record.is_active && record.uuid == uuid)
                .collect()
        })
        .await
    }

    async fn find_all_active(&self) -> Result<Vec<Keeper>, StoreError> {
        self.read_matching(|records| {
            records
                .into_iter()
                .filter(|record| record.is_active)
                .collect()
        })
        .await
    }

    async fn insert(&self, keeper: Keeper) -> Result<KeeperId, StoreError> {
        self.commit(move |records| {
            check_direction_free(records, &keeper)?;
            let id = keeper.id.clone();
            let audit = AuditAction {
                timestamp: keeper.created_at.timestamp(),
                actor: keeper.from_uuid.clone(),
                action_type: AuditActionType::Grant,
                direction: keeper.direction.clone(),
                target: keeper.uuid.clone(),
                keeper_id: id.clone(),
            };
            records.push(keeper);
            Ok((id, audit))
        })
        .await
    }

    async fn mark_inactive(&self, id: &str, actor: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let actor = actor.to_string();
        self.commit(move |records| {
            let revoked = deactivate_in_place(records, &id, &actor)?;
            let audit = AuditAction {
                timestamp: Utc::now().timestamp(),
                actor: actor.clone(),
                action_type: AuditActionType::Revoke,
                direction: revoked.direction.clone(),
                target: revoked.uuid.clone(),
                keeper_id: id.clone(),
            };
            Ok(((), audit))
        })
        .await
    }
}

fn write_json(path: &Path, records: &[Keeper]) -> Result<(), StoreError> {
    let dir = path.parent().ok_or_else(|| {
        StoreError::Unavailable(format!("no parent directory for {}", path.display()))
    })?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| io_failure("create temp file in", dir, err))?;
    serde_json::to_writer_pretty(&mut temp, records)
        .map_err(|err| StoreError::Unavailable(format!("failed to encode keepers: {err}")))?;
    temp.as_file_mut()
        .write_all(b"\n")
        .map_err(|err| io_failure("write", path, err))?;
    temp.persist(path)
        .map_err(|err| io_failure("persist", path, err.error))?;
    Ok(())
}

fn io_failure(verb: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("failed to {verb} {}: {err}", path.display()))
}

fn parse_failure(path: &Path, err: serde_json::Error) -> StoreError {
    StoreError::Unavailable(format!("failed to parse {}: {err}", path.display()))
}
