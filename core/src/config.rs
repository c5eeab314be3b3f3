use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "keepers.toml";
pub const KEEPERS_HOME_ENV: &str = "KEEPERS_HOME";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeepersConfig {
    pub store_timeout_ms: u64,
    pub allow_bootstrap: bool,
    pub allow_grantor_revoke: bool,
}

impl Default for KeepersConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            allow_bootstrap: false,
            allow_grantor_revoke: false,
        }
    }
}

impl KeepersConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("store_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

pub async fn load_config_file(path: &Path) -> Result<KeepersConfig, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let config: KeepersConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if config.store_timeout_ms == 0 {
        return Err(ConfigError::ZeroTimeout);
    }
    Ok(config)
}

/// Loads the nearest `keepers.toml` at or above `cwd`, or the defaults when
/// there is none.
pub async fn load_config(cwd: &Path) -> Result<KeepersConfig, ConfigError> {
    match find_config_path(cwd).await {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading keepers config");
            load_config_file(&path).await
        }
        None => Ok(KeepersConfig::default()),
    }
}

async fn find_config_path(cwd: &Path) -> Option<PathBuf> {
    let mut current = Some(cwd);
    while let Some(path) = current {
        let candidate = path.join(CONFIG_FILE_NAME);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
        current = path.parent();
    }
    None
}

/// `$KEEPERS_HOME`, falling back to `~/.keepers`.
pub fn find_keepers_home() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os(KEEPERS_HOME_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(home));
    }
    dirs::home_dir().map(|home| home.join(".keepers"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(dir.path()).await.expect("defaults");
        assert_eq!(config, KeepersConfig::default());
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn nearest_file_above_cwd_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("nested dirs");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "allow_bootstrap = true\nstore_timeout_ms = 250\n",
        )
        .expect("write config");

        let config = load_config(&nested).await.expect("config");

        assert_eq!(
            config,
            KeepersConfig {
                store_timeout_ms: 250,
                allow_bootstrap: true,
                allow_grantor_revoke: false,
            }
        );
    }

    #[tokio::test]
    async fn rejects_unknown_keys_and_zero_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "allow_everyone = true\n").expect("write config");
        assert_matches!(load_config_file(&path).await, Err(ConfigError::Parse { .. }));

        std::fs::write(&path, "store_timeout_ms = 0\n").expect("write config");
        assert_matches!(load_config_file(&path).await, Err(ConfigError::ZeroTimeout));
    }
}
