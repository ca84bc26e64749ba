//! Configuration store backed by a JSON file

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::ConfigStore,
};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Default directory name under the user's home directory
pub const DEFAULT_CONFIG_DIR: &str = ".weblogin";

/// Default file name inside [`DEFAULT_CONFIG_DIR`]
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// The file holds a credential, so it is readable by its owner only.
#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o600;

/// JSON-file-backed configuration store
///
/// The file holds a single JSON object of string values. A missing file is
/// an empty store. Writes within one instance are serialized; separate
/// processes are not coordinated. Each write goes to a sibling temp file
/// that is renamed over the target, so a crash never leaves a truncated
/// file behind. On Unix the file is created with mode `0o600`.
pub struct JsonConfigFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `~/.weblogin/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            BridgeError::NotAvailable("Could not determine home directory".to_string())
        })?;
        Ok(home.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Map<String, Value>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(BridgeError::Io(e)),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        serde_json::from_slice(&data).map_err(|e| {
            BridgeError::OperationFailed(format!(
                "Malformed config file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(map).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to serialize config: {}", e))
        })?;

        let tmp_path = self.temp_path();
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(CONFIG_FILE_MODE);

        let mut file = options.open(&tmp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        // a stale temp file keeps its old mode across `create`
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(CONFIG_FILE_MODE);
            tokio::fs::set_permissions(&tmp_path, perms).await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for JsonConfigFile {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map).await?;

        debug!(key = key, path = %self.path.display(), "Stored config value");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map().await?;
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(BridgeError::OperationFailed(format!(
                "Type mismatch for {}: expected string, got {}",
                key, other
            ))),
        }
    }

    async fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared config file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}
