use crate::error::PersistError;
use crate::types::TrainingRecord;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};

const FILE_PREFIX: &str = "ytt_output_";
const EMPTY_ARRAY: &str = "[]";

/// Appends training records to one JSON array file per channel.
///
/// Each append is a full read-modify-write. Writes to the same file are
/// serialized through a per-path lock, so clones of one emitter may be used
/// from several tasks without losing records.
#[derive(Debug, Clone)]
pub struct Emitter {
    output_dir: PathBuf,
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl Emitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn output_path(&self, channel: &str) -> PathBuf {
        self.output_dir
            .join(format!("{FILE_PREFIX}{}.json", file_safe(channel)))
    }

    /// Persists `record` and reports the outcome through the log. Failures
    /// drop the record.
    pub async fn emit(&self, channel: &str, record: &TrainingRecord) {
        match self.persist(channel, record).await {
            Ok(total) => info!(channel, total, "training record appended"),
            Err(err) => error!(channel, "failed to persist training record: {err}"),
        }
    }

    /// Appends `record` to the channel file, creating it as `[]` first if
    /// needed. Returns the number of records now stored. The file is left
    /// as it was when its content is not a JSON array.
    pub async fn persist(&self, channel: &str, record: &TrainingRecord) -> Result<usize, PersistError> {
        let path = self.output_path(channel);
        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        ensure_array_file(&path).await?;

        let content = fs::read_to_string(&path)
            .await
            .map_err(|err| PersistError::io(&path, err))?;
        let parsed: Value = serde_json::from_str(&content).map_err(|source| PersistError::Parse {
            path: path.clone(),
            source,
        })?;
        let mut records = match parsed {
            Value::Array(records) => records,
            _ => return Err(PersistError::NotAnArray { path }),
        };

        records.push(serde_json::to_value(record)?);
        let total = records.len();
        let body = serde_json::to_string_pretty(&Value::Array(records))?;
        write_replace(&path, &body).await?;
        Ok(total)
    }

    async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(path.to_path_buf()).or_default().clone()
    }
}

async fn ensure_array_file(path: &Path) -> Result<(), PersistError> {
    let exists = fs::try_exists(path)
        .await
        .map_err(|err| PersistError::io(path, err))?;
    if exists {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| PersistError::io(parent, err))?;
    }
    write_replace(path, EMPTY_ARRAY).await
}

/// Writes to a sibling temp file and renames it over `path`.
async fn write_replace(path: &Path, body: &str) -> Result<(), PersistError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)
        .await
        .map_err(|err| PersistError::io(&tmp, err))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|err| PersistError::io(path, err))
}

/// Maps a channel key onto a file-name fragment. Percent-encoding keeps the
/// mapping one-to-one, so distinct channels never share a file.
fn file_safe(channel: &str) -> String {
    urlencoding::encode(channel).into_owned()
}
