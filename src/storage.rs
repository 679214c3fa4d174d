use crate::errors::{StorageError, TrackerError};
use crate::models::{AppData, UserData, UserId};
use std::{path::Path, path::PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};

pub const DEFAULT_DATA_PATH: &str = "data/state.json";

/// A missing file is an empty store. Anything else that keeps the file from
/// loading is an error, so a bad file is never overwritten.
pub async fn load_data(path: &Path) -> Result<AppData, StorageError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(AppData::default()),
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            return Err(err.into());
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| {
        error!(path = %path.display(), "failed to parse data file: {source}");
        StorageError::Corrupt {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Writes the whole store next to `path` and renames it into place, so a
/// crash leaves either the old or the new file.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StorageError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, payload).await?;
    fs::rename(&staging, path).await?;
    Ok(())
}

pub struct Store {
    path: Option<PathBuf>,
    data: Mutex<AppData>,
}

impl Store {
    pub async fn open(path: PathBuf) -> Result<Self, StorageError> {
        let data = load_data(&path).await?;
        Ok(Self::with_data(Some(path), data))
    }

    pub fn in_memory() -> Self {
        Self::with_data(None, AppData::default())
    }

    pub fn with_data(path: Option<PathBuf>, data: AppData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub async fn user_ids(&self) -> Vec<UserId> {
        self.data.lock().await.users.keys().copied().collect()
    }

    pub async fn read_all<T>(&self, read: impl FnOnce(&AppData) -> T) -> T {
        read(&*self.data.lock().await)
    }

    pub async fn read_user<T>(&self, user_id: UserId, read: impl FnOnce(&UserData) -> T) -> Option<T> {
        self.data.lock().await.users.get(&user_id).map(read)
    }

    /// Commits only if `update` succeeds and the write reaches disk.
    pub async fn update_user<T>(
        &self,
        user_id: UserId,
        update: impl FnOnce(&mut UserData) -> Result<T, TrackerError>,
    ) -> Result<T, TrackerError> {
        let mut data = self.data.lock().await;
        let previous = data.users.get(&user_id).cloned();
        let mut draft = previous.clone().unwrap_or_default();
        let output = update(&mut draft)?;

        let unchanged = match &previous {
            Some(previous) => *previous == draft,
            None => draft == UserData::default(),
        };
        if unchanged {
            return Ok(output);
        }

        data.users.insert(user_id, draft);
        if let Some(path) = &self.path {
            if let Err(err) = persist_data(path, &data).await {
                match previous {
                    Some(previous) => data.users.insert(user_id, previous),
                    None => data.users.remove(&user_id),
                };
                return Err(err.into());
            }
            debug!(user_id, "persisted user data");
        }
        Ok(output)
    }
}
