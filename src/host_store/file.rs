//! A JSON file-backed implementation of the [`HostStore`][super::HostStore] trait.
//!
//! Uses the [`InMemoryHostStore`][super::memory::InMemoryHostStore] representation as its on-disk
//! format. Nothing is cached between calls: every lookup reads the file, every update reads,
//! modifies and atomically replaces it. This keeps separate processes sharing the file in sync.
use crate::error::Error;
use crate::host_store::memory::InMemoryHostStore;
use crate::host_store::{Host, HostStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// A file-backed host store. The JSON file at `path` is the only copy of the state, so it
/// survives restarts and is shared by every process pointed at the same path.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileHostStore {
    path: PathBuf,
    expiration: Duration,
}

impl FileHostStore {
    /// Open the host store state located at the given path, creating an empty state file if none
    /// exists yet, or return an Error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the JSON state file is invalid.
    ///
    /// Returns [`Error::IO`] if the path can't be opened, read or created.
    pub async fn try_from_file(p: impl AsRef<Path>, expiration: Duration) -> Result<Self, Error> {
        let store = Self {
            path: p.as_ref().to_path_buf(),
            expiration,
        };
        match fs::metadata(&store.path).await {
            Ok(_) => {
                store.load().await?;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                store.save(&InMemoryHostStore::default()).await?;
            }
            Err(err) => return Err(Error::IO(err)),
        }
        Ok(store)
    }

    async fn load(&self) -> Result<InMemoryHostStore, Error> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(InMemoryHostStore::new(self.expiration))
            }
            Err(err) => return Err(Error::IO(err)),
        };
        let state: InMemoryHostStore = serde_json::from_slice(&contents)?;
        Ok(state.with_expiration(self.expiration))
    }

    /// Write the state to a sibling temporary file and rename it over the state file, so readers
    /// never observe a partially written file.
    async fn save(&self, state: &InMemoryHostStore) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(state)?;
        let tmp_path = self.tmp_path();
        let mut output_file = File::create(&tmp_path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.sync_all().await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        file_name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(file_name)
    }
}

#[async_trait::async_trait]
impl HostStore for FileHostStore {
    async fn get_host(&self, hostname: &str) -> Result<Host, Error> {
        self.load().await?.lookup(hostname)
    }

    async fn set_host(&mut self, host: Host) -> Result<(), Error> {
        let mut state = self.load().await?;
        let hostname = host.hostname.clone();
        state.upsert(host)?;
        self.save(&state).await.map_err(|err| {
            tracing::error!("failed to persist host \"{hostname}\": {err}");
            err
        })
    }
}
