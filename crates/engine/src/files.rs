use std::{fmt, io};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("failed to delete {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Storage holding the files attached to units.
#[async_trait]
pub trait FileStore: Send + Sync + fmt::Debug {
    async fn delete(&self, path: &str) -> Result<(), FileStoreError>;
}

/// Files on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileStore;

#[async_trait]
impl FileStore for LocalFileStore {
    async fn delete(&self, path: &str) -> Result<(), FileStoreError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| FileStoreError::Delete {
                path: path.to_string(),
                source,
            })
    }
}
