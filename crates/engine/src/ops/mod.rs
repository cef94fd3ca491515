use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    DEFAULT_LOW_CREDIT_THRESHOLD, DownstreamNotifier, EngineError, FileStore, LocalFileStore,
    NoopNotifier, ResultEngine,
};

mod cases;
mod credits;
mod notifications;
mod registry;

/// Case lifecycle and credit ledger engine.
///
/// Cheap to clone; clones share the connection pool and collaborators.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn DownstreamNotifier>,
    files: Arc<dyn FileStore>,
    low_credit_threshold: i64,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
    notifier: Option<Arc<dyn DownstreamNotifier>>,
    files: Option<Arc<dyn FileStore>>,
    low_credit_threshold: Option<i64>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    /// Downstream system to notify. Defaults to [`NoopNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn DownstreamNotifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Where attached files live. Defaults to [`LocalFileStore`].
    pub fn file_store(mut self, files: Arc<dyn FileStore>) -> EngineBuilder {
        self.files = Some(files);
        self
    }

    pub fn low_credit_threshold(mut self, threshold: i64) -> EngineBuilder {
        self.low_credit_threshold = Some(threshold);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let database = self
            .database
            .ok_or_else(|| EngineError::Validation("a database is required".to_string()))?;
        let low_credit_threshold = self
            .low_credit_threshold
            .unwrap_or(DEFAULT_LOW_CREDIT_THRESHOLD);
        if low_credit_threshold < 0 {
            return Err(EngineError::Validation(format!(
                "low credit threshold must not be negative, got {low_credit_threshold}"
            )));
        }
        Ok(Engine {
            database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier)),
            files: self.files.unwrap_or_else(|| Arc::new(LocalFileStore)),
            low_credit_threshold,
        })
    }
}
