#![allow(dead_code)]

use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    CaseRegistration, CaseRejection, DownstreamNotifier, Engine, FileStore, FileStoreError,
    NewUnit, NewUser, RemoteError, User,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// Downstream double that records every call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub registrations: Mutex<Vec<(CaseRegistration, String)>>,
    pub rejections: Mutex<Vec<CaseRejection>>,
    failure: Mutex<Option<RemoteError>>,
}

impl RecordingNotifier {
    pub fn fail_with(&self, err: RemoteError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn registrations(&self) -> Vec<(CaseRegistration, String)> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn rejections(&self) -> Vec<CaseRejection> {
        self.rejections.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), RemoteError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DownstreamNotifier for RecordingNotifier {
    async fn register_case(
        &self,
        registration: &CaseRegistration,
        file_path: &str,
    ) -> Result<(), RemoteError> {
        self.registrations
            .lock()
            .unwrap()
            .push((registration.clone(), file_path.to_string()));
        self.outcome()
    }

    async fn reject_case(&self, rejection: &CaseRejection) -> Result<(), RemoteError> {
        self.rejections.lock().unwrap().push(rejection.clone());
        self.outcome()
    }
}

/// File store double that records deletions.
#[derive(Debug, Default)]
pub struct RecordingFileStore {
    pub deleted: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl RecordingFileStore {
    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for RecordingFileStore {
    async fn delete(&self, path: &str) -> Result<(), FileStoreError> {
        if *self.failing.lock().unwrap() {
            return Err(FileStoreError::Delete {
                path: path.to_string(),
                source: io::Error::other("device busy"),
            });
        }
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub notifier: Arc<RecordingNotifier>,
    pub files: Arc<RecordingFileStore>,
    pub house: User,
    pub owner: User,
}

async fn harness_on(db: DatabaseConnection) -> Harness {
    migration::Migrator::up(&db, None).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let files = Arc::new(RecordingFileStore::default());
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier.clone())
        .file_store(files.clone())
        .build()
        .await
        .unwrap();
    let house = engine
        .register_user(NewUser::new("ADMIN-0", "Distributor").house())
        .await
        .unwrap();
    let owner = engine
        .register_user(NewUser::new("EMP-001", "Ada Lovelace").email("ada@example.com"))
        .await
        .unwrap();
    Harness {
        engine,
        db,
        notifier,
        files,
        house,
        owner,
    }
}

pub async fn harness() -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    harness_on(db).await
}

pub async fn harness_with_file_db() -> (Harness, PathBuf) {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let db = Database::connect(&url).await.unwrap();
    (harness_on(db).await, path)
}

impl Harness {
    /// Registers a unit with an attached file.
    pub async fn unit(&self, key: &str) -> String {
        self.engine
            .register_unit(
                NewUnit::new(key, serde_json::json!({"modality": "CT", "key": key}))
                    .file_path(format!("/data/{key}.dcm")),
            )
            .await
            .unwrap();
        key.to_string()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let backend = self.db.get_database_backend();
        let row = self
            .db
            .query_one(Statement::from_string(backend, sql.to_string()))
            .await
            .unwrap()
            .unwrap();
        row.try_get_by_index::<i64>(0).unwrap()
    }

    pub async fn ledger_rows(&self) -> i64 {
        self.count("SELECT COUNT(*) FROM credit_ledger").await
    }

    pub async fn ledger_rows_of(&self, category: &str) -> i64 {
        self.count(&format!(
            "SELECT COUNT(*) FROM credit_ledger WHERE category = '{category}'"
        ))
        .await
    }

    pub async fn notification_rows(&self) -> i64 {
        self.count("SELECT COUNT(*) FROM notifications").await
    }
}
