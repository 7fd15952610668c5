//! Test helpers backed by the in-memory store.
//!
//! # Example
//! ```ignore
//! use arangodb_orm::testing::TestDb;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let test = TestDb::new("my_test");
//!     let books = test.db().register::<Book>().await.unwrap();
//!     // ...
//!     assert_eq!(test.count("Book").await.unwrap(), 0);
//! }
//! ```

use {
    crate::{database::Database, error::OrmResult},
    arangodb_client::{ArangoTransport, CollectionInfo, CollectionKind, MemoryStore},
    std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

/// Counter for generating unique test database names
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

pub type MemoryDatabase = Database<Arc<MemoryStore>>;

/// A uniquely named database on an in-memory store.
pub struct TestDb {
    store: Arc<MemoryStore>,
    db: MemoryDatabase,
}

impl TestDb {
    /// Fresh store, database named `{prefix}_{counter}`.
    pub fn new(prefix: &str) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), prefix)
    }

    /// Another database on an existing store.
    pub fn with_store(store: Arc<MemoryStore>, prefix: &str) -> Self {
        let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db = Database::new(store.clone(), format!("{}_{}", prefix, counter));
        Self { store, db }
    }

    pub fn db(&self) -> &MemoryDatabase {
        &self.db
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn db_name(&self) -> &str {
        self.db.name()
    }

    /// Create a collection directly, bypassing the model registry.
    pub async fn create_collection(&self, name: &str, kind: CollectionKind) -> OrmResult<CollectionInfo> {
        Ok(self
            .store
            .create_collection(self.db.spec(), name, kind)
            .await?)
    }

    pub async fn count(&self, collection: &str) -> OrmResult<usize> {
        Ok(self.store.count(self.db.spec(), collection).await?)
    }
}

/// Install a fmt subscriber once, honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
