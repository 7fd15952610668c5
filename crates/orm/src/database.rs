//! Explicit database context.
//!
//! Every ORM operation takes a [`Database`]: the transport to talk through,
//! the database to address, and the models registered against it. There is
//! no process-wide current database, so several databases (or several
//! transports) can be used side by side.
//!
//! # Example
//! ```ignore
//! use arangodb_orm::prelude::*;
//!
//! let db = Database::new(HttpTransport::local_node()?, "library");
//! let books = db.register::<Book>().await?;
//!
//! let mut book = books.new_instance();
//! book.set("title", "Dune")?;
//! book.save(&db).await?;
//! ```

use {
    crate::{
        error::{OrmError, OrmResult},
        model::CollectionModel,
        registry::{ModelHandle, ModelRegistry},
    },
    arangodb_client::{ArangoTransport, DatabaseSpec},
    std::fmt,
};

#[cfg(not(target_arch = "wasm32"))]
use arangodb_client::{HttpConfig, HttpTransport};

pub struct Database<T> {
    transport: T,
    spec: DatabaseSpec,
    registry: ModelRegistry,
}

impl<T: ArangoTransport> Database<T> {
    pub fn new(transport: T, spec: impl Into<DatabaseSpec>) -> Self {
        Self {
            transport,
            spec: spec.into(),
            registry: ModelRegistry::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn spec(&self) -> &DatabaseSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Register `M`, creating its collection on first use.
    pub async fn register<M: CollectionModel>(&self) -> OrmResult<ModelHandle<M>> {
        let binding = self.registry.init::<M, T>(self).await?;
        Ok(ModelHandle::new(binding))
    }

    /// Handle to an already registered model.
    pub fn model<M: CollectionModel>(&self) -> OrmResult<ModelHandle<M>> {
        self.registry
            .get::<M>()
            .map(ModelHandle::new)
            .ok_or(OrmError::NotRegistered(M::type_name()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Database<HttpTransport> {
    /// Connect over HTTP.
    pub fn connect(config: HttpConfig, spec: impl Into<DatabaseSpec>) -> OrmResult<Self> {
        Ok(Self::new(HttpTransport::new(config)?, spec))
    }
}

impl<T> fmt::Debug for Database<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("spec", &self.spec)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::FieldDescriptor, testing::TestDb};
    use arangodb_client::MemoryStore;
    use std::sync::Arc;

    struct Widget;

    impl CollectionModel for Widget {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::scalar("size")]
        }
    }

    #[test]
    fn unregistered_model_is_reported() {
        let test = TestDb::new("database_unregistered");
        assert!(matches!(
            test.db().model::<Widget>(),
            Err(OrmError::NotRegistered("Widget"))
        ));
    }

    #[tokio::test]
    async fn registries_are_per_database() {
        let store = Arc::new(MemoryStore::new());
        let first = Database::new(store.clone(), "first");
        let second = Database::new(store, "second");

        first.register::<Widget>().await.unwrap();
        assert!(first.model::<Widget>().is_ok());
        assert!(second.model::<Widget>().is_err());
    }

    #[test]
    fn connect_builds_an_http_context() {
        let db = Database::connect(HttpConfig::default(), "library").unwrap();
        assert_eq!(db.name(), "library");
    }
}
