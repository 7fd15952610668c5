use {
    crate::{
        document::{CollectionInfo, CollectionKind, DocumentId, DocumentRecord},
        err::ClientResult,
        query::QuerySpec,
        spec::DatabaseSpec,
        traversal::TraversalSpec,
        transaction::TransactionSpec,
    },
    async_trait::async_trait,
    serde_json::{Map, Value},
};

/// Request/response operations the object-mapping layer needs from a store.
///
/// Every method is one round trip. Implementations surface `NotFound`,
/// `AlreadyExists` and `Conflict` as their own error kinds and never retry.
#[async_trait]
pub trait ArangoTransport: Send + Sync {
    async fn create_collection(
        &self,
        db: &DatabaseSpec,
        name: &str,
        kind: CollectionKind,
    ) -> ClientResult<CollectionInfo>;

    async fn get_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<CollectionInfo>;

    async fn drop_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<()>;

    /// Store a new document. `data` may carry `_key` (and `_from`/`_to` for edges).
    async fn create_document(
        &self,
        db: &DatabaseSpec,
        collection: &str,
        data: Map<String, Value>,
    ) -> ClientResult<DocumentRecord>;

    async fn get_document(&self, db: &DatabaseSpec, id: &DocumentId)
        -> ClientResult<DocumentRecord>;

    /// Replace the user attributes of a document. With `if_revision` set the
    /// update only applies while the stored revision still matches.
    async fn update_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
        data: Map<String, Value>,
        if_revision: Option<&str>,
    ) -> ClientResult<DocumentRecord>;

    async fn delete_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<()>;

    async fn run_query(&self, db: &DatabaseSpec, spec: &QuerySpec) -> ClientResult<Vec<Value>>;

    async fn run_traversal(
        &self,
        db: &DatabaseSpec,
        spec: &TraversalSpec,
    ) -> ClientResult<Vec<Value>>;

    /// Execute the script atomically; one result per operation, in order.
    async fn run_transaction(
        &self,
        db: &DatabaseSpec,
        spec: &TransactionSpec,
    ) -> ClientResult<Vec<Value>>;
}

#[async_trait]
impl<T: ArangoTransport + ?Sized> ArangoTransport for std::sync::Arc<T> {
    async fn create_collection(
        &self,
        db: &DatabaseSpec,
        name: &str,
        kind: CollectionKind,
    ) -> ClientResult<CollectionInfo> {
        (**self).create_collection(db, name, kind).await
    }

    async fn get_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<CollectionInfo> {
        (**self).get_collection(db, name).await
    }

    async fn drop_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<()> {
        (**self).drop_collection(db, name).await
    }

    async fn create_document(
        &self,
        db: &DatabaseSpec,
        collection: &str,
        data: Map<String, Value>,
    ) -> ClientResult<DocumentRecord> {
        (**self).create_document(db, collection, data).await
    }

    async fn get_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
    ) -> ClientResult<DocumentRecord> {
        (**self).get_document(db, id).await
    }

    async fn update_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
        data: Map<String, Value>,
        if_revision: Option<&str>,
    ) -> ClientResult<DocumentRecord> {
        (**self).update_document(db, id, data, if_revision).await
    }

    async fn delete_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<()> {
        (**self).delete_document(db, id).await
    }

    async fn run_query(&self, db: &DatabaseSpec, spec: &QuerySpec) -> ClientResult<Vec<Value>> {
        (**self).run_query(db, spec).await
    }

    async fn run_traversal(
        &self,
        db: &DatabaseSpec,
        spec: &TraversalSpec,
    ) -> ClientResult<Vec<Value>> {
        (**self).run_traversal(db, spec).await
    }

    async fn run_transaction(
        &self,
        db: &DatabaseSpec,
        spec: &TransactionSpec,
    ) -> ClientResult<Vec<Value>> {
        (**self).run_transaction(db, spec).await
    }
}
