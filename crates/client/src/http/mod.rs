//! HTTP transport against the server's REST API

mod client;
mod collection;
mod cursor;
mod document;
mod response;
mod url_builder;

pub use client::{HttpConfig, HttpTransport, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
pub use url_builder::UrlBuilder;

use {
    crate::{
        document::{CollectionInfo, CollectionKind, DocumentId, DocumentRecord},
        err::ClientResult,
        query::QuerySpec,
        spec::DatabaseSpec,
        transaction::TransactionSpec,
        traversal::TraversalSpec,
        ArangoTransport,
    },
    async_trait::async_trait,
    serde_json::{Map, Value},
};

#[async_trait]
impl ArangoTransport for HttpTransport {
    async fn create_collection(
        &self,
        db: &DatabaseSpec,
        name: &str,
        kind: CollectionKind,
    ) -> ClientResult<CollectionInfo> {
        HttpTransport::create_collection(self, db, name, kind).await
    }

    async fn get_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<CollectionInfo> {
        HttpTransport::get_collection(self, db, name).await
    }

    async fn drop_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<()> {
        HttpTransport::drop_collection(self, db, name).await
    }

    async fn create_document(
        &self,
        db: &DatabaseSpec,
        collection: &str,
        data: Map<String, Value>,
    ) -> ClientResult<DocumentRecord> {
        HttpTransport::create_document(self, db, collection, data).await
    }

    async fn get_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
    ) -> ClientResult<DocumentRecord> {
        HttpTransport::get_document(self, db, id).await
    }

    async fn update_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
        data: Map<String, Value>,
        if_revision: Option<&str>,
    ) -> ClientResult<DocumentRecord> {
        HttpTransport::update_document(self, db, id, data, if_revision).await
    }

    async fn delete_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<()> {
        HttpTransport::delete_document(self, db, id).await
    }

    async fn run_query(&self, db: &DatabaseSpec, spec: &QuerySpec) -> ClientResult<Vec<Value>> {
        HttpTransport::run_query(self, db, spec).await
    }

    async fn run_traversal(
        &self,
        db: &DatabaseSpec,
        spec: &TraversalSpec,
    ) -> ClientResult<Vec<Value>> {
        HttpTransport::run_traversal(self, db, spec).await
    }

    async fn run_transaction(
        &self,
        db: &DatabaseSpec,
        spec: &TransactionSpec,
    ) -> ClientResult<Vec<Value>> {
        HttpTransport::run_transaction(self, db, spec).await
    }
}
