//! Prelude for convenient ORM imports.
//!
//! # Example
//! ```ignore
//! use arangodb_orm::prelude::*;
//!
//! let db = Database::new(HttpTransport::local_node()?, "library");
//! let books = db.register::<Book>().await?;
//! let all = books.objects().all(&db).await?;
//! ```

pub use crate::{
    CollectionModel, Database, DocumentProxy, Edge, FieldDescriptor, FieldType, FieldValue,
    ForeignRef, Instance, Manager, ModelHandle, OrmError, OrmResult, Query, SimpleQuery,
    Transaction, TransactionController, TransactionResult, Traverser, ValidationError,
};

pub use arangodb_client::{
    ArangoTransport, CollectionKind, Comparison, DatabaseSpec, DocumentId, FieldPath, Operand,
    SortDirection, TraversalDirection,
};

#[cfg(not(target_arch = "wasm32"))]
pub use arangodb_client::{HttpConfig, HttpTransport};
