//! ArangoDB object mapping.
//!
//! Models bind to collections through a per-database registry, instances
//! validate their declared fields before every write, and references
//! between instances resolve lazily. On top of that sit a multi-collection
//! query builder, lookups by example, graph traversal and atomic
//! transaction scripts.
//!
//! # Example
//! ```ignore
//! use arangodb_orm::prelude::*;
//!
//! struct Book;
//!
//! impl CollectionModel for Book {
//!     fn fields() -> Vec<FieldDescriptor> {
//!         vec![FieldDescriptor::scalar("title").required()]
//!     }
//! }
//!
//! let db = Database::new(HttpTransport::local_node()?, "library");
//! let books = db.register::<Book>().await?;
//!
//! let mut book = books.new_instance();
//! book.set("title", "Dune")?;
//! book.save(&db).await?;
//!
//! let sorted = books
//!     .objects()
//!     .query()
//!     .order_by("title", SortDirection::Asc)
//!     .execute_as::<Book, _>(&db)
//!     .await?;
//! ```

mod database;
mod document;
mod error;
mod field;
mod manager;
mod model;
mod query;
mod reference;
mod registry;
mod simple;
mod transaction;
mod traversal;

pub mod prelude;

/// Test helpers backed by the in-memory store.
///
/// Enable with `#[cfg(test)]` or when the `testing` feature is enabled.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use database::Database;
pub use document::{DocumentProxy, Edge};
pub use error::{OrmError, OrmResult, ValidationError};
pub use field::{FieldDescriptor, FieldType, FieldValue};
pub use manager::Manager;
pub use model::{CollectionModel, Instance};
pub use query::Query;
pub use reference::ForeignRef;
pub use registry::{ModelBinding, ModelHandle, ModelRegistry};
pub use simple::SimpleQuery;
pub use transaction::{Transaction, TransactionCollection, TransactionController, TransactionResult};
pub use traversal::Traverser;

// Re-export commonly used types from the client
pub use arangodb_client::{
    ArangoTransport, ClientError, CollectionInfo, CollectionKind, Comparison, DatabaseSpec,
    DocumentId, FieldPath, Operand, SortDirection, TraversalDirection,
};
