//! ArangoDB client plumbing.
//!
//! Wire types for documents, queries, traversals and transaction scripts, the
//! [`ArangoTransport`] trait the object-mapping layer talks to, and an HTTP
//! implementation of it.

pub mod document;
pub mod err;
#[cfg(not(target_arch = "wasm32"))]
mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod query;
mod spec;
pub mod transaction;
pub mod traversal;
mod r#trait;

pub use {
    document::{CollectionInfo, CollectionKind, DocumentId, DocumentRecord},
    err::{ClientError, ClientResult},
    query::{
        AqlQuery, Comparison, FieldPath, FilterSpec, LimitSpec, Operand, QuerySpec, SortDirection,
        SortSpec,
    },
    r#trait::ArangoTransport,
    spec::{DatabaseSpec, SYSTEM_DATABASE},
    transaction::{TransactionCollections, TransactionOperation, TransactionSpec},
    traversal::{TraversalDirection, TraversalSpec},
};

#[cfg(not(target_arch = "wasm32"))]
pub use http::{HttpConfig, HttpTransport, UrlBuilder, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryStore;
