//! Error taxonomy for ORM operations.

use arangodb_client::{ClientError, CollectionKind};
use thiserror::Error;

pub type OrmResult<T> = Result<T, OrmError>;

/// Field-scoped failures detected locally, before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{model}.{field} is required but not set")]
    MissingField { model: String, field: String },

    #[error("{model}.{field} references an instance that has not been saved")]
    UnsavedReference { model: String, field: String },

    #[error("{model} has no field named '{field}'")]
    UnknownField { model: String, field: String },

    #[error("{model}.{field} expects {expected}")]
    TypeMismatch {
        model: String,
        field: String,
        expected: String,
    },

    #[error("{model} is an edge model and needs both endpoints set")]
    MissingEdgeEnds { model: String },

    #[error("{context} must be a JSON object")]
    NotAnObject { context: String },
}

#[derive(Debug, Error)]
pub enum OrmError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("collection '{0}' is not declared by the transaction")]
    UndeclaredCollection(String),

    #[error("collection '{0}' is declared read-only by the transaction")]
    ReadOnlyCollection(String),

    #[error("transaction has no operations")]
    EmptyTransaction,

    #[error("model {0} is not registered with this database")]
    NotRegistered(&'static str),

    #[error("collection '{collection}' is {found:?}, model {model} expects {expected:?}")]
    CollectionKindMismatch {
        model: &'static str,
        collection: String,
        expected: CollectionKind,
        found: CollectionKind,
    },

    #[error("reference {id} does not point into the collection of {model}")]
    ReferenceMismatch { id: String, model: &'static str },

    #[error("{0} has not been saved yet")]
    NotPersisted(String),

    /// Transport failures, unchanged.
    #[error(transparent)]
    Transport(ClientError),
}

impl OrmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrmError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, OrmError::Validation(_))
    }
}

impl From<ClientError> for OrmError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(what) => OrmError::NotFound(what),
            ClientError::AlreadyExists(what) => OrmError::AlreadyExists(what),
            ClientError::MalformedQuery(message) => OrmError::MalformedQuery(message),
            ClientError::TransactionAborted(message) => OrmError::TransactionAborted(message),
            other => OrmError::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_kinds_are_lifted() {
        assert!(OrmError::from(ClientError::NotFound("x".into())).is_not_found());
        assert!(matches!(
            OrmError::from(ClientError::AlreadyExists("x".into())),
            OrmError::AlreadyExists(_)
        ));
        assert!(matches!(
            OrmError::from(ClientError::MalformedQuery("x".into())),
            OrmError::MalformedQuery(_)
        ));
    }

    #[test]
    fn other_client_errors_pass_through() {
        let err = OrmError::from(ClientError::Conflict {
            id: "a/1".into(),
            expected: "_r1".into(),
        });
        assert!(matches!(err, OrmError::Transport(ClientError::Conflict { .. })));
    }

    #[test]
    fn validation_errors_name_the_field() {
        let err = ValidationError::MissingField {
            model: "TestModel".into(),
            field: "test_field".into(),
        };
        assert_eq!(err.to_string(), "TestModel.test_field is required but not set");
    }
}
