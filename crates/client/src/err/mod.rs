use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by a transport.
///
/// `NotFound` and `AlreadyExists` are recoverable conditions callers branch on;
/// they must never be folded into `Server` or `Http`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Revision precondition failed on update.
    #[error("revision conflict on {id}: expected {expected}")]
    Conflict { id: String, expected: String },

    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("invalid document id '{0}', expected 'collection/key'")]
    InvalidId(String),

    #[error("server error {code} (errorNum {error_num}): {message}")]
    Server {
        code: u16,
        error_num: u32,
        message: String,
    },

    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClientError::AlreadyExists(_))
    }
}

/// Error document returned by the server alongside a non-2xx status.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub error_num: u32,
    #[serde(default)]
    pub error_message: String,
}

/// Server error numbers the client distinguishes.
pub mod error_num {
    pub const CONFLICT: u32 = 1200;
    pub const DOCUMENT_NOT_FOUND: u32 = 1202;
    pub const COLLECTION_NOT_FOUND: u32 = 1203;
    pub const DUPLICATE_NAME: u32 = 1207;
    pub const UNIQUE_CONSTRAINT_VIOLATED: u32 = 1210;
    pub const QUERY_PARSE: u32 = 1501;
}

/// What kind of request produced an error body, used to pick the error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Create,
    Read,
    Update,
    Delete,
    Query,
    Transaction,
}

impl ServerErrorBody {
    /// Map a server error into the client taxonomy.
    pub fn into_client_error(self, status: u16, kind: RequestKind, subject: &str) -> ClientError {
        let message = if self.error_message.is_empty() {
            subject.to_string()
        } else {
            self.error_message
        };

        if kind == RequestKind::Transaction {
            return ClientError::TransactionAborted(message);
        }

        match (self.error_num, status) {
            (error_num::DOCUMENT_NOT_FOUND | error_num::COLLECTION_NOT_FOUND, _) | (_, 404) => {
                ClientError::NotFound(subject.to_string())
            }
            (error_num::DUPLICATE_NAME | error_num::UNIQUE_CONSTRAINT_VIOLATED, _) => {
                ClientError::AlreadyExists(subject.to_string())
            }
            (_, 409) if kind == RequestKind::Create => ClientError::AlreadyExists(subject.to_string()),
            (error_num::CONFLICT, _) | (_, 412) => ClientError::Conflict {
                id: subject.to_string(),
                expected: message,
            },
            (error_num::QUERY_PARSE, _) | (_, 400) if kind == RequestKind::Query => {
                ClientError::MalformedQuery(message)
            }
            (num, code) => ClientError::Server {
                code: if self.code == 0 { code } else { self.code },
                error_num: num,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: u16, error_num: u32) -> ServerErrorBody {
        ServerErrorBody {
            code,
            error_num,
            error_message: "boom".to_string(),
        }
    }

    #[test]
    fn duplicate_collection_is_already_exists() {
        let err = body(409, error_num::DUPLICATE_NAME).into_client_error(409, RequestKind::Create, "foo");
        assert!(err.is_already_exists());
    }

    #[test]
    fn missing_document_is_not_found() {
        let err = body(404, error_num::DOCUMENT_NOT_FOUND).into_client_error(404, RequestKind::Read, "foo/1");
        assert!(err.is_not_found());
    }

    #[test]
    fn query_parse_error_is_malformed_not_missing() {
        let err = body(400, error_num::QUERY_PARSE).into_client_error(400, RequestKind::Query, "cursor");
        assert!(matches!(err, ClientError::MalformedQuery(_)));
    }

    #[test]
    fn transaction_failures_are_aggregated() {
        let err = body(404, error_num::DOCUMENT_NOT_FOUND).into_client_error(404, RequestKind::Transaction, "tx");
        assert!(matches!(err, ClientError::TransactionAborted(_)));
    }

    #[test]
    fn unknown_errors_keep_server_details() {
        let err = body(500, 4).into_client_error(500, RequestKind::Read, "foo/1");
        match err {
            ClientError::Server { code, error_num, .. } => {
                assert_eq!(code, 500);
                assert_eq!(error_num, 4);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
