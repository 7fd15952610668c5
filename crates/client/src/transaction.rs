//! Server-side transaction scripts.

use {
    crate::err::{ClientError, ClientResult},
    serde::{Deserialize, Serialize},
    serde_json::{json, Map, Value},
};

/// Collections a transaction locks, by access mode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCollections {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
}

impl TransactionCollections {
    pub fn is_declared(&self, collection: &str) -> bool {
        self.can_write(collection) || self.read.iter().any(|c| c == collection)
    }

    pub fn can_write(&self, collection: &str) -> bool {
        self.write.iter().any(|c| c == collection)
    }
}

/// One queued operation of a script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransactionOperation {
    Create {
        collection: String,
        data: Map<String, Value>,
    },
    Update {
        collection: String,
        key: String,
        data: Map<String, Value>,
    },
    Delete {
        collection: String,
        key: String,
    },
}

impl TransactionOperation {
    pub fn collection(&self) -> &str {
        match self {
            TransactionOperation::Create { collection, .. }
            | TransactionOperation::Update { collection, .. }
            | TransactionOperation::Delete { collection, .. } => collection,
        }
    }
}

/// Declared collections plus the ordered operation script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSpec {
    pub collections: TransactionCollections,
    pub operations: Vec<TransactionOperation>,
}

/// Interpreter run by the server for every script. Operations travel as
/// parameters; only this fixed text is evaluated.
const ACTION: &str = r#"function (params) {
  var db = require("@arangodb").db;
  var results = [];
  params.operations.forEach(function (op) {
    var col = db._collection(op.collection);
    if (col === null) {
      throw new Error("unknown collection " + op.collection);
    }
    if (op.op === "create") {
      results.push(col.save(op.data, { returnNew: true }).new);
    } else if (op.op === "update") {
      results.push(col.replace(op.key, op.data, { returnNew: true }).new);
    } else if (op.op === "delete") {
      col.remove(op.key);
      results.push(null);
    } else {
      throw new Error("unknown operation " + op.op);
    }
  });
  return results;
}"#;

impl TransactionSpec {
    /// Every operation must target a collection declared for writing.
    pub fn validate(&self) -> ClientResult<()> {
        for op in &self.operations {
            if !self.collections.can_write(op.collection()) {
                return Err(ClientError::TransactionAborted(format!(
                    "operation on '{}' which is not declared for writing",
                    op.collection()
                )));
            }
        }
        Ok(())
    }

    /// Request body for the transaction endpoint.
    pub fn to_request_body(&self) -> ClientResult<Value> {
        self.validate()?;
        Ok(json!({
            "collections": {
                "read": self.collections.read,
                "write": self.collections.write,
            },
            "action": ACTION,
            "params": {
                "operations": serde_json::to_value(&self.operations)?,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_spec() -> TransactionSpec {
        let mut data = Map::new();
        data.insert("test".to_string(), json!("foo"));
        TransactionSpec {
            collections: TransactionCollections {
                read: vec![],
                write: vec!["foo_test".to_string()],
            },
            operations: vec![TransactionOperation::Create {
                collection: "foo_test".to_string(),
                data,
            }],
        }
    }

    #[test]
    fn operations_travel_as_params() {
        let body = create_spec().to_request_body().unwrap();
        assert_eq!(body["collections"]["write"], json!(["foo_test"]));
        assert_eq!(
            body["params"]["operations"],
            json!([{"op": "create", "collection": "foo_test", "data": {"test": "foo"}}])
        );
        assert!(!body["action"].as_str().unwrap().contains("foo_test"));
    }

    #[test]
    fn updates_replace_and_return_the_stored_document() {
        let body = create_spec().to_request_body().unwrap();
        let action = body["action"].as_str().unwrap();
        assert!(action.contains("col.replace(op.key, op.data, { returnNew: true }).new"));
        assert!(action.contains("col.save(op.data, { returnNew: true }).new"));
        assert!(!action.contains("col.update("));
    }

    #[test]
    fn rejects_operations_outside_write_set() {
        let mut spec = create_spec();
        spec.collections.write.clear();
        spec.collections.read.push("foo_test".to_string());
        assert!(matches!(
            spec.to_request_body(),
            Err(ClientError::TransactionAborted(_))
        ));
    }
}
