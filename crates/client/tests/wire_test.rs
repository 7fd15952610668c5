//! Wire shapes the HTTP transport sends, checked through the public API.

use arangodb_client::{
    Comparison, DocumentId, DocumentRecord, FieldPath, FilterSpec, LimitSpec, Operand, QuerySpec,
    SortDirection, SortSpec, TransactionCollections, TransactionOperation, TransactionSpec,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};

#[test]
fn join_query_renders_with_bind_vars() {
    let spec = QuerySpec {
        collections: vec!["books".into(), "authors".into()],
        filters: vec![
            FilterSpec {
                left: FieldPath::new("books", "author"),
                op: Comparison::Eq,
                right: Operand::Field(FieldPath::new("authors", "_key")),
            },
            FilterSpec {
                left: FieldPath::new("books", "year"),
                op: Comparison::Ge,
                right: Operand::Value(json!(1965)),
            },
        ],
        sort: vec![SortSpec {
            field: FieldPath::new("books", "year"),
            direction: SortDirection::Desc,
        }],
        limit: Some(LimitSpec {
            offset: 0,
            count: 5,
        }),
        returning: 1,
    };

    let aql = spec.to_aql().unwrap();
    assert_eq!(
        aql.query,
        "FOR doc0 IN @@c0\n\
         FOR doc1 IN @@c1\n\
         FILTER doc0[@a0] == doc1[@a1]\n\
         FILTER doc0[@a2] >= @v1\n\
         SORT doc0[@a3] DESC\n\
         LIMIT @offset, @count\n\
         RETURN doc1"
    );
    assert_eq!(aql.bind_vars["@c0"], json!("books"));
    assert_eq!(aql.bind_vars["@c1"], json!("authors"));
    assert_eq!(aql.bind_vars["a1"], json!("_key"));
    assert_eq!(aql.bind_vars["v1"], json!(1965));
    assert_eq!(aql.bind_vars["count"], json!(5));
}

#[test]
fn transaction_body_carries_operations_as_params() {
    let mut data = Map::new();
    data.insert("test".into(), json!("foo"));
    let spec = TransactionSpec {
        collections: TransactionCollections {
            read: vec![],
            write: vec!["foo_test".into()],
        },
        operations: vec![TransactionOperation::Create {
            collection: "foo_test".into(),
            data,
        }],
    };

    let body = spec.to_request_body().unwrap();
    assert_eq!(body["collections"]["write"], json!(["foo_test"]));
    assert_eq!(
        body["params"]["operations"],
        json!([{ "op": "create", "collection": "foo_test", "data": { "test": "foo" } }])
    );
    assert!(body["action"].as_str().unwrap().starts_with("function"));
}

#[test]
fn edge_record_keeps_system_attributes() {
    let record = DocumentRecord::from_value(json!({
        "_id": "links/1",
        "_key": "1",
        "_rev": "_r1",
        "_from": "a/1",
        "_to": "b/2",
        "weight": 3
    }))
    .unwrap();
    assert!(record.is_edge());
    assert_eq!(record.from, Some(DocumentId::new("a", "1")));
    assert_eq!(record.fields.get("weight"), Some(&json!(3)));
    assert_eq!(record.into_value()["_to"], json!("b/2"));
}
