//! Transaction scripts against the in-memory store.

use arangodb_orm::prelude::*;
use arangodb_orm::testing::TestDb;
use pretty_assertions::assert_eq;
use serde_json::json;

async fn collection(test: &TestDb, name: &str) -> anyhow::Result<()> {
    test.create_collection(name, CollectionKind::Document).await?;
    Ok(())
}

#[tokio::test]
async fn create_in_transaction_is_retrievable() -> anyhow::Result<()> {
    let test = TestDb::new("tx_create");
    collection(&test, "foo_test").await?;

    let mut tx = Transaction::new().write("foo_test");
    tx.collection("foo_test")?
        .create_document(json!({ "test": "foo" }))?;

    let result = TransactionController::new().start(test.db(), &tx).await?;
    assert_eq!(result.len(), 1);

    let found = SimpleQuery::get_by_example(test.db(), "foo_test", &json!({ "test": "foo" })).await?;
    assert_eq!(Some(found), result.document(0)?);
    Ok(())
}

#[tokio::test]
async fn mixed_script_applies_in_order() -> anyhow::Result<()> {
    let test = TestDb::new("tx_mixed");
    collection(&test, "accounts").await?;
    collection(&test, "audit").await?;

    let mut seed = DocumentProxy::local("accounts");
    seed["_key"] = json!("alice");
    seed["balance"] = json!(10);
    seed.save(test.db()).await?;

    let mut tx = Transaction::new().write("accounts").write("audit");
    tx.collection("accounts")?
        .update_document("alice", json!({ "balance": 5 }))?;
    tx.collection("audit")?
        .create_document(json!({ "who": "alice", "delta": -5 }))?;

    let result = TransactionController::new().start(test.db(), &tx).await?;
    assert_eq!(result.len(), 2);
    assert_eq!(result.documents()?.len(), 2);

    let alice = SimpleQuery::get_by_example(test.db(), "accounts", &json!({ "_key": "alice" })).await?;
    assert_eq!(alice["balance"], json!(5));
    assert_eq!(test.count("audit").await?, 1);
    Ok(())
}

#[tokio::test]
async fn delete_entry_is_null() -> anyhow::Result<()> {
    let test = TestDb::new("tx_delete");
    collection(&test, "foo_test").await?;

    let mut doc = DocumentProxy::local("foo_test");
    doc["x"] = json!(1);
    doc.save(test.db()).await?;
    let key = doc.key().expect("saved key").to_string();

    let mut tx = Transaction::new().write("foo_test");
    tx.collection("foo_test")?.delete_document(key)?;

    let result = TransactionController::new().start(test.db(), &tx).await?;
    assert_eq!(result.entries(), &[serde_json::Value::Null]);
    assert_eq!(result.document(0)?, None);
    assert_eq!(test.count("foo_test").await?, 0);
    Ok(())
}

#[tokio::test]
async fn undeclared_collection_errors_before_submit() -> anyhow::Result<()> {
    let mut tx = Transaction::new().write("foo_test").read("lookup");
    assert!(matches!(
        tx.collection("other"),
        Err(OrmError::UndeclaredCollection(_))
    ));
    assert!(matches!(
        tx.collection("lookup")?.delete_document("k"),
        Err(OrmError::ReadOnlyCollection(_))
    ));
    assert!(tx.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_script_leaves_no_trace() -> anyhow::Result<()> {
    let test = TestDb::new("tx_abort");
    collection(&test, "foo_test").await?;

    let mut tx = Transaction::new().write("foo_test");
    tx.collection("foo_test")?
        .create_document(json!({ "_key": "dup", "n": 1 }))?;
    tx.collection("foo_test")?
        .create_document(json!({ "_key": "dup", "n": 2 }))?;

    let err = TransactionController::new().start(test.db(), &tx).await.unwrap_err();
    assert!(matches!(err, OrmError::TransactionAborted(_)));
    assert_eq!(test.count("foo_test").await?, 0);
    Ok(())
}
