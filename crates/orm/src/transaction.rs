//! Server-side transaction scripts.
//!
//! A [`Transaction`] declares the collections it reads and writes, then
//! queues document operations through [`Transaction::collection`]. Nothing
//! is sent until [`TransactionController::start`] submits the whole script,
//! which the server runs atomically: either every operation applies or none
//! does.
//!
//! # Example
//! ```ignore
//! let mut tx = Transaction::new().write("foo_test");
//! tx.collection("foo_test")?.create_document(json!({ "test": "foo" }))?;
//!
//! let result = TransactionController::new().start(&db, &tx).await?;
//! assert_eq!(result.len(), 1);
//! ```

use {
    crate::{
        database::Database,
        document::DocumentProxy,
        error::{OrmError, OrmResult, ValidationError},
    },
    arangodb_client::{
        ArangoTransport, TransactionCollections, TransactionOperation, TransactionSpec,
    },
    serde_json::{Map, Value},
    tracing::{info, instrument},
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction {
    collections: TransactionCollections,
    operations: Vec<TransactionOperation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a collection for reading.
    pub fn read(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.collections.read.contains(&name) {
            self.collections.read.push(name);
        }
        self
    }

    /// Declare a collection for writing. Writable collections are readable too.
    pub fn write(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.collections.write.contains(&name) {
            self.collections.write.push(name);
        }
        self
    }

    pub fn collections(&self) -> &TransactionCollections {
        &self.collections
    }

    pub fn operations(&self) -> &[TransactionOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Queue operations against a declared collection.
    pub fn collection(&mut self, name: &str) -> OrmResult<TransactionCollection<'_>> {
        if !self.collections.is_declared(name) {
            return Err(OrmError::UndeclaredCollection(name.to_string()));
        }
        Ok(TransactionCollection {
            transaction: self,
            name: name.to_string(),
        })
    }

    pub fn to_spec(&self) -> TransactionSpec {
        TransactionSpec {
            collections: self.collections.clone(),
            operations: self.operations.clone(),
        }
    }
}

/// A declared collection inside a [`Transaction`]. Each call appends one
/// operation to the script and returns its position in it.
#[derive(Debug)]
pub struct TransactionCollection<'a> {
    transaction: &'a mut Transaction,
    name: String,
}

impl TransactionCollection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn queue(&mut self, op: TransactionOperation) -> OrmResult<usize> {
        if !self.transaction.collections.can_write(&self.name) {
            return Err(OrmError::ReadOnlyCollection(self.name.clone()));
        }
        self.transaction.operations.push(op);
        Ok(self.transaction.operations.len() - 1)
    }

    fn object(data: Value) -> OrmResult<Map<String, Value>> {
        match data {
            Value::Object(map) => Ok(map),
            _ => Err(ValidationError::NotAnObject {
                context: "document data".to_string(),
            }
            .into()),
        }
    }

    pub fn create_document(&mut self, data: impl Into<Value>) -> OrmResult<usize> {
        let data = Self::object(data.into())?;
        self.queue(TransactionOperation::Create {
            collection: self.name.clone(),
            data,
        })
    }

    /// Replace the attributes of the document stored under `key`.
    pub fn update_document(&mut self, key: impl Into<String>, data: impl Into<Value>) -> OrmResult<usize> {
        let data = Self::object(data.into())?;
        self.queue(TransactionOperation::Update {
            collection: self.name.clone(),
            key: key.into(),
            data,
        })
    }

    pub fn delete_document(&mut self, key: impl Into<String>) -> OrmResult<usize> {
        self.queue(TransactionOperation::Delete {
            collection: self.name.clone(),
            key: key.into(),
        })
    }
}

/// One entry per queued operation, in script order. Creates and updates
/// yield the stored document, deletes yield null.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionResult {
    entries: Vec<Value>,
}

impl TransactionResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Document produced by the operation at `index`, if it produced one.
    pub fn document(&self, index: usize) -> OrmResult<Option<DocumentProxy>> {
        match self.entries.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(entry) => DocumentProxy::from_value(entry.clone()).map(Some),
        }
    }

    /// Every document the script produced, in order.
    pub fn documents(&self) -> OrmResult<Vec<DocumentProxy>> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_null())
            .map(|entry| DocumentProxy::from_value(entry.clone()))
            .collect()
    }
}

/// Submits transaction scripts.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionController;

impl TransactionController {
    pub fn new() -> Self {
        Self
    }

    #[instrument(
        name = "arangodb.transaction.start",
        skip(self, db, transaction),
        fields(operations = transaction.operations.len()),
        err
    )]
    pub async fn start<T: ArangoTransport>(
        &self,
        db: &Database<T>,
        transaction: &Transaction,
    ) -> OrmResult<TransactionResult> {
        if transaction.is_empty() {
            return Err(OrmError::EmptyTransaction);
        }
        let spec = transaction.to_spec();
        spec.validate()?;

        let entries = db.transport().run_transaction(db.spec(), &spec).await?;
        info!("transaction applied {} operations", entries.len());
        Ok(TransactionResult { entries })
    }
}
