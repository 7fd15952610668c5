//! Schemaless document handles.
//!
//! A [`DocumentProxy`] is one attribute map plus the collection it belongs
//! to. System attributes (`_id`, `_key`, `_rev`, and `_from`/`_to` on edges)
//! live in the same map as user attributes, so `get("_key")` and
//! `proxy["_key"]` read the same value as [`DocumentProxy::key`].

use {
    crate::{
        database::Database,
        error::{OrmError, OrmResult, ValidationError},
    },
    arangodb_client::{
        document::{user_fields, FROM_FIELD, ID_FIELD, KEY_FIELD, REV_FIELD, TO_FIELD},
        ArangoTransport, DocumentId, DocumentRecord,
    },
    serde_json::{Map, Value},
    std::{
        hash::{Hash, Hasher},
        ops::{Deref, DerefMut, Index, IndexMut},
    },
    tracing::{debug, instrument},
};

static NULL: Value = Value::Null;

#[derive(Clone, Debug)]
pub struct DocumentProxy {
    collection: String,
    loaded: bool,
    attributes: Map<String, Value>,
}

impl DocumentProxy {
    /// Handle to a stored document. Nothing is fetched until first access
    /// through [`load`](Self::load) or [`attribute`](Self::attribute).
    pub fn new(id: DocumentId) -> Self {
        let mut attributes = Map::new();
        attributes.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        attributes.insert(KEY_FIELD.to_string(), Value::String(id.key().to_string()));
        Self {
            collection: id.collection().to_string(),
            loaded: false,
            attributes,
        }
    }

    /// A fresh document that exists only locally until saved.
    pub fn local(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            loaded: true,
            attributes: Map::new(),
        }
    }

    pub fn from_record(record: DocumentRecord) -> Self {
        let collection = record.id.collection().to_string();
        let attributes = match record.into_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            collection,
            loaded: true,
            attributes,
        }
    }

    /// Parse a raw row returned by a query, traversal or transaction.
    pub fn from_value(value: Value) -> OrmResult<Self> {
        Ok(Self::from_record(DocumentRecord::from_value(value)?))
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn key(&self) -> Option<&str> {
        self.attributes.get(KEY_FIELD).and_then(Value::as_str)
    }

    pub fn rev(&self) -> Option<&str> {
        self.attributes.get(REV_FIELD).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<DocumentId> {
        self.key().map(|key| DocumentId::new(&self.collection, key))
    }

    /// A document with a revision has been stored at least once.
    pub fn is_persisted(&self) -> bool {
        self.rev().is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Fetch the stored attributes once. Attributes set locally before the
    /// load are kept over the fetched ones.
    #[instrument(
        name = "arangodb.document.load",
        skip(self, db),
        fields(collection = %self.collection, key = ?self.key()),
        err
    )]
    pub async fn load<T: ArangoTransport>(&mut self, db: &Database<T>) -> OrmResult<()> {
        if self.loaded {
            return Ok(());
        }
        let id = self
            .id()
            .ok_or_else(|| OrmError::NotPersisted(format!("document in {}", self.collection)))?;
        let record = db.transport().get_document(db.spec(), &id).await?;
        let fetched = Self::from_record(record);
        for (name, value) in fetched.attributes {
            if is_meta(&name) || !self.attributes.contains_key(&name) {
                self.attributes.insert(name, value);
            }
        }
        self.loaded = true;
        Ok(())
    }

    /// Read one attribute, loading the document first if needed.
    pub async fn attribute<T: ArangoTransport>(
        &mut self,
        db: &Database<T>,
        key: &str,
    ) -> OrmResult<Option<&Value>> {
        self.load(db).await?;
        Ok(self.attributes.get(key))
    }

    /// Create the document if it has never been stored, otherwise replace it.
    #[instrument(
        name = "arangodb.document.save",
        skip(self, db),
        fields(collection = %self.collection, key = ?self.key()),
        err
    )]
    pub async fn save<T: ArangoTransport>(&mut self, db: &Database<T>) -> OrmResult<()> {
        self.load(db).await?;

        let mut data = user_fields(&self.attributes);
        for system in [FROM_FIELD, TO_FIELD] {
            if let Some(value) = self.attributes.get(system) {
                data.insert(system.to_string(), value.clone());
            }
        }

        let record = match self.id().filter(|_| self.is_persisted()) {
            Some(id) => {
                db.transport()
                    .update_document(db.spec(), &id, data, None)
                    .await?
            }
            None => {
                if let Some(key) = self.attributes.get(KEY_FIELD) {
                    data.insert(KEY_FIELD.to_string(), key.clone());
                }
                db.transport()
                    .create_document(db.spec(), &self.collection, data)
                    .await?
            }
        };

        debug!("saved document {}", record.id);
        *self = Self::from_record(record);
        Ok(())
    }

    #[instrument(
        name = "arangodb.document.delete",
        skip(self, db),
        fields(collection = %self.collection, key = ?self.key()),
        err
    )]
    pub async fn delete<T: ArangoTransport>(self, db: &Database<T>) -> OrmResult<()> {
        let id = self
            .id()
            .ok_or_else(|| OrmError::NotPersisted(format!("document in {}", self.collection)))?;
        db.transport().delete_document(db.spec(), &id).await?;
        Ok(())
    }
}

fn is_meta(name: &str) -> bool {
    matches!(name, ID_FIELD | KEY_FIELD | REV_FIELD)
}

impl Index<&str> for DocumentProxy {
    type Output = Value;

    /// Missing attributes read as null.
    fn index(&self, key: &str) -> &Value {
        self.attributes.get(key).unwrap_or(&NULL)
    }
}

impl IndexMut<&str> for DocumentProxy {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.attributes.entry(key.to_string()).or_insert(Value::Null)
    }
}

/// Documents are equal when they have the same collection and key.
impl PartialEq for DocumentProxy {
    fn eq(&self, other: &Self) -> bool {
        self.collection == other.collection && self.key() == other.key()
    }
}

impl Eq for DocumentProxy {}

impl Hash for DocumentProxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.collection.hash(state);
        self.key().hash(state);
    }
}

/// A document of an edge collection, linking two vertices.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    document: DocumentProxy,
}

impl Edge {
    pub fn new(collection: impl Into<String>, from: &DocumentId, to: &DocumentId) -> Self {
        let mut document = DocumentProxy::local(collection);
        document.set(FROM_FIELD, from.to_string());
        document.set(TO_FIELD, to.to_string());
        Self { document }
    }

    /// Wrap a document that carries both endpoints.
    pub fn from_document(document: DocumentProxy) -> OrmResult<Self> {
        let edge = Self { document };
        if edge.from_vertex().is_none() || edge.to_vertex().is_none() {
            return Err(ValidationError::MissingEdgeEnds {
                model: edge.document.collection,
            }
            .into());
        }
        Ok(edge)
    }

    pub fn from_vertex(&self) -> Option<DocumentId> {
        endpoint(&self.document, FROM_FIELD)
    }

    pub fn to_vertex(&self) -> Option<DocumentId> {
        endpoint(&self.document, TO_FIELD)
    }

    pub fn into_document(self) -> DocumentProxy {
        self.document
    }
}

fn endpoint(document: &DocumentProxy, name: &str) -> Option<DocumentId> {
    document
        .get(name)
        .and_then(Value::as_str)
        .and_then(|raw| DocumentId::parse(raw).ok())
}

impl Deref for Edge {
    type Target = DocumentProxy;

    fn deref(&self) -> &DocumentProxy {
        &self.document
    }
}

impl DerefMut for Edge {
    fn deref_mut(&mut self) -> &mut DocumentProxy {
        &mut self.document
    }
}
