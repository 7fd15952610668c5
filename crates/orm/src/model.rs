//! Model declarations and their instances.

use {
    crate::{
        database::Database,
        document::DocumentProxy,
        error::{OrmError, OrmResult, ValidationError},
        field::{FieldDescriptor, FieldType, FieldValue},
        reference::{ForeignRef, Identity},
        registry::ModelBinding,
    },
    arangodb_client::{
        document::{user_fields, FROM_FIELD, TO_FIELD},
        ArangoTransport, CollectionKind, DocumentId, DocumentRecord,
    },
    serde_json::{Map, Value},
    std::{
        collections::BTreeMap,
        fmt,
        marker::PhantomData,
        sync::{Arc, OnceLock},
    },
    tracing::{debug, instrument},
};

/// A model bound to one collection.
///
/// ```ignore
/// struct Book;
///
/// impl CollectionModel for Book {
///     fn collection_name() -> Option<&'static str> {
///         Some("books")
///     }
///
///     fn fields() -> Vec<FieldDescriptor> {
///         vec![
///             FieldDescriptor::scalar("title").required(),
///             FieldDescriptor::reference::<Author>("author"),
///         ]
///     }
/// }
/// ```
pub trait CollectionModel: Send + Sync + 'static {
    /// Defaults to the unqualified Rust type name. Generic models should override it.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Explicit collection name. `None` or an empty name falls back to [`type_name`](Self::type_name).
    fn collection_name() -> Option<&'static str> {
        None
    }

    fn kind() -> CollectionKind {
        CollectionKind::Document
    }

    /// Declared fields, in validation order.
    fn fields() -> Vec<FieldDescriptor>;

    fn resolved_collection_name() -> String {
        match Self::collection_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => Self::type_name().to_string(),
        }
    }
}

/// A record of model `M`.
///
/// Field values are held separately from the underlying document so they can
/// be validated before anything is written. Attributes stored on the
/// document that the model does not declare are carried through saves.
pub struct Instance<M> {
    binding: Arc<ModelBinding>,
    values: BTreeMap<String, FieldValue>,
    identity: Identity,
    document: DocumentProxy,
    _model: PhantomData<fn() -> M>,
}

impl<M: CollectionModel> Instance<M> {
    pub(crate) fn new(binding: Arc<ModelBinding>) -> Self {
        let values = binding
            .fields()
            .iter()
            .filter_map(|f| {
                f.default()
                    .map(|v| (f.name().to_string(), FieldValue::Scalar(v.clone())))
            })
            .collect();
        let document = DocumentProxy::local(binding.collection_name());
        Self {
            binding,
            values,
            identity: Arc::new(OnceLock::new()),
            document,
            _model: PhantomData,
        }
    }

    pub(crate) fn from_record(binding: &Arc<ModelBinding>, record: DocumentRecord) -> OrmResult<Self> {
        let mut values = BTreeMap::new();
        for field in binding.fields() {
            if let Some(raw) = record.fields.get(field.name()) {
                if let Some(value) = field.deserialize(binding.type_name(), raw)? {
                    values.insert(field.name().to_string(), value);
                }
            }
        }
        Ok(Self {
            binding: binding.clone(),
            values,
            identity: Arc::new(OnceLock::from(record.id.clone())),
            document: DocumentProxy::from_record(record),
            _model: PhantomData,
        })
    }

    pub fn collection(&self) -> &str {
        self.binding.collection_name()
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.identity.get()
    }

    pub fn key(&self) -> Option<&str> {
        self.id().map(DocumentId::key)
    }

    pub fn rev(&self) -> Option<&str> {
        self.document.rev()
    }

    pub fn is_saved(&self) -> bool {
        self.id().is_some()
    }

    /// The underlying document as last saved or loaded.
    pub fn document(&self) -> &DocumentProxy {
        &self.document
    }

    /// A lazy reference to this instance. It sees the id once the instance is saved.
    pub fn to_ref(&self) -> ForeignRef {
        ForeignRef::from_identity(self.identity.clone())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Scalar value of a field.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_scalar)
    }

    pub fn reference(&self, name: &str) -> Option<&ForeignRef> {
        self.get(name).and_then(FieldValue::as_reference)
    }

    fn field(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        self.binding
            .field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                model: self.binding.type_name().to_string(),
                field: name.to_string(),
            })
    }

    /// Assign a field from its wire form. Reference fields take a
    /// `collection/key` id; null unsets the field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidationError> {
        let value = value.into();
        let parsed = self.field(name)?.deserialize(self.binding.type_name(), &value)?;
        match parsed {
            Some(parsed) => {
                self.values.insert(name.to_string(), parsed);
            }
            None => {
                self.values.remove(name);
            }
        }
        Ok(())
    }

    /// Point a reference field at another instance, saved or not.
    pub fn set_reference<R: CollectionModel>(
        &mut self,
        name: &str,
        target: &Instance<R>,
    ) -> Result<(), ValidationError> {
        let field = self.field(name)?;
        match field.field_type() {
            FieldType::Reference { collection, .. } if collection == target.collection() => {}
            _ => {
                return Err(ValidationError::TypeMismatch {
                    model: self.binding.type_name().to_string(),
                    field: name.to_string(),
                    expected: format!("a reference to {}", R::type_name()),
                })
            }
        }
        self.values
            .insert(name.to_string(), FieldValue::Reference(target.to_ref()));
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    /// Set both endpoints of an edge instance.
    pub fn set_endpoints(&mut self, from: &DocumentId, to: &DocumentId) {
        self.document.set(FROM_FIELD, from.to_string());
        self.document.set(TO_FIELD, to.to_string());
    }

    /// Run every field validator in declaration order, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let model = self.binding.type_name();
        for field in self.binding.fields() {
            field.validate(model, self.values.get(field.name()))?;
        }
        if self.binding.kind() == CollectionKind::Edge
            && (self.document.get(FROM_FIELD).is_none() || self.document.get(TO_FIELD).is_none())
        {
            return Err(ValidationError::MissingEdgeEnds {
                model: model.to_string(),
            });
        }
        Ok(())
    }

    /// Validated wire form of the instance.
    pub fn to_wire(&self) -> Result<Map<String, Value>, ValidationError> {
        self.validate()?;
        let model = self.binding.type_name();
        let mut data = user_fields(self.document.attributes());
        for field in self.binding.fields() {
            data.insert(
                field.name().to_string(),
                field.serialize(model, self.values.get(field.name()))?,
            );
        }
        if self.binding.kind() == CollectionKind::Edge {
            for end in [FROM_FIELD, TO_FIELD] {
                if let Some(value) = self.document.get(end) {
                    data.insert(end.to_string(), value.clone());
                }
            }
        }
        Ok(data)
    }

    /// Validate, then create the document or replace the stored one.
    #[instrument(
        name = "arangodb.instance.save",
        skip(self, db),
        fields(model = M::type_name(), key = ?self.key()),
        err
    )]
    pub async fn save<T: ArangoTransport>(&mut self, db: &Database<T>) -> OrmResult<()> {
        self.persist(db, None).await
    }

    /// Like [`save`](Self::save), but the replace only goes through if the
    /// stored revision is still the one this instance last saw.
    #[instrument(
        name = "arangodb.instance.save_if_revision",
        skip(self, db),
        fields(model = M::type_name(), key = ?self.key()),
        err
    )]
    pub async fn save_if_revision<T: ArangoTransport>(&mut self, db: &Database<T>) -> OrmResult<()> {
        let rev = self
            .rev()
            .map(str::to_string)
            .ok_or_else(|| OrmError::NotPersisted(M::type_name().to_string()))?;
        self.persist(db, Some(rev)).await
    }

    async fn persist<T: ArangoTransport>(
        &mut self,
        db: &Database<T>,
        if_revision: Option<String>,
    ) -> OrmResult<()> {
        let data = self.to_wire()?;
        let record = match self.id() {
            Some(id) => {
                db.transport()
                    .update_document(db.spec(), id, data, if_revision.as_deref())
                    .await?
            }
            None => {
                db.transport()
                    .create_document(db.spec(), self.binding.collection_name(), data)
                    .await?
            }
        };
        debug!("saved {} as {}", M::type_name(), record.id);
        let _ = self.identity.set(record.id.clone());
        self.document = DocumentProxy::from_record(record);
        Ok(())
    }

    #[instrument(
        name = "arangodb.instance.delete",
        skip(self, db),
        fields(model = M::type_name(), key = ?self.key()),
        err
    )]
    pub async fn delete<T: ArangoTransport>(self, db: &Database<T>) -> OrmResult<()> {
        let id = self
            .id()
            .ok_or_else(|| OrmError::NotPersisted(M::type_name().to_string()))?;
        db.transport().delete_document(db.spec(), id).await?;
        Ok(())
    }
}

impl<M> Clone for Instance<M> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            values: self.values.clone(),
            identity: self.identity.clone(),
            document: self.document.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Instance<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.binding.type_name())
            .field("id", &self.identity.get())
            .field("values", &self.values)
            .finish()
    }
}
