//! Binding of models to their collections.
//!
//! Registration is idempotent: the first [`ModelRegistry::init`] for a model
//! creates its collection (or adopts an existing one of the same name) and
//! caches the binding; later calls return the cached binding without
//! touching the server.

use {
    crate::{
        database::Database,
        error::{OrmError, OrmResult},
        field::FieldDescriptor,
        manager::Manager,
        model::{CollectionModel, Instance},
    },
    arangodb_client::{ArangoTransport, ClientError, CollectionInfo, CollectionKind},
    dashmap::DashMap,
    std::{any::TypeId, fmt, marker::PhantomData, sync::Arc},
    tracing::{debug, info, instrument},
};

/// A model's resolved collection plus its field declarations.
#[derive(Debug)]
pub struct ModelBinding {
    type_name: &'static str,
    collection: CollectionInfo,
    fields: Vec<FieldDescriptor>,
}

impl ModelBinding {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn collection(&self) -> &CollectionInfo {
        &self.collection
    }

    pub fn collection_name(&self) -> &str {
        &self.collection.name
    }

    pub fn kind(&self) -> CollectionKind {
        self.collection.kind
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

/// Per-database cache of model bindings, keyed by model type.
#[derive(Default)]
pub struct ModelRegistry {
    bindings: DashMap<TypeId, Arc<ModelBinding>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<M: CollectionModel>(&self) -> Option<Arc<ModelBinding>> {
        self.bindings.get(&TypeId::of::<M>()).map(|b| b.value().clone())
    }

    pub fn is_registered<M: CollectionModel>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<M>())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind `M` to its collection, creating the collection if needed.
    ///
    /// Only an already-exists failure falls back to fetching the existing
    /// collection. Any other failure is returned as-is.
    #[instrument(
        name = "arangodb.registry.init",
        skip(self, db),
        fields(model = M::type_name(), db = %db.spec()),
        err
    )]
    pub async fn init<M: CollectionModel, T: ArangoTransport>(
        &self,
        db: &Database<T>,
    ) -> OrmResult<Arc<ModelBinding>> {
        if let Some(binding) = self.get::<M>() {
            return Ok(binding);
        }

        let name = M::resolved_collection_name();
        let info = match db
            .transport()
            .create_collection(db.spec(), &name, M::kind())
            .await
        {
            Ok(info) => {
                info!("created collection {} for {}", name, M::type_name());
                info
            }
            Err(ClientError::AlreadyExists(_)) => {
                debug!("collection {} already exists", name);
                db.transport().get_collection(db.spec(), &name).await?
            }
            Err(err) => return Err(err.into()),
        };

        if info.kind != M::kind() {
            return Err(OrmError::CollectionKindMismatch {
                model: M::type_name(),
                collection: info.name,
                expected: M::kind(),
                found: info.kind,
            });
        }

        let binding = Arc::new(ModelBinding {
            type_name: M::type_name(),
            collection: info,
            fields: M::fields(),
        });
        // a concurrent init may have won the race; keep whichever landed first
        let stored = self
            .bindings
            .entry(TypeId::of::<M>())
            .or_insert(binding)
            .value()
            .clone();
        Ok(stored)
    }

    pub(crate) fn remove<M: CollectionModel>(&self) -> Option<Arc<ModelBinding>> {
        self.bindings.remove(&TypeId::of::<M>()).map(|(_, b)| b)
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.bindings.iter().map(|b| b.value().type_name).collect();
        f.debug_struct("ModelRegistry").field("models", &names).finish()
    }
}

/// Typed access to a registered model.
pub struct ModelHandle<M> {
    binding: Arc<ModelBinding>,
    _model: PhantomData<fn() -> M>,
}

impl<M: CollectionModel> ModelHandle<M> {
    pub(crate) fn new(binding: Arc<ModelBinding>) -> Self {
        Self {
            binding,
            _model: PhantomData,
        }
    }

    pub fn binding(&self) -> &Arc<ModelBinding> {
        &self.binding
    }

    pub fn collection(&self) -> &CollectionInfo {
        self.binding.collection()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        self.binding.fields()
    }

    /// A new, unsaved instance with defaults filled in.
    pub fn new_instance(&self) -> Instance<M> {
        Instance::new(self.binding.clone())
    }

    pub fn objects(&self) -> Manager<M> {
        Manager::new(self.binding.clone())
    }

    /// Drop the model's collection and unbind the model from `db`.
    ///
    /// Instances still held by the caller keep their binding but any write
    /// through them fails once the collection is gone.
    #[instrument(
        name = "arangodb.registry.destroy",
        skip(self, db),
        fields(model = M::type_name(), collection = %self.binding.collection.name),
        err
    )]
    pub async fn destroy<T: ArangoTransport>(self, db: &Database<T>) -> OrmResult<()> {
        db.transport()
            .drop_collection(db.spec(), &self.binding.collection.name)
            .await?;
        db.registry().remove::<M>();
        info!("dropped collection {}", self.binding.collection.name);
        Ok(())
    }
}

impl<M> Clone for ModelHandle<M> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for ModelHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.binding.type_name)
            .field("collection", &self.binding.collection.name)
            .finish()
    }
}
