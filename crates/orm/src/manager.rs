//! Per-model query entry point.

use {
    crate::{
        database::Database,
        error::OrmResult,
        model::{CollectionModel, Instance},
        query::Query,
        registry::ModelBinding,
    },
    arangodb_client::{document::KEY_FIELD, ArangoTransport, Comparison, DocumentId, SortDirection},
    serde_json::Value,
    std::{marker::PhantomData, sync::Arc},
    tracing::instrument,
};

/// Reads instances of `M` from its collection.
pub struct Manager<M> {
    binding: Arc<ModelBinding>,
    _model: PhantomData<fn() -> M>,
}

impl<M: CollectionModel> Manager<M> {
    pub(crate) fn new(binding: Arc<ModelBinding>) -> Self {
        Self {
            binding,
            _model: PhantomData,
        }
    }

    /// A query over the model's collection, ready for filters.
    pub fn query(&self) -> Query {
        Query::new().append_collection(self.binding.collection_name())
    }

    pub fn filter(&self, field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Query {
        self.query().filter(field, op, value)
    }

    /// Every instance, in key order.
    #[instrument(name = "arangodb.manager.all", skip(self, db), fields(model = M::type_name()), err)]
    pub async fn all<T: ArangoTransport>(&self, db: &Database<T>) -> OrmResult<Vec<Instance<M>>> {
        self.query()
            .order_by(KEY_FIELD, SortDirection::Asc)
            .execute_as::<M, T>(db)
            .await
    }

    #[instrument(name = "arangodb.manager.get", skip(self, db), fields(model = M::type_name()), err)]
    pub async fn get<T: ArangoTransport>(&self, db: &Database<T>, key: &str) -> OrmResult<Instance<M>> {
        let id = DocumentId::new(self.binding.collection_name(), key);
        let record = db.transport().get_document(db.spec(), &id).await?;
        Instance::from_record(&self.binding, record)
    }
}

impl<M> Clone for Manager<M> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            _model: PhantomData,
        }
    }
}
