//! Lazily resolved references between model instances.

use {
    crate::{
        database::Database,
        error::{OrmError, OrmResult},
        model::{CollectionModel, Instance},
    },
    arangodb_client::{ArangoTransport, DocumentId, DocumentRecord},
    std::sync::{Arc, OnceLock},
    tokio::sync::OnceCell,
    tracing::trace,
};

/// Identity of an instance, assigned once by its first save and shared with
/// every reference taken to it.
pub(crate) type Identity = Arc<OnceLock<DocumentId>>;

/// Handle to a referenced document.
///
/// The target is fetched on first [`resolve`](ForeignRef::resolve) and the
/// fetched record is memoized; clones share the memo, so one load serves
/// every copy of the handle.
///
/// A reference taken to an instance that has not been saved yet has no id.
/// It picks up the id as soon as the instance is saved.
#[derive(Clone, Debug)]
pub struct ForeignRef {
    target: Identity,
    record: Arc<OnceCell<DocumentRecord>>,
}

impl ForeignRef {
    pub fn from_id(id: DocumentId) -> Self {
        Self::from_identity(Arc::new(OnceLock::from(id)))
    }

    pub(crate) fn from_identity(target: Identity) -> Self {
        Self {
            target,
            record: Arc::new(OnceCell::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn unsaved() -> Self {
        Self::from_identity(Arc::new(OnceLock::new()))
    }

    /// Id of the target, once it has been saved.
    pub fn id(&self) -> Option<&DocumentId> {
        self.target.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.record.initialized()
    }

    /// Raw record of the target, fetched at most once.
    pub async fn record<T: ArangoTransport>(&self, db: &Database<T>) -> OrmResult<&DocumentRecord> {
        let id = self
            .id()
            .ok_or_else(|| OrmError::NotPersisted("referenced instance".to_string()))?;
        self.record
            .get_or_try_init(|| async {
                trace!("resolving reference {}", id);
                db.transport()
                    .get_document(db.spec(), id)
                    .await
                    .map_err(OrmError::from)
            })
            .await
    }

    /// Resolve into an instance of `M`, which must be registered with `db`.
    pub async fn resolve<M: CollectionModel, T: ArangoTransport>(
        &self,
        db: &Database<T>,
    ) -> OrmResult<Instance<M>> {
        let handle = db.model::<M>()?;
        if let Some(id) = self.id() {
            if id.collection() != handle.collection().name {
                return Err(OrmError::ReferenceMismatch {
                    id: id.to_string(),
                    model: M::type_name(),
                });
            }
        }
        let record = self.record(db).await?;
        Instance::from_record(handle.binding(), record.clone())
    }
}

/// References are equal when they point at the same target.
impl PartialEq for ForeignRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
            || matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsaved_target_picks_up_id_later() {
        let identity: Identity = Arc::new(OnceLock::new());
        let reference = ForeignRef::from_identity(identity.clone());
        assert!(reference.id().is_none());

        let _ = identity.set(DocumentId::new("Author", "100000001"));
        assert_eq!(reference.id(), Some(&DocumentId::new("Author", "100000001")));
    }

    #[test]
    fn equality_follows_target() {
        let a = ForeignRef::from_id(DocumentId::new("Author", "1"));
        let b = ForeignRef::from_id(DocumentId::new("Author", "1"));
        let c = ForeignRef::from_id(DocumentId::new("Author", "2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(ForeignRef::unsaved(), ForeignRef::unsaved());
    }
}
