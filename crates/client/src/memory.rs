//! In-memory store implementing [`ArangoTransport`], for tests.
//!
//! Evaluates [`QuerySpec`], [`TraversalSpec`] and [`TransactionSpec`] directly
//! with the same semantics the server applies to their AQL renderings.
//! Transactions run against a staged copy that replaces the live state only
//! when every operation succeeds.

use {
    crate::{
        document::{
            user_fields, CollectionInfo, CollectionKind, DocumentId, DocumentRecord, FROM_FIELD,
            KEY_FIELD, TO_FIELD,
        },
        err::{ClientError, ClientResult},
        query::{compare_values, FieldPath, Operand, QuerySpec, SortDirection},
        spec::DatabaseSpec,
        transaction::{TransactionOperation, TransactionSpec},
        traversal::{TraversalDirection, TraversalSpec},
        ArangoTransport,
    },
    async_trait::async_trait,
    serde_json::{Map, Value},
    std::{
        cmp::Ordering,
        collections::{BTreeMap, HashMap, HashSet, VecDeque},
        sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
    tokio::sync::RwLock,
    tracing::{debug, trace},
};

/// First generated key; fixed width keeps lexicographic and numeric order aligned.
const FIRST_KEY: u64 = 100_000_000;

#[derive(Clone, Debug)]
struct MemoryCollection {
    info: CollectionInfo,
    documents: BTreeMap<String, DocumentRecord>,
}

#[derive(Clone, Debug, Default)]
struct MemoryDatabase {
    collections: BTreeMap<String, MemoryCollection>,
}

/// Store counters shared by every database.
#[derive(Debug)]
struct Counters {
    keys: AtomicU64,
    revisions: AtomicU64,
    collections: AtomicU64,
}

impl Counters {
    fn next_key(&self) -> String {
        self.keys.fetch_add(1, AtomicOrdering::SeqCst).to_string()
    }

    fn next_rev(&self) -> String {
        format!("_r{}", self.revisions.fetch_add(1, AtomicOrdering::SeqCst))
    }

    fn next_collection_id(&self) -> String {
        self.collections.fetch_add(1, AtomicOrdering::SeqCst).to_string()
    }
}

/// Thread-safe in-memory store. Databases spring into existence on first use.
#[derive(Debug)]
pub struct MemoryStore {
    databases: RwLock<HashMap<String, MemoryDatabase>>,
    counters: Counters,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            counters: Counters {
                keys: AtomicU64::new(FIRST_KEY),
                revisions: AtomicU64::new(1),
                collections: AtomicU64::new(1),
            },
        }
    }

    /// Number of documents currently stored in a collection.
    pub async fn count(&self, db: &DatabaseSpec, collection: &str) -> ClientResult<usize> {
        let databases = self.databases.read().await;
        databases
            .get(db.name())
            .and_then(|d| d.collections.get(collection))
            .map(|c| c.documents.len())
            .ok_or_else(|| ClientError::NotFound(collection.to_string()))
    }

    /// Names of the collections in a database.
    pub async fn collection_names(&self, db: &DatabaseSpec) -> Vec<String> {
        let databases = self.databases.read().await;
        databases
            .get(db.name())
            .map(|d| d.collections.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl MemoryDatabase {
    fn collection(&self, name: &str) -> ClientResult<&MemoryCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> ClientResult<&mut MemoryCollection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    fn document(&self, id: &DocumentId) -> Option<&DocumentRecord> {
        self.collections
            .get(id.collection())?
            .documents
            .get(id.key())
    }

    fn create_collection(
        &mut self,
        counters: &Counters,
        name: &str,
        kind: CollectionKind,
    ) -> ClientResult<CollectionInfo> {
        if name.is_empty() {
            return Err(ClientError::Server {
                code: 400,
                error_num: 1208,
                message: "illegal collection name".to_string(),
            });
        }
        if self.collections.contains_key(name) {
            return Err(ClientError::AlreadyExists(name.to_string()));
        }
        let info = CollectionInfo {
            id: counters.next_collection_id(),
            name: name.to_string(),
            kind,
        };
        self.collections.insert(
            name.to_string(),
            MemoryCollection {
                info: info.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(info)
    }

    fn edge_ends(
        kind: CollectionKind,
        data: &Map<String, Value>,
    ) -> ClientResult<(Option<DocumentId>, Option<DocumentId>)> {
        if kind != CollectionKind::Edge {
            return Ok((None, None));
        }
        let end = |name: &str| -> ClientResult<DocumentId> {
            let raw = data.get(name).and_then(Value::as_str).ok_or_else(|| {
                ClientError::Server {
                    code: 400,
                    error_num: 1233,
                    message: format!("edge attribute missing or invalid: {}", name),
                }
            })?;
            DocumentId::parse(raw)
        };
        Ok((Some(end(FROM_FIELD)?), Some(end(TO_FIELD)?)))
    }

    fn create_document(
        &mut self,
        counters: &Counters,
        collection: &str,
        data: Map<String, Value>,
    ) -> ClientResult<DocumentRecord> {
        let col = self.collection_mut(collection)?;
        let key = match data.get(KEY_FIELD) {
            Some(Value::String(key)) if !key.is_empty() => key.clone(),
            Some(other) if !other.is_null() => {
                return Err(ClientError::Server {
                    code: 400,
                    error_num: 1221,
                    message: format!("illegal document key {}", other),
                })
            }
            _ => counters.next_key(),
        };
        if col.documents.contains_key(&key) {
            return Err(ClientError::AlreadyExists(format!("{}/{}", collection, key)));
        }

        let (from, to) = Self::edge_ends(col.info.kind, &data)?;
        let record = DocumentRecord {
            id: DocumentId::new(collection, key.clone()),
            key: key.clone(),
            rev: counters.next_rev(),
            from,
            to,
            fields: user_fields(&data),
        };
        col.documents.insert(key, record.clone());
        Ok(record)
    }

    fn update_document(
        &mut self,
        counters: &Counters,
        id: &DocumentId,
        data: Map<String, Value>,
        if_revision: Option<&str>,
    ) -> ClientResult<DocumentRecord> {
        let col = self.collection_mut(id.collection())?;
        let kind = col.info.kind;
        let current = col
            .documents
            .get_mut(id.key())
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;

        if let Some(expected) = if_revision {
            if current.rev != expected {
                return Err(ClientError::Conflict {
                    id: id.to_string(),
                    expected: expected.to_string(),
                });
            }
        }

        if kind == CollectionKind::Edge && (data.contains_key(FROM_FIELD) || data.contains_key(TO_FIELD)) {
            let mut ends = data.clone();
            if let Some(from) = &current.from {
                ends.entry(FROM_FIELD.to_string())
                    .or_insert_with(|| Value::String(from.to_string()));
            }
            if let Some(to) = &current.to {
                ends.entry(TO_FIELD.to_string())
                    .or_insert_with(|| Value::String(to.to_string()));
            }
            let (from, to) = Self::edge_ends(kind, &ends)?;
            current.from = from;
            current.to = to;
        }

        current.fields = user_fields(&data);
        current.rev = counters.next_rev();
        Ok(current.clone())
    }

    fn delete_document(&mut self, id: &DocumentId) -> ClientResult<()> {
        let col = self.collection_mut(id.collection())?;
        col.documents
            .remove(id.key())
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    fn run_query(&self, spec: &QuerySpec) -> ClientResult<Vec<Value>> {
        spec.validate()?;

        let sources = spec
            .collections
            .iter()
            .map(|name| self.collection(name).map(|c| c.documents.values().collect::<Vec<_>>()))
            .collect::<ClientResult<Vec<_>>>()?;

        // cartesian product of the loops, first collection outermost
        let mut bindings: Vec<Vec<&DocumentRecord>> = vec![Vec::new()];
        for source in &sources {
            bindings = bindings
                .into_iter()
                .flat_map(|prefix| {
                    source.iter().map(move |doc| {
                        let mut row = prefix.clone();
                        row.push(*doc);
                        row
                    })
                })
                .collect();
        }

        let resolve = |row: &[&DocumentRecord], path: &FieldPath| -> Value {
            spec.loop_index(&path.collection)
                .and_then(|i| row[i].get(&path.field))
                .unwrap_or(Value::Null)
        };

        let mut rows: Vec<Vec<&DocumentRecord>> = bindings
            .into_iter()
            .filter(|row| {
                spec.filters.iter().all(|filter| {
                    let left = resolve(row, &filter.left);
                    let right = match &filter.right {
                        Operand::Value(value) => value.clone(),
                        Operand::Field(path) => resolve(row, path),
                    };
                    filter.op.holds(compare_values(&left, &right))
                })
            })
            .collect();

        if !spec.sort.is_empty() {
            rows.sort_by(|a, b| {
                spec.sort
                    .iter()
                    .map(|s| {
                        let ordering = compare_values(&resolve(a, &s.field), &resolve(b, &s.field));
                        match s.direction {
                            SortDirection::Asc => ordering,
                            SortDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let (offset, count) = spec
            .limit
            .map(|l| (l.offset as usize, l.count as usize))
            .unwrap_or((0, usize::MAX));

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(count)
            .map(|row| row[spec.returning].clone().into_value())
            .collect())
    }

    fn run_traversal(&self, spec: &TraversalSpec) -> ClientResult<Vec<Value>> {
        spec.validate()?;
        let edges = self.collection(&spec.edge_collection)?;
        if self.document(&spec.start).is_none() {
            trace!("traversal start {} does not exist", spec.start);
            return Ok(Vec::new());
        }

        let neighbours = |vertex: &DocumentId| -> Vec<DocumentId> {
            edges
                .documents
                .values()
                .filter_map(|edge| {
                    let (from, to) = (edge.from.as_ref()?, edge.to.as_ref()?);
                    match spec.direction {
                        TraversalDirection::Outbound if from == vertex => Some(to.clone()),
                        TraversalDirection::Inbound if to == vertex => Some(from.clone()),
                        TraversalDirection::Any if from == vertex => Some(to.clone()),
                        TraversalDirection::Any if to == vertex => Some(from.clone()),
                        _ => None,
                    }
                })
                .collect()
        };

        let mut visited: HashSet<DocumentId> = HashSet::from([spec.start.clone()]);
        let mut queue: VecDeque<(DocumentId, u32)> = VecDeque::from([(spec.start.clone(), 0)]);
        let mut reached = Vec::new();

        while let Some((vertex, depth)) = queue.pop_front() {
            if depth >= spec.max_depth {
                continue;
            }
            for next in neighbours(&vertex) {
                if !visited.insert(next.clone()) {
                    continue;
                }
                let Some(record) = self.document(&next) else {
                    continue;
                };
                if depth + 1 >= spec.min_depth {
                    reached.push(record.clone().into_value());
                }
                queue.push_back((next, depth + 1));
            }
        }

        Ok(reached)
    }

    fn apply(
        &mut self,
        counters: &Counters,
        op: &TransactionOperation,
    ) -> ClientResult<Value> {
        match op {
            TransactionOperation::Create { collection, data } => self
                .create_document(counters, collection, data.clone())
                .map(DocumentRecord::into_value),
            TransactionOperation::Update {
                collection,
                key,
                data,
            } => self
                .update_document(counters, &DocumentId::new(collection, key), data.clone(), None)
                .map(DocumentRecord::into_value),
            TransactionOperation::Delete { collection, key } => self
                .delete_document(&DocumentId::new(collection, key))
                .map(|_| Value::Null),
        }
    }
}

#[async_trait]
impl ArangoTransport for MemoryStore {
    async fn create_collection(
        &self,
        db: &DatabaseSpec,
        name: &str,
        kind: CollectionKind,
    ) -> ClientResult<CollectionInfo> {
        let mut databases = self.databases.write().await;
        let database = databases.entry(db.name().to_string()).or_default();
        database.create_collection(&self.counters, name, kind)
    }

    async fn get_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<CollectionInfo> {
        let databases = self.databases.read().await;
        databases
            .get(db.name())
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?
            .collection(name)
            .map(|c| c.info.clone())
    }

    async fn drop_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<()> {
        let mut databases = self.databases.write().await;
        databases
            .get_mut(db.name())
            .and_then(|d| d.collections.remove(name))
            .map(|_| debug!("dropped collection {}", name))
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn create_document(
        &self,
        db: &DatabaseSpec,
        collection: &str,
        data: Map<String, Value>,
    ) -> ClientResult<DocumentRecord> {
        let mut databases = self.databases.write().await;
        databases
            .get_mut(db.name())
            .ok_or_else(|| ClientError::NotFound(collection.to_string()))?
            .create_document(&self.counters, collection, data)
    }

    async fn get_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
    ) -> ClientResult<DocumentRecord> {
        let databases = self.databases.read().await;
        databases
            .get(db.name())
            .and_then(|d| d.document(id))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    async fn update_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
        data: Map<String, Value>,
        if_revision: Option<&str>,
    ) -> ClientResult<DocumentRecord> {
        let mut databases = self.databases.write().await;
        databases
            .get_mut(db.name())
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?
            .update_document(&self.counters, id, data, if_revision)
    }

    async fn delete_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<()> {
        let mut databases = self.databases.write().await;
        databases
            .get_mut(db.name())
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?
            .delete_document(id)
    }

    async fn run_query(&self, db: &DatabaseSpec, spec: &QuerySpec) -> ClientResult<Vec<Value>> {
        let databases = self.databases.read().await;
        match databases.get(db.name()) {
            Some(database) => database.run_query(spec),
            None => {
                spec.validate()?;
                Err(ClientError::NotFound(spec.collections[0].clone()))
            }
        }
    }

    async fn run_traversal(
        &self,
        db: &DatabaseSpec,
        spec: &TraversalSpec,
    ) -> ClientResult<Vec<Value>> {
        let databases = self.databases.read().await;
        databases
            .get(db.name())
            .ok_or_else(|| ClientError::NotFound(spec.edge_collection.clone()))?
            .run_traversal(spec)
    }

    async fn run_transaction(
        &self,
        db: &DatabaseSpec,
        spec: &TransactionSpec,
    ) -> ClientResult<Vec<Value>> {
        spec.validate()?;

        let mut databases = self.databases.write().await;
        let live = databases.entry(db.name().to_string()).or_default();

        let mut staged = live.clone();
        let mut results = Vec::with_capacity(spec.operations.len());
        for (index, op) in spec.operations.iter().enumerate() {
            match staged.apply(&self.counters, op) {
                Ok(result) => results.push(result),
                Err(err) => {
                    debug!("transaction aborted at operation {}: {}", index, err);
                    return Err(ClientError::TransactionAborted(format!(
                        "operation {} on '{}' failed: {}",
                        index,
                        op.collection(),
                        err
                    )));
                }
            }
        }

        *live = staged;
        Ok(results)
    }
}
