//! Graph traversal from a start vertex along one edge collection.

use {
    crate::{database::Database, document::DocumentProxy, error::OrmResult},
    arangodb_client::{ArangoTransport, DocumentId, TraversalDirection, TraversalSpec},
    std::collections::HashSet,
    tracing::{debug, instrument},
};

/// Breadth-first traversal. Each reachable vertex is returned once, the
/// start vertex never. Depth defaults to direct neighbours only.
#[derive(Clone, Debug, PartialEq)]
pub struct Traverser {
    spec: TraversalSpec,
}

impl Traverser {
    pub fn new(start: DocumentId, edge_collection: impl Into<String>) -> Self {
        Self {
            spec: TraversalSpec::new(start, edge_collection),
        }
    }

    pub fn direction(mut self, direction: TraversalDirection) -> Self {
        self.spec.direction = direction;
        self
    }

    pub fn min_depth(mut self, depth: u32) -> Self {
        self.spec.min_depth = depth;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.spec.max_depth = depth;
        self
    }

    pub fn spec(&self) -> &TraversalSpec {
        &self.spec
    }

    /// Vertices one hop from `start`.
    pub async fn follow<T: ArangoTransport>(
        db: &Database<T>,
        start: &DocumentId,
        edge_collection: &str,
        direction: TraversalDirection,
    ) -> OrmResult<Vec<DocumentProxy>> {
        Self::new(start.clone(), edge_collection)
            .direction(direction)
            .execute(db)
            .await
    }

    #[instrument(
        name = "arangodb.traversal.execute",
        skip(self, db),
        fields(start = %self.spec.start, edges = %self.spec.edge_collection),
        err
    )]
    pub async fn execute<T: ArangoTransport>(&self, db: &Database<T>) -> OrmResult<Vec<DocumentProxy>> {
        self.spec.validate()?;
        let rows = db.transport().run_traversal(db.spec(), &self.spec).await?;

        let mut seen = HashSet::new();
        let mut vertices = Vec::with_capacity(rows.len());
        for row in rows {
            // edges may point at vertices that no longer exist
            if row.is_null() {
                continue;
            }
            let vertex = DocumentProxy::from_value(row)?;
            let Some(id) = vertex.id() else {
                continue;
            };
            if id != self.spec.start && seen.insert(id) {
                vertices.push(vertex);
            }
        }
        debug!("traversal reached {} vertices", vertices.len());
        Ok(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{document::Edge, testing::TestDb};
    use arangodb_client::{
        ClientResult, CollectionInfo, CollectionKind, DatabaseSpec, DocumentRecord, MemoryStore,
        QuerySpec, TransactionSpec,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    async fn vertex(test: &TestDb, key: &str) -> DocumentId {
        let mut doc = DocumentProxy::local("vertices");
        doc["_key"] = json!(key);
        doc.save(test.db()).await.unwrap();
        doc.id().unwrap()
    }

    async fn link(test: &TestDb, from: &DocumentId, to: &DocumentId) {
        let mut edge = Edge::new("links", from, to);
        edge.save(test.db()).await.unwrap();
    }

    /// a -> b -> c, a -> c, d -> a
    async fn graph(prefix: &str) -> (TestDb, [DocumentId; 4]) {
        let test = TestDb::new(prefix);
        test.create_collection("vertices", CollectionKind::Document)
            .await
            .unwrap();
        test.create_collection("links", CollectionKind::Edge)
            .await
            .unwrap();
        let a = vertex(&test, "a").await;
        let b = vertex(&test, "b").await;
        let c = vertex(&test, "c").await;
        let d = vertex(&test, "d").await;
        link(&test, &a, &b).await;
        link(&test, &b, &c).await;
        link(&test, &a, &c).await;
        link(&test, &d, &a).await;
        (test, [a, b, c, d])
    }

    fn keys(vertices: &[DocumentProxy]) -> Vec<&str> {
        let mut keys: Vec<_> = vertices.iter().filter_map(|v| v.key()).collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn follow_reaches_direct_neighbours() {
        let (test, [a, ..]) = graph("traversal_out").await;
        let reached = Traverser::follow(test.db(), &a, "links", TraversalDirection::Outbound)
            .await
            .unwrap();
        assert_eq!(keys(&reached), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn inbound_and_any() {
        let (test, [a, ..]) = graph("traversal_in").await;
        let inbound = Traverser::follow(test.db(), &a, "links", TraversalDirection::Inbound)
            .await
            .unwrap();
        assert_eq!(keys(&inbound), vec!["d"]);

        let any = Traverser::follow(test.db(), &a, "links", TraversalDirection::Any)
            .await
            .unwrap();
        assert_eq!(keys(&any), vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn deeper_traversal_visits_each_vertex_once() {
        let (test, [_, _, _, d]) = graph("traversal_deep").await;
        let reached = Traverser::new(d, "links")
            .max_depth(3)
            .execute(test.db())
            .await
            .unwrap();
        assert_eq!(keys(&reached), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn sink_vertex_reaches_nothing() {
        let (test, [_, _, c, _]) = graph("traversal_sink").await;
        let reached = Traverser::follow(test.db(), &c, "links", TraversalDirection::Outbound)
            .await
            .unwrap();
        assert!(reached.is_empty());
    }

    #[tokio::test]
    async fn unknown_start_is_empty() {
        let (test, _) = graph("traversal_unknown").await;
        let reached = Traverser::follow(
            test.db(),
            &DocumentId::new("vertices", "zzz"),
            "links",
            TraversalDirection::Any,
        )
        .await
        .unwrap();
        assert!(reached.is_empty());
    }

    /// Memory store whose traversals also report a dangling edge target.
    struct DanglingTarget(Arc<MemoryStore>);

    #[async_trait]
    impl ArangoTransport for DanglingTarget {
        async fn create_collection(
            &self,
            db: &DatabaseSpec,
            name: &str,
            kind: CollectionKind,
        ) -> ClientResult<CollectionInfo> {
            self.0.create_collection(db, name, kind).await
        }

        async fn get_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<CollectionInfo> {
            self.0.get_collection(db, name).await
        }

        async fn drop_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<()> {
            self.0.drop_collection(db, name).await
        }

        async fn create_document(
            &self,
            db: &DatabaseSpec,
            collection: &str,
            data: Map<String, Value>,
        ) -> ClientResult<DocumentRecord> {
            self.0.create_document(db, collection, data).await
        }

        async fn get_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<DocumentRecord> {
            self.0.get_document(db, id).await
        }

        async fn update_document(
            &self,
            db: &DatabaseSpec,
            id: &DocumentId,
            data: Map<String, Value>,
            if_revision: Option<&str>,
        ) -> ClientResult<DocumentRecord> {
            self.0.update_document(db, id, data, if_revision).await
        }

        async fn delete_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<()> {
            self.0.delete_document(db, id).await
        }

        async fn run_query(&self, db: &DatabaseSpec, spec: &QuerySpec) -> ClientResult<Vec<Value>> {
            self.0.run_query(db, spec).await
        }

        async fn run_traversal(&self, db: &DatabaseSpec, spec: &TraversalSpec) -> ClientResult<Vec<Value>> {
            let mut rows = self.0.run_traversal(db, spec).await?;
            rows.push(Value::Null);
            Ok(rows)
        }

        async fn run_transaction(
            &self,
            db: &DatabaseSpec,
            spec: &TransactionSpec,
        ) -> ClientResult<Vec<Value>> {
            self.0.run_transaction(db, spec).await
        }
    }

    #[tokio::test]
    async fn missing_vertices_are_skipped() {
        let (test, [a, ..]) = graph("traversal_dangling").await;
        let db = Database::new(DanglingTarget(test.store().clone()), test.db().spec().clone());
        let reached = Traverser::follow(&db, &a, "links", TraversalDirection::Outbound)
            .await
            .unwrap();
        assert_eq!(keys(&reached), vec!["b", "c"]);
    }

    #[test]
    fn inverted_depths_are_rejected() {
        let traverser = Traverser::new(DocumentId::new("v", "1"), "e")
            .min_depth(3)
            .max_depth(1);
        assert!(traverser.spec().validate().is_err());
    }
}
