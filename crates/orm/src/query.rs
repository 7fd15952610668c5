//! Multi-collection query builder.
//!
//! A [`Query`] lists collections to loop over, filters against literals or
//! other collections' attributes, sort keys, an optional limit, and which
//! collection's documents to return. It compiles to a [`QuerySpec`], which
//! the transport renders as AQL with every collection name, attribute name
//! and value passed as a bind variable.
//!
//! Whenever any sort key is given, `_key` ascending is appended for each
//! collection that is not already sorted by it, so equal sort values come
//! back in a stable order.
//!
//! # Example
//! ```ignore
//! let docs = Query::new()
//!     .append_collection("foo_1")
//!     .filter("bar", Comparison::Gt, 1)
//!     .order_by("bar", SortDirection::Asc)
//!     .limit(10)
//!     .execute(&db)
//!     .await?;
//! ```

use {
    crate::{
        database::Database,
        document::DocumentProxy,
        error::{OrmError, OrmResult},
        model::{CollectionModel, Instance},
    },
    arangodb_client::{
        document::KEY_FIELD, AqlQuery, ArangoTransport, Comparison, DocumentRecord, FieldPath,
        FilterSpec, LimitSpec, Operand, QuerySpec, SortDirection, SortSpec,
    },
    serde_json::Value,
    tracing::{debug, instrument},
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    collections: Vec<String>,
    filters: Vec<FilterSpec>,
    sort: Vec<SortSpec>,
    limit: Option<LimitSpec>,
    returning: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loop over `name`. The first collection appended is the primary one.
    pub fn append_collection(mut self, name: impl Into<String>) -> Self {
        self.collections.push(name.into());
        self
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    fn primary(&self) -> String {
        self.collections.first().cloned().unwrap_or_default()
    }

    /// Filter an attribute of the primary collection against a literal.
    pub fn filter(self, field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        let collection = self.primary();
        self.filter_on(collection, field, op, Operand::Value(value.into()))
    }

    /// Filter an attribute of any appended collection against a literal or
    /// another collection's attribute.
    pub fn filter_on(
        mut self,
        collection: impl Into<String>,
        field: impl Into<String>,
        op: Comparison,
        right: Operand,
    ) -> Self {
        self.filters.push(FilterSpec {
            left: FieldPath::new(collection, field),
            op,
            right,
        });
        self
    }

    /// Equality join between two collections' attributes.
    pub fn join(self, left: FieldPath, right: FieldPath) -> Self {
        self.filter_on(left.collection, left.field, Comparison::Eq, Operand::Field(right))
    }

    /// Sort by an attribute of the primary collection.
    pub fn order_by(self, field: impl Into<String>, direction: SortDirection) -> Self {
        let collection = self.primary();
        self.order_by_on(collection, field, direction)
    }

    pub fn order_by_on(
        mut self,
        collection: impl Into<String>,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        self.sort.push(SortSpec {
            field: FieldPath::new(collection, field),
            direction,
        });
        self
    }

    pub fn limit(self, count: u64) -> Self {
        self.limit_from(0, count)
    }

    pub fn limit_from(mut self, offset: u64, count: u64) -> Self {
        self.limit = Some(LimitSpec { offset, count });
        self
    }

    /// Return documents of `collection` instead of the primary collection.
    pub fn returning(mut self, collection: impl Into<String>) -> Self {
        self.returning = Some(collection.into());
        self
    }

    /// Build the structured query, rejecting anything the server would.
    pub fn compile(&self) -> OrmResult<QuerySpec> {
        for (i, name) in self.collections.iter().enumerate() {
            if self.collections[..i].contains(name) {
                return Err(OrmError::MalformedQuery(format!(
                    "collection {} appended twice",
                    name
                )));
            }
        }

        let returning = match &self.returning {
            None => 0,
            Some(name) => self
                .collections
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| {
                    OrmError::MalformedQuery(format!("cannot return unknown collection {}", name))
                })?,
        };

        let mut sort = self.sort.clone();
        if !sort.is_empty() {
            for collection in &self.collections {
                let sorted_by_key = sort
                    .iter()
                    .any(|s| &s.field.collection == collection && s.field.field == KEY_FIELD);
                if !sorted_by_key {
                    sort.push(SortSpec {
                        field: FieldPath::new(collection, KEY_FIELD),
                        direction: SortDirection::Asc,
                    });
                }
            }
        }

        let spec = QuerySpec {
            collections: self.collections.clone(),
            filters: self.filters.clone(),
            sort,
            limit: self.limit,
            returning,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// The AQL text and bind variables this query runs as.
    pub fn to_aql(&self) -> OrmResult<AqlQuery> {
        Ok(self.compile()?.to_aql()?)
    }

    async fn rows<T: ArangoTransport>(&self, db: &Database<T>) -> OrmResult<Vec<Value>> {
        let spec = self.compile()?;
        let rows = db.transport().run_query(db.spec(), &spec).await?;
        debug!("query returned {} rows", rows.len());
        Ok(rows)
    }

    #[instrument(
        name = "arangodb.query.execute",
        skip(self, db),
        fields(collections = ?self.collections),
        err
    )]
    pub async fn execute<T: ArangoTransport>(&self, db: &Database<T>) -> OrmResult<Vec<DocumentProxy>> {
        self.rows(db)
            .await?
            .into_iter()
            .map(DocumentProxy::from_value)
            .collect()
    }

    /// Execute and read the results as instances of `M`, which must be
    /// registered and be the model of the returned collection.
    #[instrument(
        name = "arangodb.query.execute_as",
        skip(self, db),
        fields(model = M::type_name(), collections = ?self.collections),
        err
    )]
    pub async fn execute_as<M: CollectionModel, T: ArangoTransport>(
        &self,
        db: &Database<T>,
    ) -> OrmResult<Vec<Instance<M>>> {
        let handle = db.model::<M>()?;
        let returned = self
            .returning
            .clone()
            .unwrap_or_else(|| self.primary());
        if returned != handle.collection().name {
            return Err(OrmError::MalformedQuery(format!(
                "query returns {} but {} lives in {}",
                returned,
                M::type_name(),
                handle.collection().name
            )));
        }

        self.rows(db)
            .await?
            .into_iter()
            .map(|row| Instance::from_record(handle.binding(), DocumentRecord::from_value(row)?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDb;
    use arangodb_client::CollectionKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn sort_gets_key_tie_break() {
        let spec = Query::new()
            .append_collection("foo_1")
            .order_by("bar", SortDirection::Desc)
            .compile()
            .unwrap();
        assert_eq!(
            spec.sort,
            vec![
                SortSpec {
                    field: FieldPath::new("foo_1", "bar"),
                    direction: SortDirection::Desc
                },
                SortSpec {
                    field: FieldPath::new("foo_1", "_key"),
                    direction: SortDirection::Asc
                },
            ]
        );
    }

    #[test]
    fn no_sort_means_no_tie_break() {
        let spec = Query::new().append_collection("foo_1").compile().unwrap();
        assert!(spec.sort.is_empty());
    }

    #[test]
    fn returning_unknown_collection_is_malformed() {
        let err = Query::new()
            .append_collection("foo_1")
            .returning("bar")
            .compile()
            .unwrap_err();
        assert!(matches!(err, OrmError::MalformedQuery(_)));
    }

    #[test]
    fn empty_query_is_malformed() {
        assert!(matches!(
            Query::new().compile(),
            Err(OrmError::MalformedQuery(_))
        ));
    }

    #[test]
    fn duplicate_collection_is_malformed() {
        let err = Query::new()
            .append_collection("a")
            .append_collection("a")
            .compile()
            .unwrap_err();
        assert!(matches!(err, OrmError::MalformedQuery(_)));
    }

    #[test]
    fn values_are_bound_not_inlined() {
        let aql = Query::new()
            .append_collection("foo_1")
            .filter("bar", Comparison::Eq, "x\" OR true")
            .to_aql()
            .unwrap();
        assert!(!aql.query.contains("OR true"));
        assert!(aql.bind_vars.values().any(|v| v == &json!("x\" OR true")));
    }

    #[tokio::test]
    async fn join_returns_the_selected_collection() {
        let test = TestDb::new("query_join");
        let db = test.db();
        test.create_collection("authors", CollectionKind::Document)
            .await
            .unwrap();
        test.create_collection("books", CollectionKind::Document)
            .await
            .unwrap();

        for (author, name) in [("a1", "Ann"), ("a2", "Bob")] {
            let mut doc = DocumentProxy::local("authors");
            doc["_key"] = json!(author);
            doc["name"] = json!(name);
            doc.save(db).await.unwrap();
        }
        for (title, author) in [("T1", "a1"), ("T2", "a2"), ("T3", "a1")] {
            let mut doc = DocumentProxy::local("books");
            doc["title"] = json!(title);
            doc["author"] = json!(author);
            doc.save(db).await.unwrap();
        }

        let authors = Query::new()
            .append_collection("books")
            .append_collection("authors")
            .join(
                FieldPath::new("books", "author"),
                FieldPath::new("authors", "_key"),
            )
            .filter("title", Comparison::Eq, "T3")
            .returning("authors")
            .execute(db)
            .await
            .unwrap();

        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0]["name"], json!("Ann"));
    }

    #[tokio::test]
    async fn limit_from_skips_then_takes() {
        let test = TestDb::new("query_limit");
        let db = test.db();
        test.create_collection("nums", CollectionKind::Document)
            .await
            .unwrap();
        for n in 1..=5 {
            let mut doc = DocumentProxy::local("nums");
            doc["n"] = json!(n);
            doc.save(db).await.unwrap();
        }

        let page = Query::new()
            .append_collection("nums")
            .order_by("n", SortDirection::Asc)
            .limit_from(1, 2)
            .execute(db)
            .await
            .unwrap();
        let values: Vec<_> = page.iter().map(|d| d["n"].clone()).collect();
        assert_eq!(values, vec![json!(2), json!(3)]);
    }
}
