//! Lookups by example document.

use {
    crate::{
        database::Database,
        document::DocumentProxy,
        error::{OrmError, OrmResult, ValidationError},
        query::Query,
    },
    arangodb_client::{document::KEY_FIELD, ArangoTransport, Comparison, SortDirection},
    serde_json::Value,
    tracing::instrument,
};

/// Equality matches against example attributes, always in key order.
pub struct SimpleQuery;

impl SimpleQuery {
    fn by_example_query(collection: &str, example: &Value) -> OrmResult<Query> {
        let attributes = example.as_object().ok_or_else(|| ValidationError::NotAnObject {
            context: "example".to_string(),
        })?;
        let query = attributes.iter().fold(
            Query::new().append_collection(collection),
            |query, (name, value)| query.filter(name.as_str(), Comparison::Eq, value.clone()),
        );
        Ok(query.order_by(KEY_FIELD, SortDirection::Asc))
    }

    /// The matching document with the lowest key.
    #[instrument(
        name = "arangodb.simple.get_by_example",
        skip(db, example),
        fields(collection = collection),
        err
    )]
    pub async fn get_by_example<T: ArangoTransport>(
        db: &Database<T>,
        collection: &str,
        example: &Value,
    ) -> OrmResult<DocumentProxy> {
        Self::by_example_query(collection, example)?
            .limit(1)
            .execute(db)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::NotFound(format!("{} matching {}", collection, example)))
    }

    #[instrument(
        name = "arangodb.simple.by_example",
        skip(db, example),
        fields(collection = collection),
        err
    )]
    pub async fn by_example<T: ArangoTransport>(
        db: &Database<T>,
        collection: &str,
        example: &Value,
    ) -> OrmResult<Vec<DocumentProxy>> {
        Self::by_example_query(collection, example)?
            .execute(db)
            .await
    }

    #[instrument(name = "arangodb.simple.all", skip(db), fields(collection = collection), err)]
    pub async fn all<T: ArangoTransport>(
        db: &Database<T>,
        collection: &str,
    ) -> OrmResult<Vec<DocumentProxy>> {
        Query::new()
            .append_collection(collection)
            .order_by(KEY_FIELD, SortDirection::Asc)
            .execute(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDb;
    use arangodb_client::CollectionKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn seeded(prefix: &str) -> TestDb {
        let test = TestDb::new(prefix);
        test.create_collection("colors", CollectionKind::Document)
            .await
            .unwrap();
        for (key, shade) in [("c", "red"), ("a", "blue"), ("b", "red")] {
            let mut doc = DocumentProxy::local("colors");
            doc["_key"] = json!(key);
            doc["shade"] = json!(shade);
            doc.save(test.db()).await.unwrap();
        }
        test
    }

    #[tokio::test]
    async fn get_by_example_picks_lowest_key() {
        let test = seeded("simple_lowest").await;
        let doc = SimpleQuery::get_by_example(test.db(), "colors", &json!({ "shade": "red" }))
            .await
            .unwrap();
        assert_eq!(doc.key(), Some("b"));
    }

    #[tokio::test]
    async fn get_by_example_on_key() {
        let test = seeded("simple_key").await;
        let doc = SimpleQuery::get_by_example(test.db(), "colors", &json!({ "_key": "c" }))
            .await
            .unwrap();
        assert_eq!(doc["shade"], json!("red"));
    }

    #[tokio::test]
    async fn no_match_is_not_found() {
        let test = seeded("simple_none").await;
        let err = SimpleQuery::get_by_example(test.db(), "colors", &json!({ "shade": "green" }))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn by_example_and_all_are_key_ordered() {
        let test = seeded("simple_order").await;
        let reds = SimpleQuery::by_example(test.db(), "colors", &json!({ "shade": "red" }))
            .await
            .unwrap();
        let keys: Vec<_> = reds.iter().filter_map(|d| d.key()).collect();
        assert_eq!(keys, vec!["b", "c"]);

        let all = SimpleQuery::all(test.db(), "colors").await.unwrap();
        let keys: Vec<_> = all.iter().filter_map(|d| d.key()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn example_must_be_an_object() {
        let test = seeded("simple_shape").await;
        let err = SimpleQuery::by_example(test.db(), "colors", &json!(["shade"]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
