//! Document CRUD endpoints

use {
    crate::{
        document::{user_fields, DocumentId, DocumentRecord, FROM_FIELD, KEY_FIELD, TO_FIELD},
        err::{ClientResult, RequestKind},
        spec::DatabaseSpec,
    },
    reqwest::Method,
    serde::Deserialize,
    serde_json::{Map, Value},
    tracing::{debug, instrument},
};

/// Write response with `returnNew=true`.
#[derive(Debug, Deserialize)]
struct WriteResult {
    new: DocumentRecord,
}

/// Keep caller attributes plus the system attributes a write may carry.
fn write_body(data: Map<String, Value>) -> Map<String, Value> {
    let mut body = user_fields(&data);
    for name in [KEY_FIELD, FROM_FIELD, TO_FIELD] {
        if let Some(value) = data.get(name) {
            body.insert(name.to_string(), value.clone());
        }
    }
    body
}

impl super::client::HttpTransport {
    #[instrument(
        name = "arangodb.document.create",
        skip(self, data),
        fields(db = %db, collection = %collection),
        err
    )]
    pub async fn create_document(
        &self,
        db: &DatabaseSpec,
        collection: &str,
        data: Map<String, Value>,
    ) -> ClientResult<DocumentRecord> {
        let url = self
            .build_url()
            .database(db)
            .api("document")
            .segment(collection)
            .query("returnNew", "true")
            .build();

        debug!("creating document in {}", collection);
        let res = self
            .request(Method::POST, url)
            .json(&write_body(data))
            .send()
            .await?;

        let result: WriteResult = self
            .parse_response(res, RequestKind::Create, collection)
            .await?;
        Ok(result.new)
    }

    #[instrument(
        name = "arangodb.document.get",
        skip(self),
        fields(db = %db, id = %id),
        err
    )]
    pub async fn get_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
    ) -> ClientResult<DocumentRecord> {
        let url = self
            .build_url()
            .database(db)
            .api("document")
            .segment(id.collection())
            .segment(id.key())
            .build();

        let res = self.request(Method::GET, url).send().await?;
        self.parse_response(res, RequestKind::Read, &id.to_string())
            .await
    }

    #[instrument(
        name = "arangodb.document.update",
        skip(self, data),
        fields(db = %db, id = %id, if_revision = ?if_revision),
        err
    )]
    pub async fn update_document(
        &self,
        db: &DatabaseSpec,
        id: &DocumentId,
        data: Map<String, Value>,
        if_revision: Option<&str>,
    ) -> ClientResult<DocumentRecord> {
        let url = self
            .build_url()
            .database(db)
            .api("document")
            .segment(id.collection())
            .segment(id.key())
            .query("returnNew", "true")
            .build();

        let mut request = self.request(Method::PUT, url).json(&write_body(data));
        if let Some(rev) = if_revision {
            request = request.header("If-Match", rev);
        }

        let res = request.send().await?;
        let result: WriteResult = self
            .parse_response(res, RequestKind::Update, &id.to_string())
            .await?;
        Ok(result.new)
    }

    #[instrument(
        name = "arangodb.document.delete",
        skip(self),
        fields(db = %db, id = %id),
        err
    )]
    pub async fn delete_document(&self, db: &DatabaseSpec, id: &DocumentId) -> ClientResult<()> {
        let url = self
            .build_url()
            .database(db)
            .api("document")
            .segment(id.collection())
            .segment(id.key())
            .build();

        let res = self.request(Method::DELETE, url).send().await?;
        let _: Value = self
            .parse_response(res, RequestKind::Delete, &id.to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn write_body_drops_id_and_rev() {
        let data = json!({
            "_id": "foo/1",
            "_key": "1",
            "_rev": "abc",
            "_from": "v/a",
            "name": "x"
        });
        let body = write_body(data.as_object().unwrap().clone());
        assert_eq!(
            Value::Object(body),
            json!({"_key": "1", "_from": "v/a", "name": "x"})
        );
    }
}
