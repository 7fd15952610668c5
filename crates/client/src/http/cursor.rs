//! Query, traversal and transaction endpoints

use {
    crate::{
        err::{ClientResult, RequestKind},
        query::{AqlQuery, QuerySpec},
        spec::DatabaseSpec,
        transaction::TransactionSpec,
        traversal::TraversalSpec,
    },
    reqwest::Method,
    serde::Deserialize,
    serde_json::Value,
    std::time::Instant,
    tracing::{debug, instrument, trace},
};

/// Rows requested per cursor batch.
const BATCH_SIZE: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorBatch {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    result: Value,
}

impl super::client::HttpTransport {
    /// Post AQL to the cursor endpoint and drain the cursor.
    async fn run_aql(&self, db: &DatabaseSpec, aql: &AqlQuery) -> ClientResult<Vec<Value>> {
        trace!("AQL: {}", aql.query);
        let start = Instant::now();

        let url = self.build_url().database(db).api("cursor").build();
        let res = self
            .request(Method::POST, url)
            .json(&aql.to_cursor_body(BATCH_SIZE))
            .send()
            .await?;
        let mut batch: CursorBatch = self.parse_response(res, RequestKind::Query, "cursor").await?;

        let mut rows = std::mem::take(&mut batch.result);
        // results larger than one batch stay on the server cursor
        while batch.has_more {
            let Some(cursor_id) = batch.id.clone() else {
                break;
            };
            let url = self
                .build_url()
                .database(db)
                .api("cursor")
                .segment(&cursor_id)
                .build();
            let res = self.request(Method::PUT, url).send().await?;
            batch = self.parse_response(res, RequestKind::Query, &cursor_id).await?;
            rows.append(&mut batch.result);
        }

        debug!("query returned {} rows in {:?}", rows.len(), start.elapsed());
        Ok(rows)
    }

    #[instrument(
        name = "arangodb.query.run",
        skip(self, spec),
        fields(db = %db, collections = ?spec.collections),
        err
    )]
    pub async fn run_query(&self, db: &DatabaseSpec, spec: &QuerySpec) -> ClientResult<Vec<Value>> {
        let aql = spec.to_aql()?;
        self.run_aql(db, &aql).await
    }

    #[instrument(
        name = "arangodb.traversal.run",
        skip(self, spec),
        fields(db = %db, start = %spec.start, edges = %spec.edge_collection),
        err
    )]
    pub async fn run_traversal(
        &self,
        db: &DatabaseSpec,
        spec: &TraversalSpec,
    ) -> ClientResult<Vec<Value>> {
        let aql = spec.to_aql()?;
        self.run_aql(db, &aql).await
    }

    #[instrument(
        name = "arangodb.transaction.run",
        skip(self, spec),
        fields(db = %db, operations = spec.operations.len()),
        err
    )]
    pub async fn run_transaction(
        &self,
        db: &DatabaseSpec,
        spec: &TransactionSpec,
    ) -> ClientResult<Vec<Value>> {
        let body = spec.to_request_body()?;
        let url = self.build_url().database(db).api("transaction").build();

        let res = self.request(Method::POST, url).json(&body).send().await?;
        let response: TransactionResponse = self
            .parse_response(res, RequestKind::Transaction, "transaction")
            .await?;

        Ok(match response.result {
            Value::Array(entries) => entries,
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }
}
