//! Collection binding endpoints

use {
    crate::{
        document::{CollectionInfo, CollectionKind},
        err::{ClientResult, RequestKind},
        spec::DatabaseSpec,
    },
    reqwest::Method,
    serde_json::{json, Value},
    tracing::{debug, instrument},
};

impl super::client::HttpTransport {
    #[instrument(
        name = "arangodb.collection.create",
        skip(self),
        fields(db = %db, name = %name, kind = ?kind),
        err
    )]
    pub async fn create_collection(
        &self,
        db: &DatabaseSpec,
        name: &str,
        kind: CollectionKind,
    ) -> ClientResult<CollectionInfo> {
        let url = self.build_url().database(db).api("collection").build();

        let res = self
            .request(Method::POST, url)
            .json(&json!({ "name": name, "type": kind.wire_type() }))
            .send()
            .await?;

        let info = self.parse_response(res, RequestKind::Create, name).await?;
        debug!("created collection {}", name);
        Ok(info)
    }

    #[instrument(
        name = "arangodb.collection.get",
        skip(self),
        fields(db = %db, name = %name),
        err
    )]
    pub async fn get_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<CollectionInfo> {
        let url = self
            .build_url()
            .database(db)
            .api("collection")
            .segment(name)
            .build();

        let res = self.request(Method::GET, url).send().await?;
        self.parse_response(res, RequestKind::Read, name).await
    }

    #[instrument(
        name = "arangodb.collection.drop",
        skip(self),
        fields(db = %db, name = %name),
        err
    )]
    pub async fn drop_collection(&self, db: &DatabaseSpec, name: &str) -> ClientResult<()> {
        let url = self
            .build_url()
            .database(db)
            .api("collection")
            .segment(name)
            .build();

        let res = self.request(Method::DELETE, url).send().await?;
        let _: Value = self.parse_response(res, RequestKind::Delete, name).await?;
        debug!("dropped collection {}", name);
        Ok(())
    }
}
