//! URL building utilities for ArangoDB API endpoints

use {crate::spec::DatabaseSpec, url::Url};

/// Centralized URL builder for database-scoped API endpoints.
/// Path segments are percent-encoded individually.
#[derive(Debug)]
pub struct UrlBuilder<'a> {
    endpoint: &'a Url,
    db: Option<&'a str>,
    parts: Vec<String>,
    query_params: Vec<(String, String)>,
}

impl<'a> UrlBuilder<'a> {
    pub fn new(endpoint: &'a Url) -> Self {
        Self {
            endpoint,
            db: None,
            parts: Vec::new(),
            query_params: Vec::new(),
        }
    }

    /// Scope the request to a database (`/_db/{name}`).
    pub fn database(mut self, spec: &'a DatabaseSpec) -> Self {
        self.db = Some(spec.name());
        self
    }

    /// Add an API endpoint under `/_api` (document, collection, cursor, ...)
    pub fn api(mut self, endpoint: &str) -> Self {
        self.parts.push("_api".to_string());
        self.parts.push(endpoint.to_string());
        self
    }

    /// Add a single path segment.
    pub fn segment(mut self, segment: &str) -> Self {
        self.parts.push(segment.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Url {
        let mut url = self.endpoint.clone();
        {
            // endpoints are validated as base URLs in HttpConfig
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty();
                if let Some(db) = self.db {
                    segments.push("_db").push(db);
                }
                for part in &self.parts {
                    segments.push(part);
                }
            }
        }
        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query_params.iter());
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_database_scoped_document_urls() {
        let endpoint = Url::parse("http://localhost:8529").unwrap();
        let db = DatabaseSpec::new("testcase_collection_123");
        let url = UrlBuilder::new(&endpoint)
            .database(&db)
            .api("document")
            .segment("foo_1")
            .segment("12 3")
            .query("returnNew", "true")
            .build();

        assert_eq!(
            url.as_str(),
            "http://localhost:8529/_db/testcase_collection_123/_api/document/foo_1/12%203?returnNew=true"
        );
    }
}
