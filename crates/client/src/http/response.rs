//! Response parsing utilities for the HTTP transport

use {
    crate::err::{ClientResult, RequestKind, ServerErrorBody},
    reqwest::Response,
    serde::de::DeserializeOwned,
    serde_json::Value,
    std::fmt::Debug,
    tracing::{trace, warn},
};

impl super::client::HttpTransport {
    /// Parse a JSON body on success or map the server error body into the
    /// client error taxonomy.
    pub(crate) async fn parse_response<T: DeserializeOwned + Debug>(
        &self,
        res: Response,
        kind: RequestKind,
        subject: &str,
    ) -> ClientResult<T> {
        let status = res.status();
        let json = res.json::<Value>().await?;

        trace!("[HttpTransport] {} response: {:#?}", status, &json);

        if status.is_success() && json.get("error").and_then(Value::as_bool) != Some(true) {
            return Ok(serde_json::from_value(json)?);
        }

        let body: ServerErrorBody = serde_json::from_value(json).unwrap_or(ServerErrorBody {
            code: status.as_u16(),
            error_num: 0,
            error_message: status.to_string(),
        });
        let err = body.into_client_error(status.as_u16(), kind, subject);
        warn!("request for {} failed: {}", subject, err);
        Err(err)
    }
}
