use crate::error::{BlueprintError, Result};
use crate::fetch::{FetchConfig, FetchRequest, HttpTransport};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// [`HttpTransport`] over a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ReqwestTransport {
    /// Transport configured from the environment (see [`FetchConfig::from_env`]).
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::from_env())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("blueprint/0.1");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| BlueprintError::Fetch {
            status: None,
            message: format!("failed to build http client: {}", e),
        })?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: FetchRequest) -> Result<Value> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            BlueprintError::failed(format!("invalid http method `{}`", request.method))
        })?;
        let url = self.config.resolve(&request.url);

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| BlueprintError::Fetch {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "request failed");
            return Err(BlueprintError::Fetch {
                status: Some(status.as_u16()),
                message: format!("{} responded {}: {}", url, status, text),
            });
        }

        let bytes = response.bytes().await.map_err(|e| BlueprintError::Fetch {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| BlueprintError::Fetch {
            status: Some(status.as_u16()),
            message: format!("invalid json response: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;

    async fn serve() -> String {
        let app = Router::new()
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
            .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
            .route("/json", get(|| async { Json(json!({ "ok": true })) }))
            .route(
                "/echo",
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    let ct = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({ "ct": ct, "body": body }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn transport(base_url: String) -> ReqwestTransport {
        ReqwestTransport::with_config(FetchConfig {
            base_url: Some(base_url),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    fn request(input: Value) -> FetchRequest {
        FetchRequest::from_input(&input).unwrap()
    }

    #[tokio::test]
    async fn non_success_status_becomes_fetch_error() {
        let transport = transport(serve().await);

        let err = transport
            .send(request(json!({ "url": "/missing" })))
            .await
            .unwrap_err();

        match err {
            BlueprintError::Fetch { status, message } => {
                assert_eq!(status, Some(404));
                assert!(message.ends_with("nope"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_body_is_null_and_json_is_parsed() {
        let transport = transport(serve().await);

        let empty = transport.send(request(json!({ "url": "/empty" }))).await;
        assert_eq!(empty.unwrap(), Value::Null);

        let parsed = transport.send(request(json!({ "url": "json" }))).await;
        assert_eq!(parsed.unwrap(), json!({ "ok": true }));
    }

    #[tokio::test]
    async fn posts_json_body_through_a_blueprint() {
        let bp = crate::fetch::create_fetch(transport(serve().await))
            .defaults(json!({ "method": "post", "url": "/echo" }));

        let response = bp.call(json!({ "body": { "a": 1 } })).await.unwrap();

        assert_eq!(response["ct"], json!("application/json"));
        assert_eq!(response["body"], json!({ "a": 1 }));
    }
}
