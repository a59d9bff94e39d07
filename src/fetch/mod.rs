//! Network-request blueprints.
//!
//! [`fetch`] turns a blueprint into one whose logic sends an HTTP request built
//! from the validated input record `{ url, method?, body? }` and resolves to
//! the parsed JSON response. Everything else about the blueprint (defaults,
//! enforcement, mappers, validators, hooks) is kept, so the usual chain
//! methods shape the request:
//!
//! ```rust,ignore
//! use blueprint::fetch::{create_fetch, ReqwestTransport};
//! use serde_json::json;
//!
//! let get_user = create_fetch(ReqwestTransport::new()?)
//!     .input(|input| Ok(json!({ "url": format!("https://api.example.com/users/{}", input["id"]) })));
//! let user = get_user.call(json!({ "id": 7 })).await?;
//! ```

use crate::addon::{Addon, AddonMethod, method};
use crate::engine::Blueprint;
use crate::error::{BlueprintError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "fetch")]
mod client;

#[cfg(feature = "fetch")]
pub use client::ReqwestTransport;

/// A request derived from a blueprint's validated input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    /// Read `url`, `method` (default `GET`) and `body` from an input record.
    pub fn from_input(input: &Value) -> Result<Self> {
        let record = input
            .as_object()
            .ok_or_else(|| BlueprintError::failed("fetch input must be a record"))?;

        let url = record
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| BlueprintError::failed("fetch input is missing `url`"))?
            .to_string();

        let method = record
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_ascii_uppercase();

        let body = record.get("body").filter(|b| !b.is_null()).cloned();

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(Self {
            url,
            method,
            body,
            headers,
        })
    }
}

/// Sends a [`FetchRequest`] and returns the decoded JSON response.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn send(&self, request: FetchRequest) -> Result<Value>;
}

/// Transport settings, loaded from the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchConfig {
    /// Prepended to request URLs that are not absolute.
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl FetchConfig {
    pub const BASE_URL_VAR: &'static str = "BLUEPRINT_FETCH_BASE_URL";
    pub const TIMEOUT_VAR: &'static str = "BLUEPRINT_FETCH_TIMEOUT_MS";

    pub fn from_env() -> Self {
        let base_url = env::var(Self::BASE_URL_VAR).ok().filter(|v| !v.is_empty());
        let timeout = env::var(Self::TIMEOUT_VAR).ok().and_then(|raw| match raw.parse::<u64>() {
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(_) => {
                tracing::warn!(var = Self::TIMEOUT_VAR, value = %raw, "ignoring invalid timeout");
                None
            }
        });
        Self { base_url, timeout }
    }

    /// `url` resolved against the base URL. Absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !has_scheme(url) => {
                format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }
}

/// True when `url` starts with `scheme://`.
fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// A [`Blueprint::modify`] factory that makes the blueprint issue requests
/// through `transport`.
pub fn fetch<T: HttpTransport>(transport: T) -> impl FnOnce(Blueprint) -> Blueprint {
    let transport: Arc<dyn HttpTransport> = Arc::new(transport);
    move |blueprint| with_transport(&blueprint, transport)
}

/// A fresh request blueprint.
pub fn create_fetch<T: HttpTransport>(transport: T) -> Blueprint {
    Blueprint::new().modify(fetch(transport))
}

fn with_transport(blueprint: &Blueprint, transport: Arc<dyn HttpTransport>) -> Blueprint {
    blueprint.implement_async(move |input| {
        let transport = Arc::clone(&transport);
        async move {
            let request = FetchRequest::from_input(&input)?;
            tracing::debug!(method = %request.method, url = %request.url, "sending request");
            transport.send(request).await
        }
    })
}

/// Adds a `"fetch"` method backed by a shared transport.
#[derive(Clone)]
pub struct FetchAddon {
    transport: Arc<dyn HttpTransport>,
}

impl FetchAddon {
    pub fn new<T: HttpTransport>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }
}

impl Addon for FetchAddon {
    fn name(&self) -> &str {
        "fetch"
    }

    fn methods(&self) -> Vec<(String, AddonMethod)> {
        let transport = Arc::clone(&self.transport);
        vec![(
            "fetch".to_string(),
            method(move |bp: &Blueprint, _| Ok(with_transport(bp, Arc::clone(&transport)))),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{FieldRule, Schema};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<FetchRequest>>>,
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn send(&self, request: FetchRequest) -> Result<Value> {
            let echo = json!({ "method": request.method, "url": request.url, "body": request.body });
            self.sent.lock().unwrap().push(request);
            Ok(echo)
        }
    }

    #[tokio::test]
    async fn builds_request_from_validated_input() {
        let recorder = Recorder::default();
        let bp = create_fetch(recorder.clone())
            .defaults(json!({ "method": "post" }))
            .validate_input(Schema::object().required("url", FieldRule::NonEmptyString));

        let response = bp
            .call(json!({ "url": "https://example.test/items", "body": { "n": 1 } }))
            .await
            .unwrap();

        assert_eq!(response["method"], json!("POST"));
        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, Some(json!({ "n": 1 })));
        assert_eq!(
            sent[0].headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_transport() {
        let recorder = Recorder::default();
        let bp = create_fetch(recorder.clone())
            .validate_input(Schema::object().required("url", FieldRule::NonEmptyString));

        let err = bp.call(json!({ "url": "" })).await.unwrap_err();
        assert!(matches!(err, BlueprintError::InputValidation(_)));
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn request_defaults_to_get() {
        let request = FetchRequest::from_input(&json!({ "url": "/x" })).unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.body, None);
        assert!(FetchRequest::from_input(&json!("nope")).is_err());
    }

    #[test]
    fn resolves_relative_urls_against_base() {
        let config = FetchConfig {
            base_url: Some("https://api.test/".to_string()),
            timeout: None,
        };
        assert_eq!(config.resolve("/users"), "https://api.test/users");
        assert_eq!(config.resolve("http://other.test/a"), "http://other.test/a");
        assert_eq!(
            config.resolve("/go?next=http://x.test"),
            "https://api.test/go?next=http://x.test"
        );
        assert_eq!(config.resolve("svn+ssh://repo.test/a"), "svn+ssh://repo.test/a");
        assert_eq!(config.resolve("://nowhere"), "https://api.test/://nowhere");
    }

    #[tokio::test]
    async fn fetch_addon_method() {
        let recorder = Recorder::default();
        let bp = Blueprint::new()
            .addon(FetchAddon::new(recorder.clone()))
            .call_method("fetch", Value::Null)
            .unwrap();
        let response = bp.call(json!({ "url": "/ping" })).await.unwrap();
        assert_eq!(response["url"], json!("/ping"));
    }
}
