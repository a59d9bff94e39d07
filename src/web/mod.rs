//! Serve a blueprint as an axum route.
//!
//! The input record is built from the route parameters merged over either the
//! JSON body (mutating methods) or the query string (read methods). The
//! blueprint's result is returned as JSON; failures use
//! [`BlueprintError`]'s response mapping.
//!
//! ```rust,ignore
//! use axum::Router;
//! use blueprint::web::handler;
//!
//! let app = Router::new().route("/users/{id}", handler(find_user));
//! ```

use crate::engine::Blueprint;
use crate::error::BlueprintError;
use crate::validate::ValidationError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, any};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A method router that invokes `blueprint` for every request.
pub fn handler<S>(blueprint: Blueprint) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    any(
        move |method: Method,
              params: Option<Path<HashMap<String, String>>>,
              Query(query): Query<HashMap<String, String>>,
              body: Bytes| {
            let blueprint = blueprint.clone();
            async move {
                let params = params.map(|Path(p)| p).unwrap_or_default();
                handle(&blueprint, method, params, query, body).await
            }
        },
    )
}

async fn handle(
    blueprint: &Blueprint,
    method: Method,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Bytes,
) -> Response {
    let input = match request_input(&method, params, query, &body) {
        Ok(input) => input,
        Err(err) => return err.into_response(),
    };

    match blueprint.call(input).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            tracing::debug!(%method, key = blueprint.key().unwrap_or("<anonymous>"), error = %err, "blueprint request failed");
            err.into_response()
        }
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Route params win over body or query keys.
pub(crate) fn request_input(
    method: &Method,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: &Bytes,
) -> Result<Value, BlueprintError> {
    let mut input = Map::new();

    if is_mutating(method) {
        if !body.is_empty() {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(fields)) => input.extend(fields),
                Ok(Value::Null) => {}
                Ok(_) => {
                    return Err(BlueprintError::InputValidation(ValidationError::single(
                        "body",
                        "expected a JSON object",
                    )));
                }
                Err(e) => {
                    return Err(BlueprintError::InputValidation(ValidationError::single(
                        "body",
                        format!("invalid JSON: {}", e),
                    )));
                }
            }
        }
    } else {
        input.extend(query.into_iter().map(|(k, v)| (k, Value::String(v))));
    }

    input.extend(params.into_iter().map(|(k, v)| (k, Value::String(v))));
    Ok(Value::Object(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use crate::validate::{FieldRule, Schema};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn echo() -> Blueprint {
        create(|input| Ok(input))
    }

    #[tokio::test]
    async fn get_merges_query_and_route_params() {
        let app: Router = Router::new().route("/users/{id}", handler(echo()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/users/42?expand=posts&id=ignored")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "id": "42", "expand": "posts" })
        );
    }

    #[tokio::test]
    async fn post_uses_json_body_and_ignores_query() {
        let app: Router = Router::new().route("/users/{id}", handler(echo()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users/7?ignored=1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"ada"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            body_json(response).await,
            json!({ "id": "7", "name": "ada" })
        );
    }

    #[tokio::test]
    async fn validation_failure_is_bad_request() {
        let bp = echo().validate_input(Schema::object().required("name", FieldRule::NonEmptyString));
        let app: Router = Router::new().route("/users", handler(bp));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users")
                    .body(Body::from(r#"{"name":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["issues"][0]["path"], json!("name"));
    }

    #[tokio::test]
    async fn unimplemented_is_not_implemented() {
        let app: Router = Router::new().route("/todo", handler(Blueprint::new().named("todo")));
        let response = app
            .oneshot(Request::builder().uri("/todo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn void_blueprint_returns_null() {
        let app: Router = Router::new().route("/fire", handler(echo().to_void()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/fire")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, Value::Null);
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = request_input(
            &Method::PUT,
            HashMap::new(),
            HashMap::new(),
            &Bytes::from_static(b"[1,2]"),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }
}
