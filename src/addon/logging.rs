use crate::addon::{Addon, AddonMethod, method};
use crate::engine::Blueprint;
use crate::error::Result;
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// Adds a `"logged"` method that records timing and outcome of every
/// invocation.
///
/// The optional argument `{ "label": "..." }` names the log lines; it falls
/// back to the blueprint key.
#[derive(Clone, Default)]
pub struct LoggingAddon;

impl Addon for LoggingAddon {
    fn name(&self) -> &str {
        "logging"
    }

    fn methods(&self) -> Vec<(String, AddonMethod)> {
        vec![("logged".to_string(), method(logged))]
    }
}

fn logged(blueprint: &Blueprint, args: Value) -> Result<Blueprint> {
    let label = args
        .get("label")
        .and_then(Value::as_str)
        .or(blueprint.key())
        .unwrap_or("blueprint")
        .to_string();

    Ok(blueprint.wrap(move |inner, input| {
        let id = Uuid::new_v4();
        let label = label.clone();
        let start = Instant::now();
        tracing::info!(%id, label = %label, "--> invoke");

        inner.call(input).map_result(move |result| {
            let elapsed = start.elapsed();
            match &result {
                Ok(_) => tracing::info!(%id, label = %label, ?elapsed, "<-- ok"),
                Err(err) => tracing::error!(%id, label = %label, ?elapsed, error = %err, "<-- failed"),
            }
            result
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use serde_json::json;

    #[test]
    fn logged_blueprint_behaves_like_the_original() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let bp = create(|v| Ok(json!(v.as_i64().unwrap_or(0) + 1)))
            .named("inc")
            .input(|v| Ok(json!(v.as_i64().unwrap_or(0) * 10)))
            .addon(LoggingAddon);

        let logged = bp.call_method("logged", Value::Null).unwrap();
        assert_eq!(logged.call(json!(2)).into_ready().unwrap().unwrap(), json!(21));
        assert_eq!(logged.key(), Some("inc"));
    }

    #[tokio::test]
    async fn logged_failures_still_propagate() {
        let bp = create(|_| Err(crate::BlueprintError::failed("nope"))).addon(LoggingAddon);
        let logged = bp
            .call_method("logged", json!({ "label": "failing" }))
            .unwrap();
        assert_eq!(logged.call(json!({})).await.unwrap_err().to_string(), "nope");
    }
}
