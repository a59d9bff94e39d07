//! The fixed stage sequence run by every invocation.
//!
//! ```text
//! raw input
//!   → defaults → enforcement → input mapping → input validation → before hooks
//!   → logic → async normalization
//!   → output mapping → result validation → after hooks → void collapse
//!   → returned value
//! ```
//!
//! Everything up to the logic runs synchronously. The tail runs inline when
//! the logic settles immediately and after resolution when it defers.

use crate::engine::Outcome;
use crate::engine::state::{BlueprintState, DefaultProvider};
use crate::error::{BlueprintError, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumIter};

/// Names of the invocation stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Defaults,
    Enforcement,
    InputMapping,
    InputValidation,
    BeforeHooks,
    Logic,
    AsyncNormalization,
    OutputMapping,
    ResultValidation,
    AfterHooks,
    VoidCollapse,
}

pub(crate) fn invoke(state: Arc<BlueprintState>, raw: Value) -> Outcome {
    tracing::debug!(key = state.key().unwrap_or("<anonymous>"), "invoking blueprint");

    let input = match prepare_input(&state, raw) {
        Ok(input) => input,
        Err(err) => return Outcome::Ready(Err(err)),
    };

    let Some(logic) = state.logic.clone() else {
        let err = BlueprintError::Unimplemented {
            key: state.identity.key.clone(),
        };
        stage_failed(&state, Stage::Logic, Some(&input), &err);
        return Outcome::Ready(Err(err));
    };

    let mut outcome = logic(input.clone());
    if state.is_async && !outcome.is_deferred() {
        tracing::trace!(stage = %Stage::AsyncNormalization, "deferring settled result");
        outcome = outcome.into_deferred();
    }

    outcome.map_result(move |result| match result {
        Ok(value) => finish(&state, value, &input),
        Err(err) => {
            stage_failed(&state, Stage::Logic, Some(&input), &err);
            Err(err)
        }
    })
}

/// Every stage before the logic.
fn prepare_input(state: &BlueprintState, raw: Value) -> Result<Value> {
    let mut value = apply_defaults(state, raw);

    for mapper in &state.input_mappers {
        value = mapper(value).inspect_err(|err| stage_failed(state, Stage::InputMapping, None, err))?;
    }

    if let Some(validator) = state.input_validator.as_ref().and_then(|slot| slot.active()) {
        value = validator.parse(value).map_err(|issues| {
            let err = BlueprintError::InputValidation(issues);
            stage_failed(state, Stage::InputValidation, None, &err);
            err
        })?;
    }

    for hook in &state.before_hooks {
        hook(&value).inspect_err(|err| stage_failed(state, Stage::BeforeHooks, Some(&value), err))?;
    }

    Ok(value)
}

/// Defaults, caller input and enforced values, in that order of precedence
/// (last wins). Non-record input skips this entirely; `null` counts as an
/// empty record once there is anything to merge.
fn apply_defaults(state: &BlueprintState, raw: Value) -> Value {
    let merges = !state.defaults.is_empty() || !state.enforced.is_empty();

    let caller = match raw {
        Value::Object(map) => map,
        Value::Null if merges => Map::new(),
        other => {
            if merges {
                tracing::debug!(
                    key = state.key().unwrap_or("<anonymous>"),
                    stage = %Stage::Defaults,
                    "non-record input bypasses defaults and enforcement"
                );
            }
            return other;
        }
    };

    let mut resolved = Map::new();
    for provider in &state.defaults {
        let partial = match provider {
            DefaultProvider::Static(values) => values.clone(),
            DefaultProvider::Computed(compute) => {
                let mut so_far = resolved.clone();
                merge(&mut so_far, caller.clone());
                match compute(&Value::Object(so_far)) {
                    Value::Object(values) => values,
                    Value::Null => Map::new(),
                    other => {
                        tracing::warn!(
                            key = state.key().unwrap_or("<anonymous>"),
                            stage = %Stage::Defaults,
                            value = %other,
                            "default provider returned a non-record value, ignored"
                        );
                        Map::new()
                    }
                }
            }
        };
        merge(&mut resolved, partial);
    }

    merge(&mut resolved, caller);
    merge(&mut resolved, state.enforced.clone());
    Value::Object(resolved)
}

/// Every stage after async normalization.
fn finish(state: &BlueprintState, mut result: Value, input: &Value) -> Result<Value> {
    for mapper in &state.output_mappers {
        result = mapper(result, input)
            .inspect_err(|err| stage_failed(state, Stage::OutputMapping, Some(input), err))?;
    }

    if let Some(validator) = state.result_validator.as_ref().and_then(|slot| slot.active()) {
        result = validator.parse(result).map_err(|issues| {
            let err = BlueprintError::ResultValidation(issues);
            stage_failed(state, Stage::ResultValidation, Some(input), &err);
            err
        })?;
    }

    for hook in &state.after_hooks {
        hook(&result, input)
            .inspect_err(|err| stage_failed(state, Stage::AfterHooks, Some(&result), err))?;
    }

    if state.is_void {
        tracing::trace!(stage = %Stage::VoidCollapse, "discarding result");
        return Ok(Value::Null);
    }
    Ok(result)
}

fn merge(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Mappers and validators consume their value, so their failures are logged
/// without it; output stages log the input instead.
fn stage_failed(state: &BlueprintState, stage: Stage, value: Option<&Value>, err: &BlueprintError) {
    let key = state.key().unwrap_or("<anonymous>");
    match value {
        Some(value) => tracing::warn!(key, stage = %stage, value = %value, error = %err, "blueprint stage failed"),
        None => tracing::warn!(key, stage = %stage, error = %err, "blueprint stage failed"),
    }
}
