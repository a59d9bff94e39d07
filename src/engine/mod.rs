//! The pipeline engine.
//!
//! A [`Blueprint`] is an immutable, cheaply clonable callable. Every chain
//! method reads the current configuration and returns a *new* blueprint, so a
//! base blueprint can serve as a template for any number of specializations:
//!
//! ```
//! use blueprint::{create, Blueprint};
//! use serde_json::{json, Value};
//!
//! let sum = create(|input: Value| Ok(json!(input["a"].as_i64().unwrap_or(0) + input["b"].as_i64().unwrap_or(0))))
//!     .defaults(json!({ "b": 2 }));
//! let fixed = sum.enforce(json!({ "b": 100 }));
//!
//! assert_eq!(sum.call(json!({ "a": 5 })).into_ready().unwrap().unwrap(), json!(7));
//! assert_eq!(fixed.call(json!({ "a": 5, "b": 10 })).into_ready().unwrap().unwrap(), json!(105));
//! ```
//!
//! See [`invoke`] for the order in which the configured stages run.

use crate::error::Result;
use crate::validate::Validator;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub mod invoke;
mod options;
mod outcome;
mod service;
pub(crate) mod state;

pub use invoke::Stage;
pub use options::BlueprintOptions;
pub use outcome::Outcome;
pub use state::Identity;

use state::{BlueprintState, DefaultProvider, Logic, ValidatorSlot};

/// Build a blueprint around synchronous logic.
pub fn create<F>(logic: F) -> Blueprint
where
    F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
{
    Blueprint::new().implement(logic)
}

/// Build a blueprint from [`BlueprintOptions`].
pub fn create_with(options: BlueprintOptions) -> Blueprint {
    options.build()
}

/// An immutable pipeline around a late-bound implementation.
///
/// Clones share the same configuration; chain methods return new blueprints.
#[derive(Clone, Default)]
pub struct Blueprint {
    state: Arc<BlueprintState>,
}

impl Blueprint {
    /// An unimplemented blueprint. Invoking it fails until
    /// [`implement`](Self::implement) is called on a derived blueprint.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: BlueprintState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub(crate) fn state(&self) -> &BlueprintState {
        &self.state
    }

    /// Copy the state, apply one change, wrap the copy.
    pub(crate) fn derive(&self, change: impl FnOnce(&mut BlueprintState)) -> Self {
        let mut next = (*self.state).clone();
        change(&mut next);
        Self::from_state(next)
    }

    pub fn identity(&self) -> &Identity {
        &self.state.identity
    }

    pub fn key(&self) -> Option<&str> {
        self.state.key()
    }

    pub fn is_implemented(&self) -> bool {
        self.state.logic.is_some()
    }

    pub fn is_async(&self) -> bool {
        self.state.is_async
    }

    pub fn is_void(&self) -> bool {
        self.state.is_void
    }

    /// Run the stage sequence on `input`.
    pub fn call(&self, input: Value) -> Outcome {
        invoke::invoke(Arc::clone(&self.state), input)
    }

    /// Invoke and deserialize the final value.
    pub async fn call_as<O: DeserializeOwned>(&self, input: Value) -> Result<O> {
        let value = self.call(input).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn named(&self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.derive(|state| state.identity.key = Some(key))
    }

    pub fn describe(&self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.derive(|state| state.identity.description = Some(description))
    }

    pub fn implement<F>(&self, logic: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.implement_outcome(move |input| Outcome::Ready(logic(input)))
    }

    pub fn implement_async<F, Fut>(&self, logic: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.implement_outcome(move |input| Outcome::deferred(logic(input)))
    }

    /// Logic that decides per call whether to settle now or defer.
    pub fn implement_outcome<F>(&self, logic: F) -> Self
    where
        F: Fn(Value) -> Outcome + Send + Sync + 'static,
    {
        let logic: Logic = Arc::new(logic);
        self.derive(|state| state.logic = Some(logic))
    }

    /// Logic over typed input and output; (de)serialization failures are
    /// logic errors.
    pub fn implement_typed<I, O, F>(&self, logic: F) -> Self
    where
        I: DeserializeOwned,
        O: Serialize,
        F: Fn(I) -> Result<O> + Send + Sync + 'static,
    {
        self.implement(move |input| {
            let typed: I = serde_json::from_value(input)?;
            let output = logic(typed)?;
            Ok(serde_json::to_value(output)?)
        })
    }

    /// Hand this blueprint to `factory` and return whatever it builds.
    ///
    /// This is how wrappers are written: the factory typically returns
    /// [`wrap`](Self::wrap) or re-implements a derived blueprint.
    ///
    /// ```
    /// use blueprint::{create, Blueprint};
    /// use serde_json::{json, Value};
    ///
    /// let double = create(|v: Value| Ok(json!(v.as_i64().unwrap_or(0) * 2)));
    /// let plus_one = double.modify(|inner: Blueprint| {
    ///     inner.wrap(|original, v| original.call(v).then(|r| Ok(json!(r.as_i64().unwrap_or(0) + 1))))
    /// });
    /// assert_eq!(plus_one.call(json!(4)).into_ready().unwrap().unwrap(), json!(9));
    /// ```
    pub fn modify<F>(&self, factory: F) -> Self
    where
        F: FnOnce(Blueprint) -> Blueprint,
    {
        factory(self.clone())
    }

    /// Add an input transform. The transform added last runs first.
    pub fn input<F>(&self, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.derive(|state| state.input_mappers.insert(0, Arc::new(transform)))
    }

    /// Add static defaults. Later defaults override earlier ones; the caller
    /// overrides both. Values that are not records are ignored.
    pub fn defaults(&self, values: Value) -> Self {
        match values {
            Value::Object(values) => {
                self.derive(|state| state.defaults.push(DefaultProvider::Static(values)))
            }
            Value::Null => self.derive(|_| {}),
            other => {
                tracing::warn!(value = %other, "defaults must be a record, ignored");
                self.derive(|_| {})
            }
        }
    }

    /// Add defaults computed from the props resolved so far.
    pub fn defaults_with<F>(&self, provider: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.derive(|state| {
            state
                .defaults
                .push(DefaultProvider::Computed(Arc::new(provider)))
        })
    }

    /// Fix input fields regardless of caller input and defaults.
    pub fn enforce(&self, values: Value) -> Self {
        match values {
            Value::Object(values) => self.derive(|state| state.enforced.extend(values)),
            Value::Null => self.derive(|_| {}),
            other => {
                tracing::warn!(value = %other, "enforced values must be a record, ignored");
                self.derive(|_| {})
            }
        }
    }

    /// Add a result transform. Transforms run in the order added and see the
    /// validated input.
    pub fn output<F>(&self, transform: F) -> Self
    where
        F: Fn(Value, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.derive(|state| state.output_mappers.push(Arc::new(transform)))
    }

    pub fn before<F>(&self, hook: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        self.derive(|state| state.before_hooks.push(Arc::new(hook)))
    }

    /// Observe `(result, input)` after result validation.
    pub fn after<F>(&self, hook: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<()> + Send + Sync + 'static,
    {
        self.derive(|state| state.after_hooks.push(Arc::new(hook)))
    }

    pub fn to_async(&self) -> Self {
        self.derive(|state| state.is_async = true)
    }

    /// Discard the final value; invocations yield `null`.
    pub fn to_void(&self) -> Self {
        self.derive(|state| state.is_void = true)
    }

    /// Attach (or replace) the input validator and enable it.
    pub fn validate_input<V: Validator>(&self, validator: V) -> Self {
        let slot = ValidatorSlot {
            validator: Arc::new(validator),
            enabled: true,
        };
        self.derive(|state| state.input_validator = Some(slot))
    }

    /// Attach (or replace) the result validator and enable it.
    pub fn validate_result<V: Validator>(&self, validator: V) -> Self {
        let slot = ValidatorSlot {
            validator: Arc::new(validator),
            enabled: true,
        };
        self.derive(|state| state.result_validator = Some(slot))
    }

    /// Toggle input validation without touching the attached validator.
    pub fn input_validation(&self, enabled: bool) -> Self {
        self.derive(|state| {
            if let Some(slot) = state.input_validator.as_mut() {
                slot.enabled = enabled;
            }
        })
    }

    pub fn result_validation(&self, enabled: bool) -> Self {
        self.derive(|state| {
            if let Some(slot) = state.result_validator.as_mut() {
                slot.enabled = enabled;
            }
        })
    }

    /// Feed this blueprint's settled result into `next`.
    ///
    /// The composition starts with empty mapper, hook and validator lists and
    /// inherits this blueprint's identity, async/void flags and addons.
    pub fn pipe(&self, next: &Blueprint) -> Self {
        let next = next.clone();
        self.pipe_outcome(move |value| next.call(value))
    }

    pub fn pipe_fn<F>(&self, next: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.pipe_outcome(move |value| Outcome::Ready(next(value)))
    }

    fn pipe_outcome<F>(&self, next: F) -> Self
    where
        F: Fn(Value) -> Outcome + Send + Sync + 'static,
    {
        let next = Arc::new(next);
        self.wrap(move |head, input| {
            let next = Arc::clone(&next);
            head.call(input).and_then(move |value| next(value))
        })
    }

    /// A new blueprint whose logic is `around(self, input)`.
    ///
    /// Like a pipe composition, the wrapper starts with empty mapper, hook and
    /// validator lists, so the wrapped blueprint's own stages run exactly once.
    pub fn wrap<F>(&self, around: F) -> Self
    where
        F: Fn(&Blueprint, Value) -> Outcome + Send + Sync + 'static,
    {
        let inner = self.clone();
        let logic: Logic = Arc::new(move |input: Value| around(&inner, input));
        Self::from_state(self.state.composed(logic))
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = &self.state;
        f.debug_struct("Blueprint")
            .field("identity", &state.identity)
            .field("implemented", &state.logic.is_some())
            .field("input_mappers", &state.input_mappers.len())
            .field("output_mappers", &state.output_mappers.len())
            .field("defaults", &state.defaults.len())
            .field("enforced", &state.enforced)
            .field("before_hooks", &state.before_hooks.len())
            .field("after_hooks", &state.after_hooks.len())
            .field("is_async", &state.is_async)
            .field("is_void", &state.is_void)
            .field("addons", &state.addons.names())
            .finish()
    }
}
