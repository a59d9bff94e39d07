use crate::addon::AddonTable;
use crate::engine::Outcome;
use crate::error::Result;
use crate::validate::Validator;
use serde_json::{Map, Value};
use std::sync::Arc;

pub(crate) type Logic = Arc<dyn Fn(Value) -> Outcome + Send + Sync>;
pub(crate) type InputMapper = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;
pub(crate) type OutputMapper = Arc<dyn Fn(Value, &Value) -> Result<Value> + Send + Sync>;
pub(crate) type BeforeHook = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;
pub(crate) type AfterHook = Arc<dyn Fn(&Value, &Value) -> Result<()> + Send + Sync>;

/// Informational name of a blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub key: Option<String>,
    pub description: Option<String>,
}

/// One entry of the defaults list.
#[derive(Clone)]
pub(crate) enum DefaultProvider {
    Static(Map<String, Value>),
    Computed(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

/// A validator plus its enable flag.
#[derive(Clone)]
pub(crate) struct ValidatorSlot {
    pub(crate) validator: Arc<dyn Validator>,
    pub(crate) enabled: bool,
}

impl ValidatorSlot {
    pub(crate) fn active(&self) -> Option<&Arc<dyn Validator>> {
        self.enabled.then_some(&self.validator)
    }
}

/// Configuration captured by a [`Blueprint`](crate::Blueprint).
///
/// Never mutated once wrapped in an `Arc`; chain methods clone it, change one
/// field and wrap the copy.
#[derive(Clone, Default)]
pub(crate) struct BlueprintState {
    pub(crate) identity: Identity,
    pub(crate) logic: Option<Logic>,
    /// Most recently added first.
    pub(crate) input_mappers: Vec<InputMapper>,
    pub(crate) output_mappers: Vec<OutputMapper>,
    pub(crate) defaults: Vec<DefaultProvider>,
    pub(crate) enforced: Map<String, Value>,
    pub(crate) before_hooks: Vec<BeforeHook>,
    pub(crate) after_hooks: Vec<AfterHook>,
    pub(crate) is_async: bool,
    pub(crate) is_void: bool,
    pub(crate) input_validator: Option<ValidatorSlot>,
    pub(crate) result_validator: Option<ValidatorSlot>,
    pub(crate) addons: AddonTable,
}

impl BlueprintState {
    /// A composition stage: keeps identity, flags and addons, drops every list.
    pub(crate) fn composed(&self, logic: Logic) -> Self {
        Self {
            identity: self.identity.clone(),
            logic: Some(logic),
            is_async: self.is_async,
            is_void: self.is_void,
            addons: self.addons.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn key(&self) -> Option<&str> {
        self.identity.key.as_deref()
    }
}
