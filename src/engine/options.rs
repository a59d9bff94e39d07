use crate::engine::state::Logic;
use crate::engine::{Blueprint, Outcome};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Options form of [`create_with`](crate::create_with).
///
/// `key` and `description` deserialize, so identities can live in
/// configuration files; the initial logic is attached in code.
///
/// ```
/// use blueprint::BlueprintOptions;
///
/// let options: BlueprintOptions =
///     serde_json::from_str(r#"{ "key": "users.find", "description": "Find a user" }"#).unwrap();
/// assert_eq!(options.key.as_deref(), Some("users.find"));
/// ```
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlueprintOptions {
    pub key: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    logic: Option<Logic>,
}

impl BlueprintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Initial synchronous logic.
    pub fn logic<F>(mut self, logic: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        let logic: Logic = Arc::new(move |input: Value| Outcome::Ready(logic(input)));
        self.logic = Some(logic);
        self
    }

    pub(crate) fn build(self) -> Blueprint {
        Blueprint::new().derive(|state| {
            state.identity.key = self.key;
            state.identity.description = self.description;
            state.logic = self.logic;
        })
    }
}

impl std::fmt::Debug for BlueprintOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlueprintOptions")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("logic", &self.logic.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
