//! Observable invocation state for rendering layers.
//!
//! [`Reactive`] binds a blueprint to an input and publishes
//! `loading` / `result` / `error` through a `tokio::sync::watch` channel.
//! Failures end up in the state instead of being returned to the caller of
//! [`Reactive::trigger`].

use crate::engine::Blueprint;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

/// Snapshot published after every state change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReactiveState {
    pub loading: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

/// A blueprint bound to an input, with observable invocation state.
pub struct Reactive {
    blueprint: Blueprint,
    input: Value,
    state: watch::Sender<ReactiveState>,
}

impl Reactive {
    pub fn new(blueprint: Blueprint, input: Value) -> Self {
        let (state, _) = watch::channel(ReactiveState::default());
        Self {
            blueprint,
            input,
            state,
        }
    }

    pub fn state(&self) -> ReactiveState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReactiveState> {
        self.state.subscribe()
    }

    /// Invoke with `input`, or the bound input when `None`, and return the
    /// settled state. A failure keeps the previous result.
    pub async fn trigger(&self, input: Option<Value>) -> ReactiveState {
        let input = input.unwrap_or_else(|| self.input.clone());
        self.state.send_modify(|state| state.loading = true);

        let settled = self.blueprint.call(input).await;

        self.state.send_modify(|state| {
            state.loading = false;
            match settled {
                Ok(result) => {
                    state.result = Some(result);
                    state.error = None;
                }
                Err(err) => {
                    tracing::debug!(
                        key = self.blueprint.key().unwrap_or("<anonymous>"),
                        error = %err,
                        "reactive trigger captured failure"
                    );
                    state.error = Some(err.to_string());
                }
            }
        });
        self.state()
    }
}
