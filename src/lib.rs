//! # Blueprint
//!
//! Immutable, chainable function pipelines.
//!
//! A [`Blueprint`] is built up step by step (implementation, input transforms,
//! defaults, enforced values, validation, hooks, async/void conversion,
//! piping) without committing to a concrete implementation until late. Every
//! chain call returns a new blueprint and leaves the receiver untouched, so a
//! base blueprint doubles as a template.
//!
//! ## Features
//!
//! - **Fixed stage order**: defaults → enforcement → input mapping → input
//!   validation → before hooks → logic → async normalization → output mapping
//!   → result validation → after hooks → void collapse
//! - **Copy-on-write state**: each chain method copies the configuration and
//!   changes one field
//! - **Pluggable validation**: anything implementing [`Validator`]
//! - **Addons**: named method tables merged onto a blueprint
//! - **Adapters**: axum routes ([`web`]), HTTP requests ([`fetch`]) and
//!   observable state for UIs ([`reactive`])
//!
//! ## Quick Start
//!
//! ```rust
//! use blueprint::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> blueprint::Result<()> {
//! let greet = Blueprint::new()
//!     .named("greet")
//!     .defaults(json!({ "greeting": "hello" }))
//!     .validate_input(Schema::object().required("name", FieldRule::NonEmptyString))
//!     .implement(|input| {
//!         Ok(json!(format!("{} {}", input["greeting"].as_str().unwrap_or(""), input["name"].as_str().unwrap_or(""))))
//!     })
//!     .output(|result, _input| Ok(json!(result.as_str().unwrap_or("").to_uppercase())));
//!
//! let shout = greet.to_async();
//!
//! assert_eq!(greet.call(json!({ "name": "ada" })).await?, json!("HELLO ADA"));
//! assert!(shout.call(json!({ "name": "ada" })).is_deferred());
//! assert!(greet.call(json!({ "name": "" })).await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod addon;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod reactive;
pub mod validate;
pub mod web;

// Re-export core types
pub use addon::{Addon, AddonMethod, LoggingAddon};
pub use engine::{Blueprint, BlueprintOptions, Identity, Outcome, Stage, create, create_with};
pub use error::{BlueprintError, Result};
pub use validate::{ValidationError, ValidationIssue, Validator};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use serde_json;

/// Prelude module for convenient imports
///
/// ```
/// use blueprint::prelude::*;
/// ```
pub mod prelude {
    pub use crate::addon::{Addon, AddonMethod, LoggingAddon, method};
    pub use crate::engine::{
        Blueprint, BlueprintOptions, Identity, Outcome, Stage, create, create_with,
    };
    pub use crate::error::{BlueprintError, Result};
    pub use crate::fetch::{FetchAddon, FetchConfig, FetchRequest, HttpTransport, create_fetch, fetch};
    #[cfg(feature = "fetch")]
    pub use crate::fetch::ReqwestTransport;
    pub use crate::reactive::{Reactive, ReactiveState};
    pub use crate::validate::{FieldRule, Schema, ValidationError, ValidationIssue, Validator};
    pub use crate::web::handler;
    pub use async_trait::async_trait;
    pub use serde_json::Value;
}
