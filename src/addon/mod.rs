//! Capability bundles attached to a blueprint.
//!
//! An [`Addon`] contributes a table of named methods. Attaching it with
//! [`Blueprint::addon`] merges that table into a copy of the blueprint's own;
//! on a name clash the most recently attached addon wins. Methods receive the
//! blueprint they are called on, so they compose with every chain method:
//!
//! ```
//! use blueprint::addon::{method, Addon, AddonMethod};
//! use blueprint::{create, Blueprint};
//! use serde_json::{json, Value};
//!
//! struct Scale;
//!
//! impl Addon for Scale {
//!     fn name(&self) -> &str {
//!         "scale"
//!     }
//!
//!     fn methods(&self) -> Vec<(String, AddonMethod)> {
//!         vec![(
//!             "times".to_string(),
//!             method(|bp: &Blueprint, args: Value| {
//!                 let factor = args.as_i64().unwrap_or(1);
//!                 Ok(bp.output(move |r, _| Ok(json!(r.as_i64().unwrap_or(0) * factor))))
//!             }),
//!         )]
//!     }
//! }
//!
//! let bp = create(|v: Value| Ok(v)).addon(Scale);
//! let tripled = bp.call_method("times", json!(3)).unwrap();
//! assert_eq!(tripled.call(json!(2)).into_ready().unwrap().unwrap(), json!(6));
//! ```

use crate::engine::Blueprint;
use crate::error::{BlueprintError, Result};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod logging;

pub use logging::LoggingAddon;

/// A method contributed by an addon.
pub type AddonMethod = Arc<dyn Fn(&Blueprint, Value) -> Result<Blueprint> + Send + Sync>;

/// Wrap a closure as an [`AddonMethod`].
pub fn method<F>(f: F) -> AddonMethod
where
    F: Fn(&Blueprint, Value) -> Result<Blueprint> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A named bundle of blueprint methods.
pub trait Addon: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn methods(&self) -> Vec<(String, AddonMethod)>;
}

#[derive(Clone)]
struct Attached {
    name: String,
    addon: Arc<dyn Any + Send + Sync>,
}

#[derive(Clone)]
struct Entry {
    owner: String,
    method: AddonMethod,
}

/// Addons and merged methods carried by a blueprint's state.
#[derive(Clone, Default)]
pub(crate) struct AddonTable {
    attached: Vec<Attached>,
    methods: BTreeMap<String, Entry>,
}

impl AddonTable {
    fn attach<A: Addon>(&mut self, addon: A) {
        let name = addon.name().to_string();
        for (method_name, method) in addon.methods() {
            let entry = Entry {
                owner: name.clone(),
                method,
            };
            if let Some(replaced) = self.methods.insert(method_name.clone(), entry) {
                tracing::debug!(
                    method = %method_name,
                    previous = %replaced.owner,
                    current = %name,
                    "addon method replaced"
                );
            }
        }
        self.attached.retain(|a| a.name != name);
        self.attached.push(Attached {
            name,
            addon: Arc::new(addon),
        });
    }

    pub(crate) fn names(&self) -> Vec<&str> {
        self.attached.iter().map(|a| a.name.as_str()).collect()
    }
}

impl Blueprint {
    /// Attach `addon`; its methods override any with the same name.
    pub fn addon<A: Addon>(&self, addon: A) -> Blueprint {
        self.derive(|state| state.addons.attach(addon))
    }

    /// Apply an addon method to this blueprint.
    pub fn call_method(&self, name: &str, args: Value) -> Result<Blueprint> {
        let entry = self.state().addons.methods.get(name).ok_or_else(|| {
            BlueprintError::UnknownMethod {
                name: name.to_string(),
            }
        })?;
        (entry.method)(self, args)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.state().addons.methods.contains_key(name)
    }

    /// Names of attached addons, in attachment order.
    pub fn addons(&self) -> Vec<&str> {
        self.state().addons.names()
    }

    /// The attached addon of type `A`, if any.
    pub fn extension<A: Addon>(&self) -> Option<Arc<A>> {
        self.state()
            .addons
            .attached
            .iter()
            .rev()
            .find_map(|a| a.addon.clone().downcast::<A>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use serde_json::json;

    struct Constant {
        name: &'static str,
        value: i64,
    }

    impl Addon for Constant {
        fn name(&self) -> &str {
            self.name
        }

        fn methods(&self) -> Vec<(String, AddonMethod)> {
            let value = self.value;
            vec![(
                "constant".to_string(),
                method(move |bp: &Blueprint, _| Ok(bp.implement(move |_| Ok(json!(value))))),
            )]
        }
    }

    #[test]
    fn last_attached_addon_wins() {
        let bp = create(|v| Ok(v))
            .addon(Constant {
                name: "one",
                value: 1,
            })
            .addon(Constant {
                name: "two",
                value: 2,
            });

        let out = bp.call_method("constant", Value::Null).unwrap();
        assert_eq!(out.call(json!({})).into_ready().unwrap().unwrap(), json!(2));
        assert_eq!(bp.addons(), vec!["one", "two"]);
    }

    #[test]
    fn reattaching_by_name_replaces_the_record() {
        let bp = Blueprint::new()
            .addon(Constant {
                name: "c",
                value: 1,
            })
            .addon(Constant {
                name: "c",
                value: 5,
            });
        assert_eq!(bp.addons(), vec!["c"]);
        assert_eq!(bp.extension::<Constant>().unwrap().value, 5);
    }

    #[test]
    fn methods_survive_chaining_and_do_not_leak_backwards() {
        let base = create(|v| Ok(v));
        let extended = base.addon(Constant {
            name: "c",
            value: 7,
        });
        let chained = extended.to_async().named("chained");

        assert!(chained.has_method("constant"));
        assert!(!base.has_method("constant"));
        assert!(matches!(
            base.call_method("constant", Value::Null),
            Err(BlueprintError::UnknownMethod { .. })
        ));
    }
}
