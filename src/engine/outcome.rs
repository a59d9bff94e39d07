use crate::error::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::{Future, IntoFuture};

/// Value produced by invoking a blueprint.
///
/// Synchronous pipelines settle immediately (`Ready`); pipelines whose logic is
/// asynchronous, or that were converted with `to_async`, hand back a
/// `Deferred` future. Either variant can be awaited.
pub enum Outcome {
    Ready(Result<Value>),
    Deferred(BoxFuture<'static, Result<Value>>),
}

impl Outcome {
    pub fn ok(value: Value) -> Self {
        Outcome::Ready(Ok(value))
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Outcome::Deferred(future.boxed())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Outcome::Deferred(_))
    }

    /// The settled result, or `None` for a deferred outcome.
    pub fn into_ready(self) -> Option<Result<Value>> {
        match self {
            Outcome::Ready(result) => Some(result),
            Outcome::Deferred(_) => None,
        }
    }

    /// Wrap a settled result in a future; deferred outcomes pass through.
    pub(crate) fn into_deferred(self) -> Self {
        match self {
            Outcome::Ready(result) => Outcome::Deferred(futures::future::ready(result).boxed()),
            deferred => deferred,
        }
    }

    /// Apply `f` to the settled result, inline or after resolution.
    pub fn map_result<F>(self, f: F) -> Outcome
    where
        F: FnOnce(Result<Value>) -> Result<Value> + Send + 'static,
    {
        match self {
            Outcome::Ready(result) => Outcome::Ready(f(result)),
            Outcome::Deferred(future) => Outcome::Deferred(async move { f(future.await) }.boxed()),
        }
    }

    /// Continue with `next` once this outcome settles successfully.
    ///
    /// Runs inline for `Ready`, after resolution for `Deferred`. Failures
    /// short-circuit without calling `next`.
    pub fn then<F>(self, next: F) -> Outcome
    where
        F: FnOnce(Value) -> Result<Value> + Send + 'static,
    {
        self.map_result(|result| result.and_then(next))
    }

    /// Like [`Outcome::then`], but the continuation may itself defer.
    pub fn and_then<F>(self, next: F) -> Outcome
    where
        F: FnOnce(Value) -> Outcome + Send + 'static,
    {
        match self {
            Outcome::Ready(Ok(value)) => next(value),
            Outcome::Ready(Err(err)) => Outcome::Ready(Err(err)),
            Outcome::Deferred(future) => Outcome::Deferred(
                async move {
                    let value = future.await?;
                    next(value).await
                }
                .boxed(),
            ),
        }
    }
}

impl From<Result<Value>> for Outcome {
    fn from(result: Result<Value>) -> Self {
        Outcome::Ready(result)
    }
}

impl IntoFuture for Outcome {
    type Output = Result<Value>;
    type IntoFuture = BoxFuture<'static, Result<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Outcome::Ready(result) => futures::future::ready(result).boxed(),
            Outcome::Deferred(future) => future,
        }
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Outcome::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlueprintError;
    use serde_json::json;

    #[test]
    fn then_runs_inline_when_ready() {
        let out = Outcome::ok(json!(2)).then(|v| Ok(json!(v.as_i64().unwrap() * 10)));
        assert_eq!(out.into_ready().unwrap().unwrap(), json!(20));
    }

    #[tokio::test]
    async fn then_waits_for_deferred() {
        let out = Outcome::deferred(async { Ok(json!("a")) })
            .then(|v| Ok(json!(format!("{}b", v.as_str().unwrap()))));
        assert!(out.is_deferred());
        assert_eq!(out.await.unwrap(), json!("ab"));
    }

    #[tokio::test]
    async fn rejection_skips_continuation() {
        let out = Outcome::deferred(async { Err(BlueprintError::failed("boom")) })
            .then(|_| panic!("continuation must not run"));
        assert_eq!(out.await.unwrap_err().to_string(), "boom");
    }
}
