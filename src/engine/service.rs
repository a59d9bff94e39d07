use crate::engine::Blueprint;
use crate::error::{BlueprintError, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::IntoFuture;
use std::task::{Context, Poll};
use tower::Service;

/// Lets a blueprint sit anywhere a `tower::Service` is expected.
impl Service<Value> for Blueprint {
    type Response = Value;
    type Error = BlueprintError;
    type Future = BoxFuture<'static, Result<Value>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, input: Value) -> Self::Future {
        Blueprint::call(self, input).into_future()
    }
}
