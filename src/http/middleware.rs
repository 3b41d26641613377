//! Generated per-provider request middleware.
//!
//! Each registered provider yields one [`ContextLayer`]. Per request the
//! generated service runs the fixed sequence: extract once, store the value
//! in the request's [`ContextBag`] and in the provider's task-local slot,
//! call downstream, decorate the response (success only), and reset the
//! slot unconditionally before returning. Downstream errors pass through
//! untouched; they are never caught, converted, or logged here.
//!
//! Timing providers additionally emit the access-log event after the
//! measured value is re-bound and before the reset, so the access line
//! carries the real duration.
//!
//! The first context layer on the inbound path establishes the task-local
//! scope for the whole request task; layers nested inside it join the
//! existing scope, so all providers of one request share one map.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::context::provider::ContextProvider;
use crate::context::slot;
use crate::http::ContextBag;

/// Tower layer wrapping a service with one provider's request lifecycle.
#[derive(Clone)]
pub struct ContextLayer {
    provider: Arc<dyn ContextProvider>,
}

impl ContextLayer {
    pub fn new(provider: Arc<dyn ContextProvider>) -> Self {
        Self { provider }
    }
}

impl<S> Layer<S> for ContextLayer {
    type Service = ContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ContextService {
            inner,
            provider: self.provider.clone(),
        }
    }
}

/// Service generated by [`ContextLayer`].
#[derive(Clone)]
pub struct ContextService<S> {
    inner: S,
    provider: Arc<dyn ContextProvider>,
}

impl<S> Service<Request<Body>> for ContextService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness and leave its clone
        // behind, per the tower middleware convention.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let provider = self.provider.clone();

        Box::pin(async move {
            if slot::in_scope() {
                dispatch(provider, inner, request).await
            } else {
                slot::scope(dispatch(provider, inner, request)).await
            }
        })
    }
}

async fn dispatch<S>(
    provider: Arc<dyn ContextProvider>,
    mut inner: S,
    mut request: Request<Body>,
) -> Result<Response, S::Error>
where
    S: Service<Request<Body>, Response = Response>,
{
    let started = Instant::now();
    let value = provider.extract(&request);

    if request.extensions().get::<ContextBag>().is_none() {
        request.extensions_mut().insert(ContextBag::new());
    }
    if let Some(bag) = request.extensions_mut().get_mut::<ContextBag>() {
        bag.set(provider.name(), value.clone());
    }

    let slot = provider.slot();
    slot.bind(value.clone());

    let result = match inner.call(request).await {
        Ok(mut response) => {
            // Timing providers re-bind the measured value and emit the
            // access-log event themselves: the window between downstream
            // completion and reset is the only point where the generated
            // filters can read the measurement.
            if let Some(measured) = provider.observe_elapsed(started.elapsed()) {
                slot.bind(measured.clone());
                tracing::info!(
                    target: "tower_http::trace",
                    status = response.status().as_u16(),
                    response_time_ms = %measured,
                    "request completed"
                );
            }
            provider.decorate_response(response.headers_mut(), &value);
            Ok(response)
        }
        Err(err) => Err(err),
    };

    // Unconditional, on both paths: no request leaves context state behind
    // for whatever logically reuses this storage next.
    slot.reset();
    result
}
