//! Middleware layer.
//!
//! A middleware takes the next handler in the chain and returns a new handler
//! wrapping it. It may run code before and after calling `next`, or never call
//! it at all (authentication failures do this).
//!
//! # Ordering
//!
//! For a matched request the chain is, outermost first:
//!
//! 1. global middleware ([`Router::layer`](crate::Router::layer)), in
//!    registration order
//! 2. subtree middleware ([`Router::layer_at`](crate::Router::layer_at)),
//!    root to leaf, so deeper scopes wrap more tightly
//! 3. route middleware ([`RouteHandle::layer`](crate::RouteHandle::layer)),
//!    in registration order
//! 4. the handler
//!
//! Built-in middleware:
//! - [`basic_auth`]: HTTP Basic credentials, attaches the identity
//! - [`cache`]: `cache-control` / `expires` response headers
//! - [`trace`]: per-request span with method, path, status, latency

pub mod basic_auth;
pub mod cache;
pub mod trace;

use std::sync::Arc;

use crate::handler::BoxedHandler;

pub use basic_auth::{BasicAuth, Credentials};
pub use cache::Cache;
pub use trace::Trace;

/// A handler transformer.
///
/// Implemented for every `Fn(BoxedHandler) -> BoxedHandler`. For closures,
/// go through [`from_fn`] so their argument type can be inferred.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}

/// A type-erased middleware, cheap to clone into a per-request chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Middleware built from a closure. See [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.0)(next)
    }
}

/// Turns a closure into a [`Middleware`].
///
/// ```rust
/// use sprig::{handler_fn, middleware, Router};
///
/// let mut app = Router::new();
/// app.layer(middleware::from_fn(|next| {
///     handler_fn(move |req, res, cx| {
///         res.set_header("x-powered-by", "sprig");
///         next.call(req, res, cx);
///     })
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    FromFn(f)
}

/// Wraps `handler` in `layers`, the first layer outermost.
pub fn compose(layers: &[BoxedMiddleware], handler: BoxedHandler) -> BoxedHandler {
    layers.iter().rev().fold(handler, |next, mw| mw.wrap(next))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Method;

    use super::*;
    use crate::{handler_fn, Context, Request, Response};

    fn tag(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> BoxedMiddleware {
        let log = Arc::clone(log);
        Arc::new(from_fn(move |next: BoxedHandler| {
            let log = Arc::clone(&log);
            handler_fn(move |req, res, cx| {
                log.lock().unwrap().push(format!("{name}>"));
                next.call(req, res, cx);
                log.lock().unwrap().push(format!("<{name}"));
            })
        }))
    }

    #[test]
    fn first_layer_is_outermost() {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&log);
        let handler = handler_fn(move |_, _, _| inner.lock().unwrap().push("handler".into()));

        let chain = compose(&[tag(&log, "a"), tag(&log, "b")], handler);
        chain.call(&Request::new(Method::GET, "/"), &mut Response::new(), &mut Context::new());

        assert_eq!(*log.lock().unwrap(), ["a>", "b>", "handler", "<b", "<a"]);
    }

    #[test]
    fn empty_chain_is_the_handler() {
        let chain = compose(&[], handler_fn(|_, res, _| res.text("bare")));
        let mut res = Response::new();
        chain.call(&Request::new(Method::GET, "/"), &mut res, &mut Context::new());
        assert_eq!(res.body(), b"bare");
    }

    #[test]
    fn short_circuit_skips_next() {
        let stop: BoxedMiddleware = Arc::new(from_fn(|_next: BoxedHandler| {
            handler_fn(|_, res, _| res.error(http::StatusCode::FORBIDDEN))
        }));
        let chain = compose(&[stop], handler_fn(|_, _, _| panic!("handler must not run")));
        let mut res = Response::new();
        chain.call(&Request::new(Method::GET, "/"), &mut res, &mut Context::new());
        assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
    }
}
