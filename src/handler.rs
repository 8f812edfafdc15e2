//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of *different* closure types in one tree, and
//! middleware has to wrap any of them in yet another closure. Both problems
//! are solved the same way: every handler is erased behind `dyn Handler` and
//! shared through an `Arc`.
//!
//! ```text
//! |req, res, cx| { … }                   ← user writes this
//!        ↓ router.get("/", …)
//! Arc::new(closure)                      ← BoxedHandler = Arc<dyn Handler>
//!        ↓ middleware::compose
//! mw.wrap(next) → Arc<dyn Handler>       ← each layer owns the next one
//!        ↓
//! chain.call(&req, &mut res, &mut cx)    ← one vtable call per layer
//! ```
//!
//! Handlers are synchronous. The request body is already buffered when the
//! chain runs and nothing in dispatch ever suspends.

use std::sync::Arc;

use crate::context::Context;
use crate::request::Request;
use crate::response::Response;

/// A request handler: reads the request, writes the response.
///
/// Implemented for every `Fn(&Request, &mut Response, &mut Context)` that is
/// `Send + Sync + 'static`, which is what every closure or `fn` item passed to
/// the router ends up being.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &Request, res: &mut Response, cx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
{
    fn call(&self, req: &Request, res: &mut Response, cx: &mut Context) {
        self(req, res, cx)
    }
}

/// A type-erased handler shared across concurrent requests.
///
/// Cloning is one atomic increment.
pub type BoxedHandler = Arc<dyn Handler>;

/// Boxes a closure as a [`BoxedHandler`].
///
/// The explicit `Fn` bound lets the compiler infer the closure's argument
/// types, which a bare `Arc::new(|req, res, cx| …)` cannot do:
///
/// ```rust
/// use sprig::handler_fn;
///
/// let h = handler_fn(|_req, res, cx| {
///     res.text(cx.param("id").unwrap_or("none"));
/// });
/// ```
pub fn handler_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}
