//! Registered routes and the handle returned by registration.

use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::middleware::{BoxedMiddleware, Middleware};

/// A handler plus the middleware scoped to exactly this route.
///
/// Owned by the tree node the route's pattern ends at.
pub(crate) struct Route {
    pub(crate) handler: BoxedHandler,
    pub(crate) middleware: Vec<BoxedMiddleware>,
}

impl Route {
    pub(crate) fn new(handler: BoxedHandler) -> Self {
        Self { handler, middleware: Vec::new() }
    }
}

/// Returned by [`Router::on`](crate::Router::on) and friends. Attaches
/// middleware that wraps only this route's handler.
///
/// ```rust
/// use std::time::Duration;
/// use sprig::middleware::Cache;
/// use sprig::Router;
///
/// let mut app = Router::new();
/// app.get("/assets/logo", |_req, res, _cx| res.text("<svg/>"))
///     .layer(Cache::new(Duration::from_secs(86_400)));
/// ```
pub struct RouteHandle<'r> {
    route: &'r mut Route,
    replaced: bool,
}

impl<'r> RouteHandle<'r> {
    pub(crate) fn new(route: &'r mut Route, replaced: bool) -> Self {
        Self { route, replaced }
    }

    /// Appends route middleware. Later layers sit closer to the handler.
    pub fn layer(self, middleware: impl Middleware) -> Self {
        self.route.middleware.push(Arc::new(middleware));
        self
    }

    /// `true` if this registration replaced a handler previously registered
    /// for the same method and pattern. Route middleware from the earlier
    /// registration is discarded along with it.
    pub fn replaced(&self) -> bool {
        self.replaced
    }
}
