//! Segment-tree request router and dispatcher.
//!
//! One tree per HTTP method. O(depth) lookup. Setup happens through
//! `&mut Router`; once the router is handed to [`Server::serve`] it sits
//! behind an `Arc` and is only ever read, so dispatch needs no locking.
//!
//! [`Server::serve`]: crate::Server::serve

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::RouteError;
use crate::middleware::{self, BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::Response;
use crate::route::RouteHandle;
use crate::tree::MethodTree;

/// What [`Router::dispatch`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A route matched and its middleware chain ran.
    Handled,
    /// Nothing matched. A `404 Not Found` was written and no handler or
    /// middleware ran.
    NotFound,
}

/// The application router.
///
/// ```rust
/// use sprig::{Method, Request, Response, Router};
///
/// let mut app = Router::new();
/// app.post("/users", |_req, res, _cx| res.text("created"));
/// app.get("/users/:id", |_req, res, cx| {
///     res.text(format!("user {}", cx.param("id").unwrap_or("?")));
/// });
///
/// let mut res = Response::new();
/// app.dispatch(&Request::new(Method::GET, "/users/42"), &mut res);
/// assert_eq!(res.body(), b"user 42");
/// ```
pub struct Router {
    trees: HashMap<Method, MethodTree>,
    middleware: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { trees: HashMap::new(), middleware: Vec::new() }
    }

    /// Registers a handler for a method + path pattern.
    ///
    /// Segments starting with `:` bind the matching request segment under
    /// that name; every other segment matches literally, ignoring case.
    /// Registering the same pattern twice replaces the earlier handler (see
    /// [`RouteHandle::replaced`]).
    ///
    /// # Panics
    ///
    /// Panics if the pattern conflicts with an earlier registration for the
    /// same method: a literal where a variable already sits, a variable where
    /// literals already sit, or two differently named variables at one
    /// position. Use [`Router::try_on`] to handle that as an error instead.
    pub fn on<F>(&mut self, method: Method, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.try_on(method, pattern, handler)
            .unwrap_or_else(|e| panic!("invalid route: {e}"))
    }

    /// Like [`Router::on`], returning conflicts as a [`RouteError`].
    pub fn try_on<F>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: F,
    ) -> Result<RouteHandle<'_>, RouteError>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        let tree = self.trees.entry(method.clone()).or_insert_with(MethodTree::new);
        let (route, replaced) = tree.insert(pattern, Arc::new(handler))?;
        if replaced {
            warn!(%method, pattern, "route replaced an existing handler");
        }
        Ok(RouteHandle::new(route, replaced))
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.on(Method::DELETE, pattern, handler)
    }

    /// Registers a GET route for content that never changes, with a
    /// [`Cache`](middleware::Cache) layer of one day already attached.
    ///
    /// ```rust
    /// use sprig::{ContentType, Router};
    ///
    /// let mut app = Router::new();
    /// app.get_immutable("/assets/logo", |_req, res, _cx| {
    ///     res.bytes(ContentType::Xml, b"<svg/>".to_vec());
    /// });
    /// ```
    pub fn get_immutable<F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&Request, &mut Response, &mut Context) + Send + Sync + 'static,
    {
        self.get(pattern, handler)
            .layer(middleware::Cache::new(middleware::cache::ONE_DAY))
    }

    /// Adds global middleware, run for every matched request ahead of any
    /// subtree or route middleware.
    pub fn layer(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Adds middleware for every `method` route at or beneath `pattern`,
    /// whether those routes are registered before or after this call.
    ///
    /// # Panics
    ///
    /// Panics on the same pattern conflicts as [`Router::on`].
    pub fn layer_at(&mut self, method: Method, pattern: &str, middleware: impl Middleware) -> &mut Self {
        self.try_layer_at(method, pattern, middleware)
            .unwrap_or_else(|e| panic!("invalid middleware scope: {e}"))
    }

    /// Like [`Router::layer_at`], returning conflicts as a [`RouteError`].
    pub fn try_layer_at(
        &mut self,
        method: Method,
        pattern: &str,
        middleware: impl Middleware,
    ) -> Result<&mut Self, RouteError> {
        self.trees
            .entry(method)
            .or_insert_with(MethodTree::new)
            .layer_at(pattern, middleware)?;
        Ok(self)
    }

    /// Routes one request and runs its middleware chain.
    ///
    /// On a match the chain is global middleware, then subtree middleware
    /// root to leaf, then route middleware, then the handler. On a miss a
    /// `404 Not Found` is written to `res` and nothing else runs.
    pub fn dispatch(&self, req: &Request, res: &mut Response) -> Outcome {
        let Some(tree) = self.trees.get(req.method()) else {
            debug!(method = %req.method(), path = req.path(), "no routes for method");
            res.not_found();
            return Outcome::NotFound;
        };

        let resolved = tree.resolve(req.path());
        let Some(route) = resolved.route else {
            debug!(method = %req.method(), path = req.path(), "no route matched");
            res.not_found();
            return Outcome::NotFound;
        };

        let layers: Vec<BoxedMiddleware> = self
            .middleware
            .iter()
            .chain(&resolved.middleware)
            .chain(&route.middleware)
            .cloned()
            .collect();
        let chain = middleware::compose(&layers, Arc::clone(&route.handler));

        let mut cx = Context::with_params(resolved.params);
        chain.call(req, res, &mut cx);
        Outcome::Handled
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
