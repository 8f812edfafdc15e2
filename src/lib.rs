//! # sprig
//!
//! An in-process HTTP dispatcher: a per-method segment tree, named path
//! parameters, and middleware you can scope globally, to a subtree, or to a
//! single route.
//!
//! ## Routing
//!
//! Patterns are `/`-separated. A segment starting with `:` binds whatever the
//! request has at that position; every other segment matches literally,
//! ignoring case. At one position of a tree there is either one variable or
//! any number of literals. A registration that would break that is a setup
//! bug and panics (or returns a [`RouteError`] from the `try_` variants), so
//! every request path matches at most one route per method.
//!
//! ## Middleware
//!
//! A middleware wraps the next handler and returns a new one. The chain for a
//! matched request is global ([`Router::layer`]) → subtree
//! ([`Router::layer_at`], root to leaf) → route ([`RouteHandle::layer`]) →
//! handler.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use sprig::middleware::{BasicAuth, Cache, Trace};
//! use sprig::{Method, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Router::new();
//!     app.layer(Trace);
//!
//!     app.get("/users/:id", |_req, res, cx| {
//!         let id = cx.param("id").unwrap_or("unknown");
//!         res.json(format!(r#"{{"id":"{id}"}}"#).into_bytes());
//!     });
//!     app.post("/users", |req, res, _cx| {
//!         if req.body().is_empty() {
//!             return res.error(StatusCode::BAD_REQUEST);
//!         }
//!         res.set_status(StatusCode::CREATED);
//!         res.set_header("location", "/users/99");
//!     });
//!     app.get("/logo", |_req, res, _cx| res.text("<svg/>"))
//!         .layer(Cache::new(Duration::from_secs(3600)));
//!
//!     app.get("/admin/stats", |_req, res, cx| {
//!         res.text(format!("hi {}", cx.identity().unwrap_or("?")));
//!     });
//!     app.layer_at(Method::GET, "/admin", BasicAuth::users([("admin", "s3cret")]));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//! ```

mod context;
mod error;
mod handler;
mod request;
mod response;
mod route;
mod router;
mod server;
mod tree;

pub mod middleware;

pub use context::Context;
pub use error::{Error, RouteError};
pub use handler::{BoxedHandler, Handler, handler_fn};
pub use middleware::{BoxedMiddleware, Middleware};
pub use request::Request;
pub use response::{ContentType, Response};
pub use route::RouteHandle;
pub use router::{Outcome, Router};
pub use server::Server;

pub use http::{Method, StatusCode};
