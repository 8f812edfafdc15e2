//! HTTP Basic authentication.
//!
//! On valid credentials the username is attached to the request
//! [`Context`](crate::Context) and the chain continues. Anything else gets a
//! `401 Unauthorized` with a `www-authenticate` challenge, and the inner
//! handler never runs.
//!
//! ```rust
//! use sprig::middleware::BasicAuth;
//! use sprig::{Method, Router};
//!
//! let mut app = Router::new();
//! app.get("/admin/stats", |_req, res, cx| {
//!     res.text(format!("hello {}", cx.identity().unwrap_or("nobody")));
//! });
//! app.layer_at(Method::GET, "/admin", BasicAuth::users([("admin", "s3cret")]));
//! ```

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use http::StatusCode;
use tracing::debug;

use super::Middleware;
use crate::handler::{BoxedHandler, handler_fn};

/// Username and password decoded from an `Authorization: Basic` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    pub fn username(&self) -> &str { &self.username }
    pub fn password(&self) -> &str { &self.password }

    /// Parses the value of an `Authorization` header.
    ///
    /// The scheme is matched case-insensitively. Returns `None` for any other
    /// scheme, malformed base64, non-UTF-8 payloads, or a payload without `:`.
    pub fn from_header(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self::new(username, password))
    }
}

type Checker = Arc<dyn Fn(&Credentials) -> bool + Send + Sync>;

/// Basic-auth middleware. Build with [`BasicAuth::new`] or
/// [`BasicAuth::users`].
#[derive(Clone)]
pub struct BasicAuth {
    checker: Checker,
    realm: String,
}

impl BasicAuth {
    /// Accepts any credentials for which `checker` returns `true`.
    pub fn new<F>(checker: F) -> Self
    where
        F: Fn(&Credentials) -> bool + Send + Sync + 'static,
    {
        Self { checker: Arc::new(checker), realm: "restricted".to_owned() }
    }

    /// Accepts exactly the given `(username, password)` pairs.
    pub fn users<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let users: Vec<Credentials> = users
            .into_iter()
            .map(|(u, p)| Credentials::new(u, p))
            .collect();
        Self::new(move |given| users.iter().any(|known| known == given))
    }

    /// Sets the realm announced in the `www-authenticate` challenge.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }
}

impl Middleware for BasicAuth {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let checker = Arc::clone(&self.checker);
        let challenge = format!("Basic realm=\"{}\"", self.realm);

        handler_fn(move |req, res, cx| {
            let credentials = req.header("authorization").and_then(Credentials::from_header);
            match credentials {
                Some(credentials) if checker(&credentials) => {
                    cx.set_identity(credentials.username);
                    next.call(req, res, cx);
                }
                Some(credentials) => {
                    debug!(user = credentials.username(), path = req.path(), "basic auth rejected");
                    res.set_header("www-authenticate", &challenge);
                    res.error(StatusCode::UNAUTHORIZED);
                }
                None => {
                    res.set_header("www-authenticate", &challenge);
                    res.error(StatusCode::UNAUTHORIZED);
                }
            }
        })
    }
}
