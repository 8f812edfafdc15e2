//! Cache headers for immutable responses.

use std::time::{Duration, SystemTime};

use super::Middleware;
use crate::handler::{BoxedHandler, handler_fn};

/// Max age used by [`Router::get_immutable`](crate::Router::get_immutable).
pub const ONE_DAY: Duration = Duration::from_secs(86_400);

/// Marks responses as publicly cacheable for a fixed duration.
///
/// Sets `cache-control: public, maxage=N, s-maxage=N, immutable` and an
/// `expires` date `N` seconds from now, then calls the inner handler. The
/// inner handler may still overwrite either header.
#[derive(Debug, Clone, Copy)]
pub struct Cache {
    max_age: Duration,
}

impl Cache {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }
}

impl Middleware for Cache {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let max_age = self.max_age;
        let cache_control = format!(
            "public, maxage={0}, s-maxage={0}, immutable",
            max_age.as_secs()
        );

        handler_fn(move |req, res, cx| {
            res.set_header("cache-control", &cache_control);
            res.set_header("expires", &httpdate::fmt_http_date(SystemTime::now() + max_age));
            next.call(req, res, cx);
        })
    }
}
