//! Per-request tracing.

use std::time::Instant;

use tracing::{info, info_span};

use super::Middleware;
use crate::handler::{BoxedHandler, handler_fn};

/// Opens an `info` span per request carrying method and path, and logs
/// status and latency once the inner chain returns.
///
/// Register it first with [`Router::layer`](crate::Router::layer) so the
/// span covers every other layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        handler_fn(move |req, res, cx| {
            let span = info_span!("request", method = %req.method(), path = req.path());
            let _guard = span.enter();
            let started = Instant::now();

            next.call(req, res, cx);

            info!(
                status = res.status().as_u16(),
                latency_us = started.elapsed().as_micros() as u64,
                "request completed"
            );
        })
    }
}
