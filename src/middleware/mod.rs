//! Built-in middleware.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. The layers here cover the usual baseline:
//!
//! - [`Trace`]   — request/response logging with per-request correlation
//! - [`Recover`] — outermost error boundary, turns escaped errors into a 500
//! - [`JsonBody`] — decodes `application/json` bodies into `request.body`
//! - [`Cors`]    — stamps `access-control-*` response headers
//!
//! Order matters: `Recover` only catches errors from layers registered
//! after it, so it belongs first on the application chain.

use http::StatusCode;
use tracing::{error, info};

use crate::error::Error;
use crate::pipeline::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Logs the request on the way in and the response status with latency on
/// the way out, keyed by the request id.
pub struct Trace;

impl Middleware for Trace {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let started = std::time::Instant::now();
            info!(
                id = %req.id(),
                method = %req.method(),
                path = req.path(),
                "request"
            );
            let out = next.run(req, res).await;
            info!(
                id = %req.id(),
                status = res.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "response"
            );
            out
        })
    }
}

/// Error boundary: wraps its continuation in error handling and converts an
/// escaped error into a JSON 500, unless a response was already sent.
///
/// The pipeline itself never catches; recovery exists only where a layer
/// like this one wraps `next.run`.
pub struct Recover;

impl Middleware for Recover {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            match next.run(req, res).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    error!(
                        id = %req.id(),
                        method = %req.method(),
                        path = req.path(),
                        %err,
                        "request failed"
                    );
                    if !res.sent() {
                        res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                        res.json(&serde_json::json!({ "message": err.to_string() }))?;
                    }
                    Ok(())
                }
            }
        })
    }
}

/// Decodes an `application/json` body into [`Request::body`].
///
/// Leaves the request untouched for other content types and empty bodies.
/// A body that fails to decode propagates [`Error::Json`] to whatever
/// error boundary wraps this layer.
pub struct JsonBody;

impl Middleware for JsonBody {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let is_json = req
                .header("content-type")
                .is_some_and(|v| v.contains("application/json"));
            if is_json && !req.raw_body().is_empty() {
                let body = serde_json::from_slice(req.raw_body())?;
                req.set_body(body);
            }
            next.run(req, res).await
        })
    }
}

/// Stamps `access-control-*` headers on every response before delegating.
pub struct Cors {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub expose_headers: String,
    pub allow_credentials: bool,
    pub max_age_seconds: u32,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_methods: "GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS".to_owned(),
            allow_headers: "content-type, authorization".to_owned(),
            expose_headers: String::new(),
            allow_credentials: false,
            max_age_seconds: 86_400,
        }
    }
}

impl Middleware for Cors {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            res.header("access-control-allow-origin", &self.allow_origin)
                .header("access-control-allow-methods", &self.allow_methods)
                .header("access-control-allow-headers", &self.allow_headers)
                .header("access-control-max-age", &self.max_age_seconds.to_string());
            if !self.expose_headers.is_empty() {
                res.header("access-control-expose-headers", &self.expose_headers);
            }
            if self.allow_credentials {
                res.header("access-control-allow-credentials", "true");
            }
            next.run(req, res).await
        })
    }
}
