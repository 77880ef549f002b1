//! Unified error type.

use crate::method::Method;

/// The error type returned by cauce's fallible operations.
///
/// Routing misconfiguration surfaces at registration time
/// ([`DuplicateRoute`](Error::DuplicateRoute),
/// [`InvalidPattern`](Error::InvalidPattern)) and should abort setup.
/// [`RouteNotFound`](Error::RouteNotFound) is raised by
/// [`Router::find_route`](crate::Router::find_route) and is expected to be
/// caught by the application's terminal handler and turned into a 404 —
/// the pipeline never builds that response on its own. Anything a
/// middleware or handler returns as `Err` travels unmodified through every
/// enclosing [`Next::run`](crate::Next::run) call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A route with the same method and pattern source text already exists.
    #[error("route already registered: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },

    /// No registered route matched the method + path pair.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// The route pattern failed to compile.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// `Response::send` was called a second time for the same request.
    #[error("response already sent")]
    ResponseAlreadySent,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
