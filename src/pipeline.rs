//! Middleware pipeline: ordered layers around one terminal handler,
//! executed through an explicit continuation.
//!
//! # How the chain is stored and driven
//!
//! A [`Pipeline`] holds middleware of *different* concrete types in one
//! `Vec`, so each layer is type-erased behind `Arc<dyn Middleware>` and the
//! terminal handler behind `Arc<dyn Handler>`. At request time the executor
//! builds a [`Next`] value: a read-only view of the layer list plus an
//! index. The index is the pipeline cursor. It lives in the `Next` value on
//! the request's own call stack, never on the shared `Pipeline`, so any
//! number of requests can run the same pipeline concurrently without
//! touching each other's position.
//!
//! ```text
//! pipeline.run(req, res)
//!   └─ Next{cursor:0}.run        → m0.handle(req, res, Next{cursor:1})
//!        └─ next.run             → m1.handle(req, res, Next{cursor:2})
//!             └─ next.run        → terminal.call(req, res)
//! ```
//!
//! Each layer decides whether and when to invoke its continuation. Code
//! after `next.run(...).await` executes on the unwind, after everything
//! downstream has finished. Dropping `next` without calling it
//! short-circuits the rest of the chain, which is the supported way to
//! answer early (auth rejections and the like). `Next::run` consumes the
//! continuation by value, so invoking it twice is a compile error rather
//! than a silent re-run of downstream layers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future tied to the borrows it captures.
///
/// `Pin<Box<…>>` because the runtime polls the future in place; `Send` so
/// tokio may move it across worker threads between polls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline layer with access to the rest of the chain.
///
/// Implemented automatically for any function of the shape
///
/// ```text
/// fn name<'a>(&'a mut Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<(), Error>>
/// ```
///
/// and implementable directly on a struct when the layer carries
/// configuration or shared state.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        self(req, res, next)
    }
}

/// A pipeline's innermost callable. It has no continuation and cannot
/// delegate further.
///
/// Implemented automatically for any function of the shape
///
/// ```text
/// fn name<'a>(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), Error>>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), Error>> {
        self(req, res)
    }
}

/// The continuation handed to each middleware: the rest of the chain,
/// starting at the following layer.
///
/// Calling [`run`](Next::run) executes the remainder of the chain and
/// returns whatever it returns; errors from downstream layers pass through
/// unmodified. `run` takes `self` by value, so a continuation can be
/// invoked at most once.
pub struct Next<'a> {
    layers: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Handler,
    cursor: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn new(layers: &'a [Arc<dyn Middleware>], terminal: &'a dyn Handler) -> Self {
        Self { layers, terminal, cursor: 0 }
    }

    /// Runs the rest of the chain: the layer at the cursor with a
    /// continuation advanced by one, or the terminal handler once the
    /// layers are exhausted.
    pub fn run<'b>(
        self,
        req: &'b mut Request,
        res: &'b mut Response,
    ) -> BoxFuture<'b, Result<(), Error>>
    where
        'a: 'b,
    {
        match self.layers.get(self.cursor) {
            Some(layer) => {
                let next = Next {
                    layers: self.layers,
                    terminal: self.terminal,
                    cursor: self.cursor + 1,
                };
                layer.handle(req, res, next)
            }
            None => self.terminal.call(req, res),
        }
    }
}

/// An ordered middleware list with exactly one terminal handler at its end.
///
/// Built once at setup, shared read-only afterwards. Both the application's
/// outer chain and each route's inner chain are `Pipeline`s.
///
/// ```rust
/// use cauce::{BoxFuture, Error, Pipeline, Request, Response};
///
/// fn hello<'a>(
///     _req: &'a mut Request,
///     res: &'a mut Response,
/// ) -> BoxFuture<'a, Result<(), Error>> {
///     Box::pin(async move { res.text("hola mundo") })
/// }
///
/// let pipeline = Pipeline::new(hello);
/// ```
pub struct Pipeline {
    layers: Vec<Arc<dyn Middleware>>,
    terminal: Arc<dyn Handler>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(terminal: impl Handler) -> Self {
        Self { layers: Vec::new(), terminal: Arc::new(terminal) }
    }

    /// Appends a middleware layer. Layers run in append order on the way in.
    pub fn layer(mut self, layer: impl Middleware) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Executes the chain for one request with a fresh cursor.
    pub fn run<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Next::new(&self.layers, &*self.terminal).run(req, res)
    }

    pub(crate) fn push_layer(&mut self, layer: Arc<dyn Middleware>) {
        self.layers.push(layer);
    }
}

/// A bare handler is a pipeline with no middleware.
impl<H: Handler> From<H> for Pipeline {
    fn from(terminal: H) -> Self {
        Pipeline::new(terminal)
    }
}
