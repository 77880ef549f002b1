//! # cauce
//!
//! A minimal HTTP application runtime: a pattern-based router and a
//! composable middleware pipeline, driven through an explicit continuation.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! The pipeline core never touches a socket. hyper owns the wire; the
//! [`Server`] adapter turns each parsed request into a [`Request`] and a
//! [`Response`], runs the application's middleware chain, and writes out
//! whatever the chain finalized. What's left for cauce is the part that
//! changes between applications:
//!
//! - **Middleware** run in registration order around one terminal handler.
//!   Each layer holds a [`Next`] continuation and decides whether, when,
//!   and if to delegate; code after `next.run(...).await` sees the final
//!   response on the unwind. Dropping the continuation answers early.
//! - **Routing** is regex over the path with named captures, filtered by
//!   exact method match, first registered pattern wins. Every [`Route`]
//!   carries its own middleware chain around its handler.
//! - **Errors** travel unmodified through the chain. The core never
//!   catches; a boundary layer like [`middleware::Recover`] does.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cauce::{App, BoxFuture, Error, Handler, Request, Response, Router, Server, middleware};
//! use http::StatusCode;
//!
//! struct Dispatch(Arc<Router>);
//!
//! impl Handler for Dispatch {
//!     fn call<'a>(
//!         &'a self,
//!         req: &'a mut Request,
//!         res: &'a mut Response,
//!     ) -> BoxFuture<'a, Result<(), Error>> {
//!         Box::pin(async move {
//!             match self.0.find_route(req.method(), req.path()) {
//!                 Ok(route) => route.handle(req, res).await,
//!                 Err(Error::RouteNotFound { .. }) => {
//!                     res.set_status(StatusCode::NOT_FOUND);
//!                     res.json(&serde_json::json!({ "message": "not found" }))
//!                 }
//!                 Err(other) => Err(other),
//!             }
//!         })
//!     }
//! }
//!
//! fn show_user<'a>(
//!     req: &'a mut Request,
//!     res: &'a mut Response,
//! ) -> BoxFuture<'a, Result<(), Error>> {
//!     Box::pin(async move {
//!         let id = req.param("id").unwrap_or("unknown").to_owned();
//!         res.json(&serde_json::json!({ "id": id }))
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let mut router = Router::new();
//!     router.get(r"/users/(?P<id>[^/]+)", show_user)?;
//!
//!     let app = App::new(Dispatch(Arc::new(router)))
//!         .layer(middleware::Recover)
//!         .layer(middleware::Trace)
//!         .layer(middleware::JsonBody);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//! ```

mod app;
mod error;
mod method;
mod pipeline;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use app::App;
pub use error::Error;
pub use method::Method;
pub use pipeline::{BoxFuture, Handler, Middleware, Next, Pipeline};
pub use request::Request;
pub use response::Response;
pub use router::{Route, Router};
pub use server::Server;
