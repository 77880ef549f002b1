//! Application: the process-wide middleware chain around one terminal
//! request handler.

use std::sync::Arc;

use crate::error::Error;
use crate::pipeline::{Handler, Middleware, Pipeline};
use crate::request::Request;
use crate::response::Response;

/// The application object the transport dispatches into.
///
/// Owns the outer middleware list and the single terminal request handler.
/// The terminal handler is application code; by convention it consults a
/// [`Router`](crate::Router) and translates
/// [`Error::RouteNotFound`](crate::Error::RouteNotFound) into a 404 itself.
///
/// Middleware are appended during setup only. The builder consumes `self`
/// and serving shares the finished value behind an `Arc`, so appending
/// during live traffic is not expressible. Per-request pipeline state lives
/// in the [`Next`](crate::Next) cursor on each request's call stack, never
/// on this shared object.
///
/// ```rust
/// use cauce::{App, BoxFuture, Error, Request, Response, middleware};
///
/// fn handle<'a>(
///     _req: &'a mut Request,
///     res: &'a mut Response,
/// ) -> BoxFuture<'a, Result<(), Error>> {
///     Box::pin(async move { res.text("hola mundo") })
/// }
///
/// let app = App::new(handle)
///     .layer(middleware::Trace)
///     .layer(middleware::JsonBody);
/// ```
pub struct App {
    pipeline: Pipeline,
}

impl App {
    pub fn new(terminal: impl Handler) -> Self {
        Self { pipeline: Pipeline::new(terminal) }
    }

    /// Appends a process-wide middleware. Layers run in append order on the
    /// way in and in reverse on the way out.
    pub fn layer(mut self, layer: impl Middleware) -> Self {
        self.pipeline.push_layer(Arc::new(layer));
        self
    }

    /// Runs the outer chain for one request with a fresh cursor.
    ///
    /// The transport builds the carriers, calls this, and writes the
    /// finalized response out. Errors escaping every layer surface here.
    pub async fn handle(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        self.pipeline.run(req, res).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::pipeline::{BoxFuture, Next};
    use crate::router::Router;
    use http::StatusCode;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<(String, &'static str)>>>;

    /// Tags the shared log with the request id on entry and on unwind.
    struct Stamp(Log);

    impl Middleware for Stamp {
        fn handle<'a>(
            &'a self,
            req: &'a mut Request,
            res: &'a mut Response,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                self.0.lock().unwrap().push((req.id().to_owned(), "in"));
                let out = next.run(req, res).await;
                self.0.lock().unwrap().push((req.id().to_owned(), "out"));
                out
            })
        }
    }

    struct SleepyEcho(Log);

    impl crate::pipeline::Handler for SleepyEcho {
        fn call<'a>(
            &'a self,
            req: &'a mut Request,
            res: &'a mut Response,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                let millis = req
                    .query_param("sleep")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(millis)).await;
                self.0.lock().unwrap().push((req.id().to_owned(), "terminal"));
                res.text(req.query_param("name").unwrap_or("").to_owned())
            })
        }
    }

    #[tokio::test]
    async fn outer_chain_wraps_the_terminal_handler() {
        let log: Log = Log::default();
        let app = App::new(SleepyEcho(Arc::clone(&log))).layer(Stamp(Arc::clone(&log)));

        let mut req = Request::new(Method::Get, "/?name=solo", Vec::new(), Vec::new());
        let mut res = Response::new(&req);
        app.handle(&mut req, &mut res).await.unwrap();

        let stages: Vec<&'static str> =
            log.lock().unwrap().iter().map(|(_, stage)| *stage).collect();
        assert_eq!(stages, vec!["in", "terminal", "out"]);
        assert_eq!(res.body(), b"solo");
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_share_pipeline_state() {
        let log: Log = Log::default();
        let app = Arc::new(
            App::new(SleepyEcho(Arc::clone(&log))).layer(Stamp(Arc::clone(&log))),
        );

        let slow = tokio::spawn({
            let app = Arc::clone(&app);
            async move {
                let mut req = Request::new(
                    Method::Get,
                    "/?name=slow&sleep=30",
                    Vec::new(),
                    Vec::new(),
                );
                let mut res = Response::new(&req);
                app.handle(&mut req, &mut res).await.unwrap();
                (req.id().to_owned(), res)
            }
        });
        let fast = tokio::spawn({
            let app = Arc::clone(&app);
            async move {
                let mut req = Request::new(Method::Get, "/?name=fast", Vec::new(), Vec::new());
                let mut res = Response::new(&req);
                app.handle(&mut req, &mut res).await.unwrap();
                (req.id().to_owned(), res)
            }
        });

        let (slow_id, slow_res) = slow.await.unwrap();
        let (fast_id, fast_res) = fast.await.unwrap();

        assert_eq!(slow_res.body(), b"slow");
        assert_eq!(fast_res.body(), b"fast");

        // Each request's entries form the full in/terminal/out sequence,
        // whatever the interleaving between the two tasks.
        let log = log.lock().unwrap();
        for id in [&slow_id, &fast_id] {
            let stages: Vec<&'static str> = log
                .iter()
                .filter(|(entry_id, _)| entry_id == id)
                .map(|(_, stage)| *stage)
                .collect();
            assert_eq!(stages, vec!["in", "terminal", "out"]);
        }
    }

    #[tokio::test]
    async fn terminal_handler_consults_a_router_by_convention() {
        struct Dispatch(Arc<Router>);

        impl crate::pipeline::Handler for Dispatch {
            fn call<'a>(
                &'a self,
                req: &'a mut Request,
                res: &'a mut Response,
            ) -> BoxFuture<'a, Result<(), Error>> {
                Box::pin(async move {
                    match self.0.find_route(req.method(), req.path()) {
                        Ok(route) => route.handle(req, res).await,
                        Err(Error::RouteNotFound { method, path }) => {
                            res.set_status(StatusCode::NOT_FOUND);
                            res.json(&serde_json::json!({
                                "error": "not found",
                                "method": method.as_str(),
                                "path": path,
                            }))
                        }
                        Err(other) => Err(other),
                    }
                })
            }
        }

        fn show<'a>(
            req: &'a mut Request,
            res: &'a mut Response,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                let id = req.param("id").unwrap_or("").to_owned();
                res.text(id)
            })
        }

        let mut router = Router::new();
        router.get(r"/users/(?P<id>[^/]+)", show).unwrap();
        let app = App::new(Dispatch(Arc::new(router)));

        let mut req = Request::new(Method::Get, "/users/7", Vec::new(), Vec::new());
        let mut res = Response::new(&req);
        app.handle(&mut req, &mut res).await.unwrap();
        assert_eq!(res.body(), b"7");
        assert_eq!(req.param("id"), Some("7"));

        let mut req = Request::new(Method::Delete, "/users/7", Vec::new(), Vec::new());
        let mut res = Response::new(&req);
        app.handle(&mut req, &mut res).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
