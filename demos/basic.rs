//! Minimal cauce example — JSON endpoints behind the built-in middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42

use std::sync::Arc;

use cauce::{App, BoxFuture, Error, Handler, Request, Response, Router, Server, middleware};
use http::StatusCode;

/// The terminal request handler: consults the router and owns the 404.
struct Dispatch(Arc<Router>);

impl Handler for Dispatch {
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
                        "message": "not found",
                        "method": method.as_str(),
                        "path": path,
                    }))
                }
                Err(other) => Err(other),
            }
        })
    }
}

// GET /users/(?P<id>[^/]+)
fn show_user<'a>(
    req: &'a mut Request,
    res: &'a mut Response,
) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        let id = req.param("id").unwrap_or("unknown").to_owned();
        res.json(&serde_json::json!({ "id": id, "name": "alice" }))
    })
}

// POST /users — JsonBody has already decoded the payload into req.body().
fn create_user<'a>(
    req: &'a mut Request,
    res: &'a mut Response,
) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        let name = req.body()["name"].as_str().unwrap_or("").to_owned();
        if name.is_empty() {
            res.set_status(StatusCode::BAD_REQUEST);
            return res.json(&serde_json::json!({ "message": "name is required" }));
        }
        res.set_status(StatusCode::CREATED)
            .header("location", "/users/99")
            .json(&serde_json::json!({ "id": "99", "name": name }))
    })
}

// DELETE /users/(?P<id>[^/]+) → 204 No Content
fn delete_user<'a>(
    _req: &'a mut Request,
    res: &'a mut Response,
) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        res.set_status(StatusCode::NO_CONTENT);
        res.send(Vec::new())
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let mut router = Router::new();
    router
        .get(r"/users/(?P<id>[^/]+)", show_user)?
        .post(r"/users$", create_user)?
        .delete(r"/users/(?P<id>[^/]+)", delete_user)?;

    let app = App::new(Dispatch(Arc::new(router)))
        .layer(middleware::Recover)
        .layer(middleware::Trace)
        .layer(middleware::Cors::default())
        .layer(middleware::JsonBody);

    Server::bind("0.0.0.0:3000").serve(app).await
}
