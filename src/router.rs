//! Pattern-based request router.
//!
//! Routes are regular expressions with optional named capture groups, held
//! in insertion order. Lookup filters on exact method equality first, then
//! tries the compiled patterns in registration order and returns the first
//! match. Overlapping patterns for one method are a legitimate
//! configuration: order decides, not specificity.
//!
//! Patterns are anchored at the start of the path. A leading `^` is
//! prepended when absent and the end is left open, so `/users` matches
//! `/users/42` but never `/api/users`. Anchor the end yourself (`/users$`)
//! when a full-path match is wanted.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Error;
use crate::method::Method;
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;

/// A `(method, pattern)` binding to its own sub-pipeline.
///
/// Created at registration, immutable afterwards, alive for the process
/// lifetime.
#[derive(Debug)]
pub struct Route {
    method: Method,
    pattern: String,
    regex: Regex,
    pipeline: Pipeline,
}

impl Route {
    fn compile(method: Method, pattern: &str, pipeline: Pipeline) -> Result<Self, Error> {
        let anchored = if pattern.starts_with('^') {
            pattern.to_owned()
        } else {
            format!("^{pattern}")
        };
        let regex = Regex::new(&anchored).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            source: Box::new(e),
        })?;
        Ok(Self { method, pattern: pattern.to_owned(), regex, pipeline })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The pattern source text as registered, without the implicit anchor.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Claims the request and runs the route's own pipeline.
    ///
    /// Claiming populates the request's route parameters from the pattern's
    /// named capture groups; unnamed groups contribute nothing. The
    /// sub-pipeline then runs with its own fresh cursor, exactly like the
    /// application's outer chain.
    pub async fn handle(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        let params: HashMap<String, String> = match self.regex.captures(req.path()) {
            Some(caps) => self
                .regex
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    caps.name(name).map(|m| (name.to_owned(), m.as_str().to_owned()))
                })
                .collect(),
            None => HashMap::new(),
        };
        req.set_params(params);
        self.pipeline.run(req, res).await
    }
}

/// Insertion-ordered collection of [`Route`]s.
///
/// ```rust
/// use cauce::{BoxFuture, Error, Request, Response, Router};
///
/// fn show_user<'a>(
///     req: &'a mut Request,
///     res: &'a mut Response,
/// ) -> BoxFuture<'a, Result<(), Error>> {
///     Box::pin(async move {
///         let id = req.param("id").unwrap_or("unknown").to_owned();
///         res.json(&serde_json::json!({ "id": id }))
///     })
/// }
///
/// fn list_users<'a>(
///     _req: &'a mut Request,
///     res: &'a mut Response,
/// ) -> BoxFuture<'a, Result<(), Error>> {
///     Box::pin(async move { res.json(&serde_json::json!([])) })
/// }
///
/// # fn main() -> Result<(), Error> {
/// let mut router = Router::new();
/// router
///     .get(r"/users$", list_users)?
///     .get(r"/users/(?P<id>[^/]+)", show_user)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a route. Fails with [`Error::DuplicateRoute`] when a route
    /// with the identical method and pattern source text already exists,
    /// and with [`Error::InvalidPattern`] when the pattern does not compile.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        pipeline: impl Into<Pipeline>,
    ) -> Result<&mut Self, Error> {
        if self.routes.iter().any(|r| r.method == method && r.pattern == pattern) {
            return Err(Error::DuplicateRoute { method, pattern: pattern.to_owned() });
        }
        self.routes.push(Route::compile(method, pattern, pipeline.into())?);
        Ok(self)
    }

    // Per-verb sugar. Each passes its own method constant through.

    pub fn get(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Get, pattern, p)
    }

    pub fn post(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Post, pattern, p)
    }

    pub fn put(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Put, pattern, p)
    }

    pub fn patch(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Patch, pattern, p)
    }

    pub fn delete(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Delete, pattern, p)
    }

    pub fn head(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Head, pattern, p)
    }

    pub fn options(&mut self, pattern: &str, p: impl Into<Pipeline>) -> Result<&mut Self, Error> {
        self.add_route(Method::Options, pattern, p)
    }

    /// Finds the first registered route matching `(method, path)`.
    ///
    /// Method equality is checked before the costlier pattern test. Returns
    /// [`Error::RouteNotFound`] carrying the method and path when nothing
    /// matches; translating that into a 404 is the caller's job.
    pub fn find_route(&self, method: Method, path: &str) -> Result<&Route, Error> {
        self.routes
            .iter()
            .filter(|r| r.method == method)
            .find(|r| r.matches(path))
            .ok_or_else(|| Error::RouteNotFound { method, path: path.to_owned() })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BoxFuture;

    fn ok<'a>(
        _req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move { res.text("ok") })
    }

    fn echo_id<'a>(
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let id = req.param("id").unwrap_or("missing").to_owned();
            res.text(id)
        })
    }

    fn carriers(method: Method, target: &str) -> (Request, Response) {
        let req = Request::new(method, target, Vec::new(), Vec::new());
        let res = Response::new(&req);
        (req, res)
    }

    #[test]
    fn rejects_duplicate_method_pattern_pairs() {
        let mut router = Router::new();
        router.get("/a", ok).unwrap();

        let err = router.get("/a", ok).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateRoute { method: Method::Get, ref pattern } if pattern == "/a"
        ));

        // Same pattern under a different method is fine.
        router.post("/a", ok).unwrap();
    }

    #[test]
    fn rejects_patterns_that_do_not_compile() {
        let mut router = Router::new();
        let err = router.get("/users/(?P<id>", ok).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn each_verb_registers_under_its_own_method() {
        let mut router = Router::new();
        router
            .get("/r", ok).unwrap()
            .post("/r", ok).unwrap()
            .put("/r", ok).unwrap()
            .patch("/r", ok).unwrap()
            .delete("/r", ok).unwrap()
            .head("/r", ok).unwrap()
            .options("/r", ok).unwrap();

        for method in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
            Method::Head,
            Method::Options,
        ] {
            let route = router.find_route(method, "/r").unwrap();
            assert_eq!(route.method(), method);
        }
    }

    #[test]
    fn first_registered_match_wins() {
        let mut a = Router::new();
        a.get(r"/users/(?P<id>[^/]+)", echo_id).unwrap()
            .get(r"/users/new", ok).unwrap();
        let winner = a.find_route(Method::Get, "/users/new").unwrap();
        assert_eq!(winner.pattern(), r"/users/(?P<id>[^/]+)");

        // Reversed registration order gives the other winner.
        let mut b = Router::new();
        b.get(r"/users/new", ok).unwrap()
            .get(r"/users/(?P<id>[^/]+)", echo_id).unwrap();
        let winner = b.find_route(Method::Get, "/users/new").unwrap();
        assert_eq!(winner.pattern(), r"/users/new");
    }

    #[test]
    fn lookup_misses_carry_method_and_path() {
        let router = Router::new();
        let err = router.find_route(Method::Delete, "/missing").unwrap_err();
        assert!(matches!(
            err,
            Error::RouteNotFound { method: Method::Delete, ref path } if path == "/missing"
        ));
    }

    #[test]
    fn patterns_anchor_at_the_path_start() {
        let mut router = Router::new();
        router.get("/admin", ok).unwrap();

        // Unanchored end: suffixes still match.
        assert!(router.find_route(Method::Get, "/admin/users").is_ok());
        // Anchored start: prefixes do not.
        assert!(router.find_route(Method::Get, "/api/admin").is_err());
    }

    #[tokio::test]
    async fn claiming_a_request_populates_named_captures() {
        let mut router = Router::new();
        router.get(r"/users/(?P<id>[^/]+)", echo_id).unwrap();

        let (mut req, mut res) = carriers(Method::Get, "/users/42");
        let route = router.find_route(req.method(), "/users/42").unwrap();
        route.handle(&mut req, &mut res).await.unwrap();

        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn unnamed_groups_contribute_no_params() {
        fn dump<'a>(
            req: &'a mut Request,
            res: &'a mut Response,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                let count = req.params().len();
                res.text(count.to_string())
            })
        }

        let mut router = Router::new();
        router.get(r"/files/([^/]+)/(?P<name>.+)", dump).unwrap();

        let (mut req, mut res) = carriers(Method::Get, "/files/docs/readme.md");
        let route = router.find_route(req.method(), "/files/docs/readme.md").unwrap();
        route.handle(&mut req, &mut res).await.unwrap();

        assert_eq!(req.param("name"), Some("readme.md"));
        assert_eq!(req.params().len(), 1);
        assert_eq!(res.body(), b"1");
    }

    #[tokio::test]
    async fn route_middleware_runs_before_its_handler() {
        use crate::pipeline::{Middleware, Next};
        use std::sync::{Arc, Mutex};

        struct Mark(Arc<Mutex<Vec<&'static str>>>);

        impl Middleware for Mark {
            fn handle<'a>(
                &'a self,
                req: &'a mut Request,
                res: &'a mut Response,
                next: Next<'a>,
            ) -> BoxFuture<'a, Result<(), Error>> {
                Box::pin(async move {
                    self.0.lock().unwrap().push("route-mw");
                    next.run(req, res).await
                })
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router
            .post(r"/users$", Pipeline::new(ok).layer(Mark(Arc::clone(&seen))))
            .unwrap();

        let (mut req, mut res) = carriers(Method::Post, "/users");
        let route = router.find_route(Method::Post, "/users").unwrap();
        route.handle(&mut req, &mut res).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["route-mw"]);
        assert_eq!(res.body(), b"ok");
    }
}
