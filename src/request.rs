//! Incoming HTTP request type.

use std::collections::HashMap;

use crate::method::Method;

/// An incoming HTTP request, handed to the pipeline by the transport.
///
/// Identifier, method, and path are fixed at construction. Route parameters
/// are written once, by the [`Route`](crate::Route) that claims the request
/// during lookup. The decoded [`body`](Request::body) starts as
/// `serde_json::Value::Null` and is assigned by a body-parsing middleware
/// such as [`JsonBody`](crate::middleware::JsonBody) — the core never
/// interprets the raw bytes itself.
pub struct Request {
    id: String,
    method: Method,
    path: String,
    query: HashMap<String, Vec<String>>,
    headers: Vec<(String, String)>,
    params: HashMap<String, String>,
    raw_body: Vec<u8>,
    body: serde_json::Value,
}

impl Request {
    /// Builds a request from the pieces the transport supplies.
    ///
    /// `target` is the request target as it appeared on the wire: a path,
    /// optionally followed by `?` and a query string.
    pub fn new(
        method: Method,
        target: &str,
        headers: Vec<(String, String)>,
        raw_body: Vec<u8>,
    ) -> Self {
        let (path, query_string) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        let mut query: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
            query.entry(key.into_owned()).or_default().push(value.into_owned());
        }

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method,
            path: path.to_owned(),
            query,
            headers,
            params: HashMap::new(),
            raw_body,
            body: serde_json::Value::Null,
        }
    }

    /// Opaque identifier, unique per request and stable for its lifetime.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parsed query parameters. Repeated keys keep their values in wire order.
    pub fn query(&self) -> &HashMap<String, Vec<String>> {
        &self.query
    }

    /// First value for a query key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key)?.first().map(String::as_str)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named route parameter.
    ///
    /// For a route pattern `/users/(?P<id>[^/]+)`, `req.param("id")` on
    /// `/users/42` returns `Some("42")`. Empty until a route has claimed
    /// the request.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    // Write-once: the single call site is Route::handle, when the route
    // claims the request.
    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Body bytes exactly as read off the wire.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// Decoded body, `Null` until a body-parsing middleware assigns it.
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Assigns the decoded body. Called by body-parsing middleware.
    pub fn set_body(&mut self, body: serde_json::Value) {
        self.body = body;
    }
}
