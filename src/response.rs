//! Outgoing HTTP response type.
//!
//! A [`Response`] is created by the transport alongside its [`Request`] and
//! threaded through the pipeline. Handlers fill it in and call
//! [`send`](Response::send) (or a typed shortcut) exactly once; the transport
//! writes the finalized status, headers, and body after the pipeline returns.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::Error;
use crate::request::Request;

/// An outgoing HTTP response.
///
/// ```rust
/// use cauce::{Method, Request, Response};
/// use http::StatusCode;
///
/// let req = Request::new(Method::Get, "/users/42", Vec::new(), Vec::new());
/// let mut res = Response::new(&req);
/// res.set_status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(&serde_json::json!({"id": 42}))
///     .unwrap();
/// ```
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    sent: bool,
    request_id: String,
}

impl Response {
    /// Binds a fresh response to the request it answers.
    ///
    /// Only the request's identifier is retained, for correlation — a
    /// response never reaches back into its request.
    pub fn new(request: &Request) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Vec::new(),
            sent: false,
            request_id: request.id().to_owned(),
        }
    }

    /// Sets the status code. Defaults to `200 OK`.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Finalizes the body. At most once per request: a second call returns
    /// [`Error::ResponseAlreadySent`].
    pub fn send(&mut self, body: impl Into<Vec<u8>>) -> Result<(), Error> {
        if self.sent {
            return Err(Error::ResponseAlreadySent);
        }
        self.sent = true;
        self.body = body.into();
        Ok(())
    }

    /// Serializes `value` and sends it as `application/json`.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        if self.sent {
            return Err(Error::ResponseAlreadySent);
        }
        let body = serde_json::to_vec(value)?;
        self.header("content-type", "application/json");
        self.send(body)
    }

    /// Sends a `text/plain; charset=utf-8` body.
    pub fn text(&mut self, body: impl Into<String>) -> Result<(), Error> {
        if self.sent {
            return Err(Error::ResponseAlreadySent);
        }
        self.header("content-type", "text/plain; charset=utf-8");
        self.send(body.into().into_bytes())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the body has been finalized.
    pub fn sent(&self) -> bool {
        self.sent
    }

    /// Identifier of the request this response answers.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                let mut res = http::Response::new(Full::new(Bytes::new()));
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                res
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    fn fresh() -> Response {
        let req = Request::new(Method::Get, "/", Vec::new(), Vec::new());
        Response::new(&req)
    }

    #[test]
    fn defaults_to_200() {
        let res = fresh();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.sent());
        assert!(res.body().is_empty());
    }

    #[test]
    fn send_finalizes_the_body_once() {
        let mut res = fresh();
        res.send(b"hello".to_vec()).unwrap();
        assert!(res.sent());
        assert_eq!(res.body(), b"hello");

        assert!(matches!(
            res.send(b"again".to_vec()),
            Err(Error::ResponseAlreadySent)
        ));
        assert_eq!(res.body(), b"hello");
    }

    #[test]
    fn json_sets_content_type_and_sends() {
        let mut res = fresh();
        res.set_status(StatusCode::CREATED)
            .json(&serde_json::json!({"hola": "mundo"}))
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(
            res.headers(),
            &[("content-type".to_owned(), "application/json".to_owned())]
        );
        assert!(matches!(res.text("late"), Err(Error::ResponseAlreadySent)));
    }

    #[test]
    fn carries_the_request_id() {
        let req = Request::new(Method::Get, "/", Vec::new(), Vec::new());
        let res = Response::new(&req);
        assert_eq!(res.request_id(), req.id());
    }
}
