//! A recording mock transport for testing API clients.
//!
//! [MockService] answers requests from a table of `(method, path)` routes and
//! records every request it sees, including the collected body, so tests can
//! assert on headers, bodies and call counts. Clones share the same routes and
//! the same request log.
//!
//! Only built with the `mock` feature, which service crates enable for their tests.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode, Uri};
use http_body_util::BodyExt as _;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
enum MockRoute {
    Respond {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    Fail,
}

/// A request captured by a [MockService].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method
    pub method: Method,
    /// Full request URI
    pub uri: Uri,
    /// Request headers, as seen by the transport
    pub headers: HeaderMap,
    /// Collected request body
    pub body: Bytes,
}

impl RecordedRequest {
    /// A header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The body parsed as JSON.
    ///
    /// # Panics
    /// Panics if the body is not valid JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("recorded body is JSON")
    }
}

/// A `tower::Service` standing in for the HTTP transport in tests.
#[derive(Debug, Default, Clone)]
pub struct MockService {
    routes: Arc<Mutex<HashMap<(Method, String), MockRoute>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    /// Create a mock with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `status` and `body`.
    pub fn add<B: Into<Bytes>>(&self, method: Method, path: &str, status: StatusCode, body: B) {
        self.add_with_headers(method, path, status, HeaderMap::new(), body);
    }

    /// Answer `method path` with `status`, `headers` and `body`.
    pub fn add_with_headers<B: Into<Bytes>>(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        headers: HeaderMap,
        body: B,
    ) {
        let route = MockRoute::Respond {
            status,
            headers,
            body: body.into(),
        };
        self.routes.lock().insert((method, path.to_owned()), route);
    }

    /// Answer `method path` with a JSON document.
    pub fn add_json(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: &serde_json::Value,
    ) {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        self.add_with_headers(method, path, status, headers, body.to_string());
    }

    /// Fail `method path` at the transport level with a request timeout.
    pub fn fail(&self, method: Method, path: &str) {
        self.routes
            .lock()
            .insert((method, path.to_owned()), MockRoute::Fail);
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen for `method path`.
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|req| req.method == method && req.uri.path() == path)
            .count()
    }
}

impl tower::Service<http::Request<hyperdriver::Body>> for MockService {
    type Response = http::Response<hyperdriver::Body>;
    type Error = hyperdriver::client::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<hyperdriver::Body>) -> Self::Future {
        let routes = self.routes.clone();
        let requests = self.requests.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = body
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();

            let key = (parts.method.clone(), parts.uri.path().to_owned());
            requests.lock().push(RecordedRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            });

            let route = routes.lock().get(&key).cloned().unwrap_or_else(|| {
                panic!(
                    "No response configured for {method} {path}",
                    method = key.0,
                    path = key.1
                )
            });

            match route {
                MockRoute::Respond {
                    status,
                    headers,
                    body,
                } => {
                    let mut response = http::Response::builder()
                        .status(status)
                        .version(http::Version::HTTP_11)
                        .body(hyperdriver::Body::from(body))
                        .expect("mock response is valid");
                    *response.headers_mut() = headers;
                    Ok(response)
                }
                MockRoute::Fail => Err(hyperdriver::client::Error::RequestTimeout),
            }
        })
    }
}
