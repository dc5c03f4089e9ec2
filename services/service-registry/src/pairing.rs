//! Pairing responses fetched from service-published URLs.

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Uri};

/// A pairing response, fetched from a URL published by a service.
///
/// Kept undecoded: the pairing endpoint belongs to the paired service, not the
/// registry, so the client makes no assumption about its format.
#[derive(Debug, Clone)]
pub struct PairingResponse {
    uri: Uri,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl PairingResponse {
    /// A pairing response received from `uri`.
    pub fn new(uri: Uri, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            uri,
            status,
            headers,
            body,
        }
    }

    /// The URL the pairing info was fetched from.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
