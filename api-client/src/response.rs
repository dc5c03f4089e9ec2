//! Responses returned by an [ApiClient](crate::ApiClient).

use bytes::Bytes;
use http_body_util::BodyExt as _;
use hyperdriver::Body;

use crate::error::BoxError;

/// An HTTP response paired with the parts of the request which produced it.
#[derive(Debug)]
pub struct ApiResponse {
    request: http::request::Parts,
    response: http::response::Parts,
    body: Body,
}

impl ApiResponse {
    /// Pair a response with the request parts that generated it.
    pub fn new(request: http::request::Parts, response: http::Response<Body>) -> Self {
        let (response, body) = response.into_parts();

        Self {
            request,
            response,
            body,
        }
    }

    /// Status code of the response.
    pub fn status(&self) -> http::StatusCode {
        self.response.status
    }

    /// Response headers.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }

    /// URI of the request that generated the response.
    pub fn uri(&self) -> &http::Uri {
        &self.request.uri
    }

    /// Collect the full response body.
    pub async fn bytes(self) -> Result<Bytes, BoxError> {
        let collected = self.body.collect().await.map_err(Into::<BoxError>::into)?;
        Ok(collected.to_bytes())
    }
}
