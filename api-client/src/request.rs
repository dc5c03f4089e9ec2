use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderName, Method, Uri};
use hyperdriver::Body;
use serde::Serialize;

use crate::error::Error;
use crate::response::ApiResponse;
use crate::uri::UriExtension as _;
use crate::{ApiClient, Authentication};

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// Copy the method, URI and headers of a request, leaving the body behind.
pub(crate) fn request_parts<B>(req: &http::Request<B>) -> http::request::Parts {
    let mut builder = http::Request::builder()
        .uri(req.uri().clone())
        .method(req.method().clone())
        .version(req.version());

    if let Some(headers) = builder.headers_mut() {
        *headers = req.headers().clone();
    }

    let (parts, _) = builder
        .body(())
        .expect("parts copied from a valid request")
        .into_parts();
    parts
}

/// Builder for a single request sent through an [ApiClient].
///
/// Requests are authenticated by the client's [Authentication] unless
/// [RequestBuilder::without_authentication] is used.
#[derive(Debug)]
pub struct RequestBuilder<A> {
    client: ApiClient<A>,
    uri: Uri,
    req: http::request::Builder,
    body: Option<Body>,
    authenticated: bool,
}

impl<A> RequestBuilder<A> {
    /// Start a request for `uri` with `method`.
    pub fn new(client: ApiClient<A>, uri: Uri, method: Method) -> Self {
        Self {
            client,
            uri,
            req: http::Request::builder()
                .method(method)
                .version(http::Version::HTTP_11),
            body: None,
            authenticated: true,
        }
    }

    /// The URI this request will be sent to.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Add a header to the request.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.req = self.req.header(key, value);
        self
    }

    /// Replace the query string with the form-encoded `query`.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self, Error> {
        self.uri = self
            .uri
            .with_query(query)
            .map_err(|error| Error::Encode(error.into()))?;
        Ok(self)
    }

    /// Send `body` as a JSON document.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, Error> {
        let body = serde_json::to_vec(body).map_err(|error| Error::Encode(error.into()))?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .body(Bytes::from(body)))
    }

    /// Send `form` as an `application/x-www-form-urlencoded` body.
    pub fn form<T: Serialize + ?Sized>(self, form: &T) -> Result<Self, Error> {
        let body =
            serde_urlencoded::to_string(form).map_err(|error| Error::Encode(error.into()))?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_FORM))
            .body(Bytes::from(body)))
    }

    /// Set the raw request body.
    pub fn body<B: Into<Body>>(self, body: B) -> Self {
        Self {
            body: Some(body.into()),
            ..self
        }
    }

    /// Send this request straight to the transport, skipping the client's authentication.
    pub fn without_authentication(self) -> Self {
        Self {
            authenticated: false,
            ..self
        }
    }

    /// Assemble the HTTP request.
    pub fn build(self) -> Result<http::Request<Body>, Error> {
        Ok(self
            .req
            .uri(self.uri)
            .body(self.body.unwrap_or_else(Body::empty))?)
    }

    /// Send the request and wait for the response head.
    pub async fn send(self) -> Result<ApiResponse, Error>
    where
        A: Authentication,
    {
        let client = self.client.clone();
        let authenticated = self.authenticated;
        let req = self.build()?;

        tracing::trace!(method = %req.method(), uri = %req.uri(), authenticated, "sending request");
        let response = if authenticated {
            client.execute(req).await?
        } else {
            client.execute_unauthenticated(req).await?
        };
        Ok(response)
    }
}
