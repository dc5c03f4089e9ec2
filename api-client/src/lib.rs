//! Shared plumbing for HTTP API clients.
//!
//! [ApiClient] pairs a base URI with a `tower` transport and a swappable
//! [Authentication] object. Individual service clients wrap an `ApiClient`
//! and translate their operations into requests built with [RequestBuilder].

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use arc_swap::Guard;
use http::Method;
use http::Uri;
use hyperdriver::client::SharedClientService;
use hyperdriver::service::SharedService;
use hyperdriver::Body;
use tower::ServiceExt;

mod authentication;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod request;
pub mod response;
mod secret;
pub mod timeout;
pub mod uri;

pub use self::authentication::{Authentication, AuthenticationLayer, AuthenticationService};
pub use self::error::Error;
pub use self::request::RequestBuilder;
pub use self::response::ApiResponse;
pub use self::secret::Secret;
use self::timeout::TimeoutLayer;
use self::uri::UriExtension as _;

/// Options for the transport built by [ApiClient::with_options].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportOptions {
    /// Bound on each whole request, from sending until the response head arrives.
    pub timeout: Option<Duration>,

    /// Bound on establishing each TCP connection.
    pub connect_timeout: Option<Duration>,
}

/// A client for accessing APIs over HTTP / HTTPS
///
/// Useful inner object to wrap for individual API clients. Clones share the
/// transport and the authentication object.
#[derive(Debug)]
pub struct ApiClient<A> {
    base: Arc<Uri>,
    transport: SharedClientService<Body, Body>,
    inner: SharedClientService<Body, Body>,
    authentication: Arc<ArcSwap<A>>,
}

impl<A> Clone for ApiClient<A> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            transport: self.transport.clone(),
            inner: self.inner.clone(),
            authentication: self.authentication.clone(),
        }
    }
}

impl<A> ApiClient<A>
where
    A: Authentication + Send + Sync + 'static,
{
    /// Create a new API Client from a base URL and an authentication method
    pub fn new(base: Uri, authentication: A) -> Self {
        Self::with_options(base, authentication, TransportOptions::default())
    }

    /// Create a new API Client over a TLS-verifying TCP transport with the given options.
    pub fn with_options(base: Uri, authentication: A, options: TransportOptions) -> Self {
        let mut builder = hyperdriver::Client::build_tcp_http();
        builder.transport().config_mut().connect_timeout = options.connect_timeout;

        let transport = builder.with_default_tls().build_service();
        Self::new_with_inner_service(base, authentication, transport, options.timeout)
    }

    /// Create a new API Client on top of an arbitrary transport service.
    pub fn new_with_inner_service<S>(
        base: Uri,
        authentication: A,
        inner: S,
        timeout: Option<Duration>,
    ) -> Self
    where
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let authentication = Arc::new(ArcSwap::new(Arc::new(authentication)));

        let transport: SharedClientService<Body, Body> = match timeout {
            Some(timeout) => tower::ServiceBuilder::new()
                .layer(SharedService::layer())
                .layer(TimeoutLayer::new(timeout))
                .service(inner),
            None => tower::ServiceBuilder::new()
                .layer(SharedService::layer())
                .service(inner),
        };

        let inner = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .layer(AuthenticationLayer::new(authentication.clone()))
            .service(transport.clone());

        ApiClient {
            base: Arc::new(base),
            transport,
            inner,
            authentication,
        }
    }
}

impl<A> ApiClient<A> {
    /// The base URI which relative endpoints are joined onto.
    pub fn base(&self) -> &Uri {
        &self.base
    }

    /// Atomically replace the authentication used for subsequent requests.
    pub fn refresh_auth(&self, authentication: A) {
        self.authentication.store(Arc::new(authentication));
    }

    /// The authentication currently in use.
    pub fn auth(&self) -> Guard<Arc<A>> {
        self.authentication.load()
    }

    /// Build a request for an endpoint relative to the base URI.
    pub fn endpoint(&self, method: Method, endpoint: &str) -> RequestBuilder<A> {
        let uri = (*self.base).clone().join(endpoint);
        RequestBuilder::new(self.clone(), uri, method)
    }

    /// Build a GET request for an endpoint relative to the base URI.
    pub fn get(&self, endpoint: &str) -> RequestBuilder<A> {
        self.endpoint(Method::GET, endpoint)
    }

    /// Build a POST request for an endpoint relative to the base URI.
    pub fn post(&self, endpoint: &str) -> RequestBuilder<A> {
        self.endpoint(Method::POST, endpoint)
    }

    /// Build a request for an absolute URI, which may be on another host.
    pub fn request(&self, method: Method, uri: Uri) -> RequestBuilder<A> {
        RequestBuilder::new(self.clone(), uri, method)
    }

    /// Send an authenticated request.
    pub async fn execute(
        &self,
        req: http::Request<Body>,
    ) -> Result<ApiResponse, hyperdriver::client::Error> {
        let parts = self::request::request_parts(&req);
        let response = self.inner.clone().oneshot(req).await?;
        Ok(ApiResponse::new(parts, response))
    }

    /// Send a request without applying the client's authentication.
    pub async fn execute_unauthenticated(
        &self,
        req: http::Request<Body>,
    ) -> Result<ApiResponse, hyperdriver::client::Error> {
        let parts = self::request::request_parts(&req);
        let response = self.transport.clone().oneshot(req).await?;
        Ok(ApiResponse::new(parts, response))
    }
}
