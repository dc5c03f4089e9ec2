//! Authentication for API clients.
//!
//! The [Authentication] trait decorates outgoing requests for an [ApiClient](crate::ApiClient).
//! The authentication object lives behind an `ArcSwap`, so a client can replace it
//! (for example after fetching a new access token) without being rebuilt. Replacement
//! is atomic: a request is decorated either by the old object or by the new one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tower::layer::Layer;

/// Trait to represent authenticating with an API queried via an [ApiClient](crate::ApiClient).
pub trait Authentication {
    /// Called for each authenticated request sent by the `ApiClient`.
    fn authenticate<B>(&self, req: http::Request<B>) -> http::Request<B>;
}

/// A layer which applies a swappable authentication object to every request.
#[derive(Debug)]
pub struct AuthenticationLayer<A> {
    auth: Arc<ArcSwap<A>>,
}

impl<A> Clone for AuthenticationLayer<A> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<A> AuthenticationLayer<A> {
    pub(crate) fn new(auth: Arc<ArcSwap<A>>) -> Self {
        Self { auth }
    }
}

impl<A, S> Layer<S> for AuthenticationLayer<A> {
    type Service = AuthenticationService<A, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationService {
            inner,
            auth: self.auth.clone(),
        }
    }
}

/// Service produced by [AuthenticationLayer].
#[derive(Debug)]
pub struct AuthenticationService<A, S> {
    inner: S,
    auth: Arc<ArcSwap<A>>,
}

impl<A, S: Clone> Clone for AuthenticationService<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl<A, S, BIn, BOut> tower::Service<http::Request<BIn>> for AuthenticationService<A, S>
where
    A: Authentication,
    S: tower::Service<http::Request<BIn>, Response = http::Response<BOut>>,
{
    type Response = http::Response<BOut>;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<BIn>) -> Self::Future {
        let req = self.auth.load().authenticate(req);
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use tower::ServiceExt as _;

    #[derive(Debug)]
    struct Tag(&'static str);

    impl Authentication for Tag {
        fn authenticate<B>(&self, mut req: http::Request<B>) -> http::Request<B> {
            req.headers_mut()
                .insert("x-tag", http::HeaderValue::from_static(self.0));
            req
        }
    }

    #[tokio::test]
    async fn swapped_authentication_applies_to_next_request() {
        let auth = Arc::new(ArcSwap::new(Arc::new(Tag("first"))));
        let echo = tower::service_fn(|req: http::Request<()>| async move {
            let tag = req.headers().get("x-tag").cloned();
            Ok::<_, Infallible>(http::Response::new(tag))
        });

        let service = AuthenticationLayer::new(auth.clone()).layer(echo);

        let response = service
            .clone()
            .oneshot(http::Request::new(()))
            .await
            .unwrap();
        assert_eq!(response.body().as_ref().unwrap(), "first");

        auth.store(Arc::new(Tag("second")));

        let response = service.oneshot(http::Request::new(())).await.unwrap();
        assert_eq!(response.body().as_ref().unwrap(), "second");
    }
}
