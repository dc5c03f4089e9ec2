//! Whole-request timeouts for client transports.
//!
//! A request which does not produce a response within the deadline fails with
//! [hyperdriver::client::Error::RequestTimeout].

use std::time::Duration;

/// A layer which bounds every request with a fixed timeout.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    /// Create a new timeout layer.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> tower::Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            service: inner,
            timeout: self.timeout,
        }
    }
}

/// A [tower::Service] produced by [TimeoutLayer].
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    service: S,
    timeout: Duration,
}

impl<S, R> tower::Service<R> for TimeoutService<S>
where
    S: tower::Service<R, Error = hyperdriver::client::Error>,
{
    type Response = S::Response;
    type Error = hyperdriver::client::Error;
    type Future = self::future::TimeoutFuture<S::Future>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        self::future::TimeoutFuture::new(self.service.call(req), self.timeout)
    }
}

mod future {
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{ready, Context, Poll};
    use std::time::Duration;

    use pin_project::pin_project;
    use tokio::time::Timeout;

    #[pin_project]
    #[derive(Debug)]
    pub struct TimeoutFuture<F> {
        #[pin]
        future: Timeout<F>,
    }

    impl<F: Future> TimeoutFuture<F> {
        pub(super) fn new(future: F, timeout: Duration) -> Self {
            Self {
                future: tokio::time::timeout(timeout, future),
            }
        }
    }

    impl<F, R> Future for TimeoutFuture<F>
    where
        F: Future<Output = Result<R, hyperdriver::client::Error>>,
    {
        type Output = Result<R, hyperdriver::client::Error>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            Poll::Ready(match ready!(self.project().future.poll(cx)) {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!("request timed out");
                    Err(hyperdriver::client::Error::RequestTimeout)
                }
            })
        }
    }
}
