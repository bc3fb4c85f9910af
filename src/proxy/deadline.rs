//! Upstream response bodies bounded by the forwarding deadline.
//!
//! The response head is awaited under `tokio::time::timeout_at`; once it is
//! back, the body keeps streaming under the same deadline. A body still
//! open when the deadline passes fails with [`BodyDeadlineExceeded`], which
//! makes the server abort the client connection.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use hyper::body::{Body, Frame, Incoming, SizeHint};
use thiserror::Error;
use tokio::time::{Instant, Sleep};

use crate::observability::metrics;

#[derive(Debug, Error)]
#[error("upstream body exceeded the forwarding deadline")]
pub struct BodyDeadlineExceeded;

/// An upstream body that errors once `deadline` passes.
pub struct DeadlineBody {
    inner: Incoming,
    sleep: Pin<Box<Sleep>>,
    service: String,
}

impl DeadlineBody {
    pub fn new(inner: Incoming, deadline: Instant, service: &str) -> Self {
        Self {
            inner,
            sleep: Box::pin(tokio::time::sleep_until(deadline)),
            service: service.to_string(),
        }
    }
}

impl Body for DeadlineBody {
    type Data = Bytes;
    type Error = axum::BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if let Poll::Ready(frame) = Pin::new(&mut this.inner).poll_frame(cx) {
            return Poll::Ready(frame.map(|result| result.map_err(Into::into)));
        }

        match this.sleep.as_mut().poll(cx) {
            Poll::Ready(()) => {
                tracing::error!(service = %this.service, "Upstream body timed out");
                metrics::record_upstream_error(&this.service, "body_timeout");
                Poll::Ready(Some(Err(BodyDeadlineExceeded.into())))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
