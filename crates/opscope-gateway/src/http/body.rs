//! Response body decorator that mirrors streamed bytes into a capture.
//!
//! Frames are pulled from the inner body only when the server pulls from
//! this one, so backpressure is untouched. The completion callback runs
//! exactly once: at end of stream, on a stream error, or when the body is
//! dropped.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use opscope_core::ResponseCapture;

/// How the response stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every frame was delivered.
    Finished,
    /// The inner body yielded an error (its display text).
    Failed(String),
    /// Dropped before the end, typically a client disconnect.
    Aborted,
}

type OnComplete = Box<dyn FnOnce(ResponseCapture, Completion) + Send>;

pub struct CaptureBody<B>
where
    B: Body,
{
    inner: B,
    state: Option<(ResponseCapture, OnComplete)>,
}

impl<B> CaptureBody<B>
where
    B: Body,
{
    pub fn new<F>(inner: B, capture: ResponseCapture, on_complete: F) -> Self
    where
        F: FnOnce(ResponseCapture, Completion) + Send + 'static,
    {
        Self {
            inner,
            state: Some((capture, Box::new(on_complete))),
        }
    }

    fn complete(&mut self, completion: Completion) {
        if let Some((capture, on_complete)) = self.state.take() {
            on_complete(capture, completion);
        }
    }
}

impl<B> Body for CaptureBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: fmt::Display,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some((capture, _))) = (frame.data_ref(), this.state.as_mut()) {
                    capture.record(data);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.complete(Completion::Failed(err.to_string()));
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.complete(Completion::Finished);
                Poll::Ready(None)
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

impl<B> Drop for CaptureBody<B>
where
    B: Body,
{
    fn drop(&mut self) {
        // Servers stop polling once is_end_stream() is true, so a drop after
        // the last frame still counts as finished.
        let completion = if self.inner.is_end_stream() {
            Completion::Finished
        } else {
            Completion::Aborted
        };
        self.complete(completion);
    }
}

impl<B> fmt::Debug for CaptureBody<B>
where
    B: Body,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureBody")
            .field("pending", &self.state.is_some())
            .finish()
    }
}
