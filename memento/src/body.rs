//! Streamed pass-through with write-back accumulation.
//!
//! Transparent-mode misses forward origin bytes to the client as they
//! arrive while the same chunks accumulate for the cache. [`TeeBody`]
//! wraps the origin byte stream as an [`http_body::Body`]; every chunk is
//! yielded to the client and pushed into a [`BodyAccumulator`]. On clean
//! stream end the frozen buffer is sent through a oneshot channel to the
//! write-back task. A mid-stream transport error drops the channel — a
//! partial transfer is never persisted — and propagates to the client
//! connection through the body's own error path.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;
use tokio::sync::oneshot;

/// Buffers body chunks until the stream ends.
#[derive(Debug, Default)]
pub struct BodyAccumulator {
    buf: BytesMut,
}

impl BodyAccumulator {
    /// Appends a chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finalizes the accumulator into the complete body.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// A response body that forwards chunks while accumulating them.
#[pin_project]
pub struct TeeBody<S> {
    #[pin]
    inner: S,
    // Taken on completion or error; None once finalized.
    accumulator: Option<(BodyAccumulator, oneshot::Sender<Bytes>)>,
}

impl<S> TeeBody<S> {
    /// Wraps a byte stream. The receiver resolves with the complete body
    /// when the stream ends cleanly, and errors when it does not.
    pub fn new(inner: S) -> (Self, oneshot::Receiver<Bytes>) {
        let (sender, receiver) = oneshot::channel();
        (
            TeeBody {
                inner,
                accumulator: Some((BodyAccumulator::default(), sender)),
            },
            receiver,
        )
    }
}

impl<S, E> Body for TeeBody<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Data = Bytes;
    type Error = E;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        match futures::ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                if let Some((accumulator, _)) = this.accumulator.as_mut() {
                    accumulator.push(&chunk);
                }
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            Some(Err(error)) => {
                // Partial transfers are never persisted.
                this.accumulator.take();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                if let Some((accumulator, sender)) = this.accumulator.take() {
                    let _ = sender.send(accumulator.finish());
                }
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}
