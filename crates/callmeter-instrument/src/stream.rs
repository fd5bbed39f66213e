use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::chunk::ChunkText;
use crate::observer::MetricObserver;

/// Boxed response stream returned by the vendor client traits.
pub type ChunkStream<T, E> = Pin<Box<dyn Stream<Item = Result<T, E>> + Send>>;

/// Passes every item of `inner` through unchanged while reporting the
/// first successful chunk and the end of the stream to an observer.
///
/// An error item marks the request as failed. Dropping the stream before
/// it ends records nothing.
pub struct ObservedStream<S, O> {
    inner: S,
    observer: O,
    text: String,
    seen_first: bool,
    finished: bool,
}

impl<S, O> ObservedStream<S, O> {
    /// `observer` must already have its timer started.
    pub fn new(inner: S, observer: O) -> Self {
        Self {
            inner,
            observer,
            text: String::new(),
            seen_first: false,
            finished: false,
        }
    }

    /// Text accumulated from the chunks seen so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, O, T, E> Stream for ObservedStream<S, O>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    O: MetricObserver + Unpin,
    T: ChunkText,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                let text = chunk.chunk_text();
                if !this.seen_first && !this.finished {
                    this.seen_first = true;
                    this.observer.observe_first_chunk(text);
                }
                if let Some(text) = text {
                    this.text.push_str(text);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                if !this.finished {
                    this.finished = true;
                    this.observer.observe_error();
                }
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if !this.finished {
                    this.finished = true;
                    this.observer.observe_completion(&this.text);
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
