use std::pin::Pin;
use std::task::{Context, Poll};
use futures::Stream;
use futures::stream::BoxStream;
use crate::timing::Timer;

/// The model's outputs for one batch, tagged with the input positions they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    /// Input position of each output, in batch order
    indices: Vec<usize>,

    /// One output per sequence of the batch
    outputs: Vec<String>,
}

impl BatchOutput {
    /// Pairs `indices` with `outputs`; both are in batch order and of equal length.
    pub(crate) fn new(indices: Vec<usize>, outputs: Vec<String>) -> Self {
        debug_assert_eq!(indices.len(), outputs.len());
        Self { indices, outputs }
    }

    /// Number of outputs in this batch.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Input positions, in batch order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Outputs, in batch order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn into_outputs(self) -> Vec<String> {
        self.outputs
    }
}

impl IntoIterator for BatchOutput {
    type Item = (usize, String);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<usize>, std::vec::IntoIter<String>>;

    /// Iterates `(input position, output)` pairs.
    fn into_iter(self) -> Self::IntoIter {
        self.indices.into_iter().zip(self.outputs)
    }
}

/// # OutputStream
///
/// The per-batch results of one [`SortedBatchInference::run`](super::SortedBatchInference::run)
/// call, as a `futures` [`Stream`].
///
/// ## Behaviour
///
/// - Demand driven: a batch is packed and sent to the model only when the stream is polled
/// - Ends after the last batch, or right after the first error
/// - Dropping the stream abandons the remaining batches; nothing needs cleaning up
///
/// ## Timing
///
/// [`OutputStream::timed`] attaches a [`Timer`] that reports when the stream is exhausted,
/// or when it is dropped if the consumer stops early.
pub struct OutputStream<'a, E> {
    inner: BoxStream<'a, Result<BatchOutput, E>>,
    timer: Option<Timer>,
}

impl<'a, E> OutputStream<'a, E> {
    pub(crate) fn new(inner: BoxStream<'a, Result<BatchOutput, E>>) -> Self {
        Self {
            inner,
            timer: None,
        }
    }

    /// Times the whole stream under `label`.
    pub fn timed(mut self, label: impl Into<String>) -> Self {
        self.timer = Some(Timer::start(label));
        self
    }
}

impl<E> Stream for OutputStream<'_, E> {
    type Item = Result<BatchOutput, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_next(cx);
        if let Poll::Ready(None) = polled {
            if let Some(timer) = this.timer.take() {
                timer.stop();
            }
        }
        polled
    }
}
