//! Record-batch stream abstractions.

use std::pin::Pin;
use std::task::{Context, Poll};

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use futures::future;
use futures::{Stream, StreamExt};
use mqe_common::Result;

/// A stream of RecordBatches that also knows its output schema.
pub trait RecordBatchStream: Stream<Item = Result<RecordBatch>> + Send {
    /// Output schema for every batch yielded by this stream.
    fn schema(&self) -> SchemaRef;
}

/// The standard "stream you can return from operators".
pub type SendableRecordBatchStream = Pin<Box<dyn RecordBatchStream>>;

/// Adapter that attaches a schema to any `Stream<Item = Result<RecordBatch>>`.
pub struct StreamAdapter<S> {
    schema: SchemaRef,
    inner: S,
}

impl<S> StreamAdapter<S> {
    /// Create a new schema-attached stream adapter.
    pub fn new(schema: SchemaRef, inner: S) -> Self {
        Self { schema, inner }
    }
}

impl<S> RecordBatchStream for StreamAdapter<S>
where
    S: Stream<Item = Result<RecordBatch>> + Send + Unpin + 'static,
{
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

impl<S> Stream for StreamAdapter<S>
where
    S: Stream<Item = Result<RecordBatch>> + Unpin,
{
    type Item = Result<RecordBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Create an empty stream (useful for early returns).
pub fn empty_stream(schema: SchemaRef) -> SendableRecordBatchStream {
    let inner = futures::stream::empty::<Result<RecordBatch>>();
    Box::pin(StreamAdapter::new(schema, inner))
}

/// Ends `inner` right after it yields its first error.
pub fn stop_after_error<S>(inner: S) -> impl Stream<Item = Result<RecordBatch>> + Send
where
    S: Stream<Item = Result<RecordBatch>> + Send,
{
    inner.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    })
}
