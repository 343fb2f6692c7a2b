use tokio::sync::{mpsc, oneshot};
use tonic::Status;

use crate::error::ClientError;

/// Send side of a streaming exchange.
///
/// Elements reach the server in the order they were sent. After either close
/// the handle refuses further `send`s. `close_with_error` is still accepted
/// after `close_normally`, which is how an overdue exchange is abandoned.
#[tonic::async_trait]
pub trait OutboundStream<T>: Send
where
    T: Send + 'static,
{
    /// Queues `item`, waiting while the outbound buffer is full.
    async fn send(&mut self, item: T) -> Result<(), ClientError>;

    /// No more elements; the server finishes the exchange.
    fn close_normally(&mut self) -> Result<(), ClientError>;

    /// Aborts the call. The response sink sees `cause` as its terminal error
    /// unless the exchange already ended.
    fn close_with_error(&mut self, cause: Status) -> Result<(), ClientError>;
}

/// [`OutboundStream`] backed by the request channel of a call opened with
/// [`open_streaming_call`](crate::open_streaming_call).
#[derive(Debug)]
pub struct ChannelOutbound<T> {
    sender: Option<mpsc::Sender<T>>,
    abort: Option<oneshot::Sender<Status>>,
}

impl<T> ChannelOutbound<T> {
    pub(crate) fn new(sender: mpsc::Sender<T>, abort: oneshot::Sender<Status>) -> Self {
        ChannelOutbound {
            sender: Some(sender),
            abort: Some(abort),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }
}

#[tonic::async_trait]
impl<T> OutboundStream<T> for ChannelOutbound<T>
where
    T: Send + 'static,
{
    async fn send(&mut self, item: T) -> Result<(), ClientError> {
        let sender = self.sender.as_ref().ok_or(ClientError::OutboundClosed)?;
        sender
            .send(item)
            .await
            .map_err(|_| ClientError::StreamEnded)
    }

    fn close_normally(&mut self) -> Result<(), ClientError> {
        // Dropping the sender ends the request stream.
        self.sender
            .take()
            .map(drop)
            .ok_or(ClientError::OutboundClosed)
    }

    fn close_with_error(&mut self, cause: Status) -> Result<(), ClientError> {
        let abort = self.abort.take().ok_or(ClientError::OutboundClosed)?;
        self.sender.take();
        // The call may have finished already, in which case there is nothing
        // left to abort.
        let _ = abort.send(cause);
        Ok(())
    }
}
