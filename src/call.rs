use std::future::Future;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::debug;

use crate::outbound::ChannelOutbound;
use crate::sink::ResponseSink;

/// Inbound side of a call as a stream of messages or a terminal status.
pub type InboundStream<T> = BoxStream<'static, Result<T, Status>>;

/// Requests queued ahead of the transport before `send` starts waiting.
const OUTBOUND_BUFFER: usize = 16;

/// Opens a streaming exchange.
///
/// `invoke` receives the outbound request stream and resolves to the inbound
/// stream once the call is established; a call with a single response is
/// expected to hand back a one-element stream. The call runs on its own task,
/// which feeds `sink` until the inbound stream ends (`on_completed`), fails
/// (`on_error`) or is aborted through the returned handle (`on_error` with the
/// abort cause). Exactly one terminal event reaches the sink.
pub fn open_streaming_call<Req, Resp, F, Fut, S>(invoke: F, sink: S) -> ChannelOutbound<Req>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    F: FnOnce(ReceiverStream<Req>) -> Fut,
    Fut: Future<Output = Result<InboundStream<Resp>, Status>> + Send + 'static,
    S: ResponseSink<Resp>,
{
    let (sender, receiver) = mpsc::channel(OUTBOUND_BUFFER);
    let (abort_tx, abort_rx) = oneshot::channel();

    let call = invoke(ReceiverStream::new(receiver));
    tokio::spawn(deliver(call, abort_rx, sink));

    ChannelOutbound::new(sender, abort_tx)
}

async fn deliver<Resp, Fut, S>(call: Fut, abort: oneshot::Receiver<Status>, mut sink: S)
where
    Fut: Future<Output = Result<InboundStream<Resp>, Status>>,
    S: ResponseSink<Resp>,
{
    let result = {
        let exchange = pump(call, &mut sink);
        tokio::pin!(exchange);

        tokio::select! {
            result = &mut exchange => result,
            // A dropped handle closes the channel without a cause; the
            // exchange then runs to its natural end.
            Ok(cause) = abort => {
                debug!(code = ?cause.code(), "Aborting call");
                Err(cause)
            }
        }
    };

    match result {
        Ok(()) => sink.on_completed(),
        Err(status) => sink.on_error(status),
    }
}

async fn pump<Resp, Fut, S>(call: Fut, sink: &mut S) -> Result<(), Status>
where
    Fut: Future<Output = Result<InboundStream<Resp>, Status>>,
    S: ResponseSink<Resp>,
{
    let mut inbound = call.await?;
    while let Some(item) = inbound.next().await {
        // None means the end of the stream; Some(Err) is a status from the
        // server and ends the exchange.
        sink.on_element(item?);
    }
    Ok(())
}
