//! Viewer connection: a tail session on the write half and an inbound
//! drain on the read half, tied together by one cancellation token.

use std::path::PathBuf;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use logyard_tail::{LineSink, SendError, SinkFuture, TailSession};
use tokio_util::sync::CancellationToken;

/// Sends each line as one text frame.
struct WsLineSink {
    sink: SplitSink<WebSocket, Message>,
}

impl LineSink for WsLineSink {
    fn send_line(&mut self, line: Vec<u8>) -> SinkFuture<'_> {
        Box::pin(async move {
            let text = String::from_utf8_lossy(&line).into_owned();
            self.sink
                .send(Message::Text(text))
                .await
                .map_err(|e| SendError(e.to_string()))
        })
    }
}

/// Streams `path` to an upgraded viewer socket until either side stops.
///
/// `cancel` is a child of the server token, so process shutdown ends the
/// session as well.
pub(crate) async fn serve_viewer(
    socket: WebSocket,
    endpoint: String,
    path: PathBuf,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(endpoint = %endpoint, "viewer connected");
    let (sink, stream) = socket.split();

    let drain_cancel = cancel.clone();
    let drain_endpoint = endpoint.clone();
    let drain = tokio::spawn(async move {
        drain_inbound(stream, &drain_endpoint, &drain_cancel).await;
        // Viewer gone: stop the sender too.
        drain_cancel.cancel();
    });

    let mut ws_sink = WsLineSink { sink };
    let session = TailSession::new(path, &mut ws_sink, poll_interval, cancel.clone());
    match session.run().await {
        Ok(()) => tracing::info!(endpoint = %endpoint, "viewer session ended"),
        Err(e) => tracing::warn!(endpoint = %endpoint, "viewer session error: {e}"),
    }

    cancel.cancel();
    // Best-effort close frame.
    let _ = ws_sink.sink.close().await;
    let _ = drain.await;
}

/// Reads and logs whatever the viewer sends; nothing is expected.
async fn drain_inbound(
    mut stream: SplitStream<WebSocket>,
    endpoint: &str,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(endpoint, "received close frame");
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(msg)) => {
                        tracing::info!(endpoint, ?msg, "unexpected read");
                    }
                    Some(Err(e)) => {
                        tracing::info!(endpoint, "read error: {e}");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}
