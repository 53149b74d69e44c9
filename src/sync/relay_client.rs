use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::SyncMessage;
use super::channel::{Envelope, SyncChannel};
use super::codec::{self, Frame, WireFormat};
use super::error::{ChannelError, ChannelResult};
use super::lock;

enum Outbound {
    Frame(Frame),
    Close,
}

/// A `SyncChannel` carried over a WebSocket to the relay server, for contexts
/// that do not share a process.
pub struct RelayChannel {
    origin: Uuid,
    name: String,
    format: WireFormat,
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: broadcast::Sender<Envelope>,
    closed: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl RelayChannel {
    /// Connect to `{base_url}/ws/{name}`, e.g. `ws://127.0.0.1:3000`
    pub async fn connect(base_url: &str, name: &str, format: WireFormat, capacity: usize) -> ChannelResult<Self> {
        let url = format!("{}/ws/{}", base_url.trim_end_matches('/'), name);
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        info!("Connected to relay {}", url);

        let (mut sink, mut source) = stream.split();
        let (outbound, mut queue) = mpsc::unbounded_channel::<Outbound>();
        let (inbound, _) = broadcast::channel(capacity.max(1));
        let closed = Arc::new(AtomicBool::new(false));

        // Writer: drains the queue in order, so per-sender ordering holds on the wire
        tokio::spawn(async move {
            while let Some(next) = queue.recv().await {
                let message = match next {
                    Outbound::Frame(Frame::Text(text)) => WsMessage::Text(text.into()),
                    Outbound::Frame(Frame::Binary(bytes)) => WsMessage::Binary(bytes.into()),
                    Outbound::Close => break,
                };
                if let Err(e) = sink.send(message).await {
                    warn!("Relay send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let fanout = inbound.clone();
        let reader_closed = closed.clone();
        let reader = tokio::spawn(async move {
            while let Some(next) = source.next().await {
                let decoded = match next {
                    Ok(WsMessage::Text(text)) => codec::decode_text(text.as_str()),
                    Ok(WsMessage::Binary(bytes)) => codec::decode_binary(&bytes),
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Relay receive failed: {}", e);
                        break;
                    }
                };
                match decoded {
                    Ok(envelope) => {
                        let _ = fanout.send(envelope);
                    }
                    Err(e) => debug!("Dropping malformed relay frame: {}", e),
                }
            }
            reader_closed.store(true, Ordering::Release);
            debug!("Relay connection closed");
        });

        Ok(Self {
            origin: Uuid::new_v4(),
            name: name.to_string(),
            format,
            outbound,
            inbound,
            closed,
            reader: Mutex::new(Some(reader)),
        })
    }
}

impl SyncChannel for RelayChannel {
    fn origin(&self) -> Uuid {
        self.origin
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, message: &SyncMessage) -> ChannelResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        let envelope = Envelope {
            origin: self.origin,
            message: message.clone(),
        };
        let frame = codec::encode(&envelope, self.format)?;
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| ChannelError::Closed)
    }

    fn subscribe(&self) -> ChannelResult<broadcast::Receiver<Envelope>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        Ok(self.inbound.subscribe())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.outbound.send(Outbound::Close);
        if let Some(reader) = lock(&self.reader).take() {
            reader.abort();
        }
    }
}

impl Drop for RelayChannel {
    fn drop(&mut self) {
        self.close();
    }
}
