use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::SyncMessage;
use super::error::{ChannelError, ChannelResult};

/// A sync message tagged with the context that published it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub origin: Uuid,
    #[serde(flatten)]
    pub message: SyncMessage,
}

/// A named broadcast channel shared by every context of the same workspace.
///
/// Implementations deliver each posted message to the other subscribers in
/// the order it was posted by its sender. Delivery back to the sender is
/// allowed but receivers drop envelopes carrying their own origin.
pub trait SyncChannel: Send + Sync + 'static {
    /// Identity stamped on everything this handle posts
    fn origin(&self) -> Uuid;

    fn name(&self) -> &str;

    fn post(&self, message: &SyncMessage) -> ChannelResult<()>;

    fn subscribe(&self) -> ChannelResult<broadcast::Receiver<Envelope>>;

    fn close(&self);
}

/// In-process broadcast bus. Every `open` of the same name joins the same topic.
#[derive(Debug, Clone)]
pub struct LocalBus {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<Envelope>>>>,
    capacity: usize,
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn sender_for(&self, name: &str) -> broadcast::Sender<Envelope> {
        if let Some(sender) = self.topics.read().unwrap_or_else(|e| e.into_inner()).get(name) {
            return sender.clone();
        }
        let mut guard = self.topics.write().unwrap_or_else(|e| e.into_inner());
        guard
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Open a handle on the named topic with a fresh origin
    pub fn open(&self, name: &str) -> LocalChannel {
        LocalChannel {
            origin: Uuid::new_v4(),
            name: name.to_string(),
            sender: self.sender_for(name),
            closed: AtomicBool::new(false),
        }
    }
}

#[derive(Debug)]
pub struct LocalChannel {
    origin: Uuid,
    name: String,
    sender: broadcast::Sender<Envelope>,
    closed: AtomicBool,
}

impl SyncChannel for LocalChannel {
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
        // No subscribers is not an error: nobody is listening yet
        if self.sender.send(envelope).is_err() {
            debug!("No listeners on channel {}", self.name);
        }
        Ok(())
    }

    fn subscribe(&self) -> ChannelResult<broadcast::Receiver<Envelope>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        Ok(self.sender.subscribe())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
