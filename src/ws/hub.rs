use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::sync::codec::{self, Frame};
use super::connctx::ConnRegistry;

const MAX_CHANNEL_NAME: usize = 128;

/// A frame as it travels through the hub, tagged with the connection that sent it
#[derive(Debug, Clone)]
pub struct RelayFrame {
    pub sender_id: Uuid,
    pub frame: Frame,
}

/// A member's handle on a hub channel
pub struct Membership {
    pub conn_id: Uuid,
    pub sender: broadcast::Sender<RelayFrame>,
    pub receiver: broadcast::Receiver<RelayFrame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub n_conn: u32,
    pub n_channels: u32,
    pub frames_relayed: u64,
    pub frames_dropped: u64,
}

/// Fans frames out to every other connection on the same named channel
pub struct RelayHub {
    channels: RwLock<HashMap<String, broadcast::Sender<RelayFrame>>>,
    connections: ConnRegistry,
    capacity: usize,
    frames_relayed: AtomicU64,
    frames_dropped: AtomicU64,
}

impl RelayHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            connections: ConnRegistry::new(),
            capacity: capacity.max(1),
            frames_relayed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Join a channel, creating it on first use
    pub fn join(&self, channel: &str) -> Membership {
        // Subscribe while holding the map lock: `leave` drops a channel once it
        // sees no receivers, and a sender handed out without one could end up
        // orphaned from the map.
        let (sender, receiver) = {
            let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
            let sender = channels
                .entry(channel.to_string())
                .or_insert_with(|| {
                    info!("Opening relay channel {}", channel);
                    broadcast::channel::<RelayFrame>(self.capacity).0
                });
            (sender.clone(), sender.subscribe())
        };
        let conn_id = Uuid::new_v4();
        self.connections.register(conn_id, channel);
        Membership {
            conn_id,
            sender,
            receiver,
        }
    }

    /// Forget a connection; the channel goes away with its last member
    pub fn leave(&self, channel: &str, conn_id: Uuid) {
        self.connections.remove(&conn_id);
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = channels.get(channel) {
            if sender.receiver_count() == 0 {
                channels.remove(channel);
                info!("Closed relay channel {}", channel);
            }
        }
    }

    /// Validate and forward one frame. Frames that do not decode are dropped.
    pub fn relay(&self, channel: &str, sender_id: Uuid, frame: Frame, sender: &broadcast::Sender<RelayFrame>) -> bool {
        self.connections.touch(&sender_id);
        match codec::decode(&frame) {
            Ok(envelope) => {
                match envelope.message.timestamp() {
                    Some(ts) => debug!("Relaying {} frame stamped {} on {} from {}", envelope.message.label(), ts, channel, sender_id),
                    None => debug!("Relaying {} frame on {} from {}", envelope.message.label(), channel, sender_id),
                }
            }
            Err(e) => {
                error!("Dropping malformed frame on {} from {}: {}", channel, sender_id, e);
                self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }
        if let Err(e) = sender.send(RelayFrame { sender_id, frame }) {
            error!("Failed to relay on {}: {}", channel, e);
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn stats(&self) -> HubStats {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        HubStats {
            n_conn: channels.values().map(|s| s.receiver_count()).sum::<usize>() as u32,
            n_channels: channels.len() as u32,
            frames_relayed: self.frames_relayed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn connection_contexts(&self) -> u64 {
        self.connections.count()
    }
}

/// Channel names double as URL path segments
pub fn validate_channel_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Channel name cannot be empty".to_string());
    }
    if name.len() > MAX_CHANNEL_NAME {
        return Err(format!("Channel name longer than {} characters", MAX_CHANNEL_NAME));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))) {
        return Err(format!("Invalid character '{}' in channel name", c));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PresenceSignal, SyncMessage};
    use crate::sync::channel::Envelope;
    use crate::sync::codec::WireFormat;

    fn typing_frame() -> Frame {
        let envelope = Envelope {
            origin: Uuid::new_v4(),
            message: SyncMessage::Typing(PresenceSignal::new("user-1", "Alice Chen", true)),
        };
        codec::encode(&envelope, WireFormat::Json).unwrap()
    }

    #[test]
    fn channel_names_are_checked() {
        assert!(validate_channel_name("nexus_workspace_sync_v2").is_ok());
        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name("a/b").is_err());
        assert!(validate_channel_name(&"x".repeat(129)).is_err());
    }

    #[tokio::test]
    async fn relays_to_members_and_counts() {
        let hub = RelayHub::new(16);
        let a = hub.join("nexus");
        let mut b = hub.join("nexus");

        assert!(hub.relay("nexus", a.conn_id, typing_frame(), &a.sender));
        assert!(!hub.relay("nexus", a.conn_id, Frame::Text("{\"kind\":\"calendar\"}".to_string()), &a.sender));

        let received = b.receiver.recv().await.unwrap();
        assert_eq!(received.sender_id, a.conn_id);
        assert!(b.receiver.try_recv().is_err());

        let stats = hub.stats();
        assert_eq!(stats.n_conn, 2);
        assert_eq!(stats.n_channels, 1);
        assert_eq!(stats.frames_relayed, 1);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[tokio::test]
    async fn channel_closes_with_last_member() {
        let hub = RelayHub::new(16);
        let a = hub.join("nexus");
        let a_id = a.conn_id;
        drop(a);
        hub.leave("nexus", a_id);
        assert_eq!(hub.stats().n_channels, 0);
        assert_eq!(hub.connection_contexts(), 0);
    }

    #[test]
    fn join_racing_last_leave_stays_reachable() {
        let hub = RelayHub::new(16);
        for _ in 0..500 {
            let a = hub.join("nexus");
            let a_id = a.conn_id;
            let mut b = std::thread::scope(|s| {
                s.spawn(|| {
                    drop(a);
                    hub.leave("nexus", a_id);
                });
                s.spawn(|| hub.join("nexus")).join().unwrap()
            });

            let c = hub.join("nexus");
            assert!(hub.relay("nexus", c.conn_id, typing_frame(), &c.sender));
            let received = b.receiver.try_recv().unwrap();
            assert_eq!(received.sender_id, c.conn_id);

            let (b_id, c_id) = (b.conn_id, c.conn_id);
            drop((b, c));
            hub.leave("nexus", b_id);
            hub.leave("nexus", c_id);
        }
        assert_eq!(hub.stats().n_channels, 0);
        assert_eq!(hub.connection_contexts(), 0);
    }
}
