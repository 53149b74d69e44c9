use chrono::{DateTime, Utc};
use moka::sync::Cache;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ConnCtx {
    pub channel: String,
    pub connected_at: DateTime<Utc>,
}

/// Contexts of live relay connections.
///
/// Entries stay until the connection leaves, however quiet it is.
#[derive(Clone)]
pub struct ConnRegistry {
    cache: Cache<Uuid, ConnCtx>,
}

impl ConnRegistry {
    pub fn new() -> Self {
        let cache = Cache::builder().max_capacity(100_000).build();
        info!("Connection context registry initialized");
        Self { cache }
    }

    pub fn register(&self, conn_id: Uuid, channel: &str) {
        self.cache.insert(conn_id, ConnCtx {
            channel: channel.to_string(),
            connected_at: Utc::now(),
        });
    }

    /// Look a connection up
    pub fn touch(&self, conn_id: &Uuid) -> Option<ConnCtx> {
        self.cache.get(conn_id)
    }

    pub fn remove(&self, conn_id: &Uuid) {
        self.cache.invalidate(conn_id);
    }

    pub fn count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl Default for ConnRegistry {
    fn default() -> Self {
        Self::new()
    }
}
