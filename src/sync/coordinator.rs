use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Agreement, Document, Message, Persona, PresenceSignal, Project, StreamItem, StreamKind,
    SyncMessage, VersionedPayload,
};
use super::channel::{Envelope, SyncChannel};
use super::clock::Clock;
use super::error::SyncError;
use super::lock;
use super::presence::{PresenceTimers, TypingThrottle};
use super::version::{StreamVersion, VersionTable};

pub type ReplaceFn<T> = Arc<dyn Fn(Vec<T>) + Send + Sync>;
pub type PresenceFn = Arc<dyn Fn(&str, &str, bool) + Send + Sync>;

/// Host callbacks invoked when a peer's update wins or presence changes
#[derive(Clone, Default)]
pub struct SyncHandlers {
    messages: Option<ReplaceFn<Message>>,
    projects: Option<ReplaceFn<Project>>,
    documents: Option<ReplaceFn<Document>>,
    personas: Option<ReplaceFn<Persona>>,
    agreements: Option<ReplaceFn<Agreement>>,
    presence: Option<PresenceFn>,
}

impl SyncHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_messages(mut self, f: impl Fn(Vec<Message>) + Send + Sync + 'static) -> Self {
        self.messages = Some(Arc::new(f));
        self
    }

    pub fn on_projects(mut self, f: impl Fn(Vec<Project>) + Send + Sync + 'static) -> Self {
        self.projects = Some(Arc::new(f));
        self
    }

    pub fn on_documents(mut self, f: impl Fn(Vec<Document>) + Send + Sync + 'static) -> Self {
        self.documents = Some(Arc::new(f));
        self
    }

    pub fn on_personas(mut self, f: impl Fn(Vec<Persona>) + Send + Sync + 'static) -> Self {
        self.personas = Some(Arc::new(f));
        self
    }

    pub fn on_agreements(mut self, f: impl Fn(Vec<Agreement>) + Send + Sync + 'static) -> Self {
        self.agreements = Some(Arc::new(f));
        self
    }

    /// Called with `(user_id, name, is_typing)`
    pub fn on_presence(mut self, f: impl Fn(&str, &str, bool) + Send + Sync + 'static) -> Self {
        self.presence = Some(Arc::new(f));
        self
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// How long a typing indicator survives without a refresh
    pub presence_timeout: Duration,
    /// Minimum spacing between two typing=true publishes
    pub typing_throttle_ms: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            presence_timeout: Duration::from_millis(3000),
            typing_throttle_ms: 500,
        }
    }
}

/// Keeps one context's copy of the five collections and the presence map in
/// step with every other context on the same channel.
///
/// Cloning yields another handle to the same coordinator. Dropping the last
/// handle tears it down.
#[derive(Clone)]
pub struct SyncCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    channel: Arc<dyn SyncChannel>,
    clock: Arc<dyn Clock>,
    handlers: SyncHandlers,
    settings: SyncSettings,
    runtime: Handle,
    // One per stream; held across apply-and-replace and local-update-and-stamp
    gates: [Mutex<()>; StreamKind::ALL.len()],
    versions: Mutex<VersionTable>,
    timers: Mutex<PresenceTimers>,
    throttle: Mutex<TypingThrottle>,
    listener: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
}

impl SyncCoordinator {
    /// Subscribe to `channel` and start applying peer updates.
    ///
    /// Must be called from within a tokio runtime; the receive loop and the
    /// presence timers run on it.
    pub fn initialize(
        channel: Arc<dyn SyncChannel>,
        handlers: SyncHandlers,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Result<Self, SyncError> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let receiver = channel.subscribe()?;
        let origin = channel.origin();

        let shared = Arc::new(Shared {
            throttle: Mutex::new(TypingThrottle::new(settings.typing_throttle_ms)),
            channel,
            clock,
            handlers,
            settings,
            runtime: runtime.clone(),
            gates: Default::default(),
            versions: Mutex::new(VersionTable::default()),
            timers: Mutex::new(PresenceTimers::default()),
            listener: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        });

        let listener = runtime.spawn(listen(Arc::downgrade(&shared), receiver, origin));
        *lock(&shared.listener) = Some(listener);

        info!("Sync coordinator joined channel {} as {}", shared.channel.name(), origin);
        Ok(Self { shared })
    }

    /// Publish a full replacement of `T`'s collection. Returns the stamp it carries.
    ///
    /// The stamp is recorded locally before publishing, so an echo or any peer
    /// update that is not strictly newer will be ignored.
    pub fn broadcast<T: StreamItem>(&self, data: Vec<T>) -> i64 {
        self.broadcast_with(|| data)
    }

    /// Run `update` and publish the collection it returns as one step.
    ///
    /// `update` is where the host writes its local copy. No peer update of the
    /// same stream is applied between that write and the stamp, so a peer
    /// value cannot land and then be overwritten by an older local one.
    /// `update` must not call back into this coordinator for the same stream.
    pub fn broadcast_with<T: StreamItem>(&self, update: impl FnOnce() -> Vec<T>) -> i64 {
        let _gate = lock(&self.shared.gates[T::KIND.index()]);
        let data = update();
        let timestamp = self.shared.clock.now_millis();
        if self.is_torn_down() {
            debug!("Ignoring {} broadcast after teardown", T::KIND);
            return timestamp;
        }

        lock(&self.shared.versions).record_local(T::KIND, timestamp);
        let message = T::into_message(VersionedPayload { data, timestamp });
        self.shared.publish(&message);
        timestamp
    }

    /// Publish a typing signal. Returns false when it was suppressed.
    pub fn broadcast_presence(&self, signal: PresenceSignal) -> bool {
        if self.is_torn_down() {
            return false;
        }

        if signal.is_typing {
            let now = self.shared.clock.now_millis();
            if !lock(&self.shared.throttle).allow(now) {
                debug!("Throttled typing signal for {}", signal.user_id);
                return false;
            }
        }

        self.shared.publish(&SyncMessage::Typing(signal));
        true
    }

    /// Apply a message received from a peer
    pub fn apply_incoming(&self, message: SyncMessage) {
        self.shared.apply(message);
    }

    pub fn version(&self, kind: StreamKind) -> StreamVersion {
        lock(&self.shared.versions).get(kind)
    }

    /// Number of users with a live typing indicator timer
    pub fn pending_presence(&self) -> usize {
        lock(&self.shared.timers).len()
    }

    pub fn origin(&self) -> Uuid {
        self.shared.channel.origin()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.torn_down.load(Ordering::Acquire)
    }

    /// Leave the channel and cancel every pending presence timer
    pub fn teardown(&self) {
        self.shared.teardown();
    }
}

async fn listen(shared: Weak<Shared>, mut receiver: broadcast::Receiver<Envelope>, origin: Uuid) {
    loop {
        match receiver.recv().await {
            Ok(envelope) => {
                if envelope.origin == origin {
                    continue;
                }
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.apply(envelope.message);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Sync listener lagged, {} messages missed", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Sync channel closed");
                break;
            }
        }
    }
}

impl Shared {
    fn publish(&self, message: &SyncMessage) {
        if let Err(e) = self.channel.post(message) {
            warn!("Failed to broadcast {} on {}: {}", message.label(), self.channel.name(), e);
        }
    }

    fn apply(self: &Arc<Self>, message: SyncMessage) {
        if self.torn_down.load(Ordering::Acquire) {
            debug!("Ignoring {} message after teardown", message.label());
            return;
        }

        match message {
            SyncMessage::Messages(payload) => self.replace(StreamKind::Messages, payload, &self.handlers.messages),
            SyncMessage::Projects(payload) => self.replace(StreamKind::Projects, payload, &self.handlers.projects),
            SyncMessage::Documents(payload) => self.replace(StreamKind::Documents, payload, &self.handlers.documents),
            SyncMessage::Personas(payload) => self.replace(StreamKind::Personas, payload, &self.handlers.personas),
            SyncMessage::Agreements(payload) => self.replace(StreamKind::Agreements, payload, &self.handlers.agreements),
            SyncMessage::Typing(signal) => self.presence(signal),
        }
    }

    // Replace callbacks run under the stream's gate and must not broadcast
    // that same stream.
    fn replace<T>(&self, kind: StreamKind, payload: VersionedPayload<Vec<T>>, handler: &Option<ReplaceFn<T>>) {
        let _gate = lock(&self.gates[kind.index()]);
        if !lock(&self.versions).observe(kind, payload.timestamp) {
            return;
        }
        debug!("Applying {} update stamped {} ({} items)", kind, payload.timestamp, payload.data.len());
        if let Some(replace) = handler {
            replace(payload.data);
        }
    }

    fn presence(self: &Arc<Self>, signal: PresenceSignal) {
        let PresenceSignal { user_id, name, is_typing } = signal;

        lock(&self.timers).cancel(&user_id);

        if let Some(update) = &self.handlers.presence {
            update(&user_id, &name, is_typing);
        }

        if !is_typing {
            return;
        }

        let deadline = tokio::time::Instant::now() + self.settings.presence_timeout;
        let weak = Arc::downgrade(self);
        let runtime = self.runtime.clone();
        lock(&self.timers).arm(&user_id, |generation| {
            let user_id = user_id.clone();
            runtime.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(shared) = weak.upgrade() {
                    shared.expire(&user_id, &name, generation);
                }
            })
        });
    }

    fn expire(&self, user_id: &str, name: &str, generation: u64) {
        if self.torn_down.load(Ordering::Acquire) {
            return;
        }
        if !lock(&self.timers).fire(user_id, generation) {
            return;
        }
        debug!("Typing indicator for {} expired", user_id);
        if let Some(update) = &self.handlers.presence {
            update(user_id, name, false);
        }
    }

    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
        lock(&self.timers).clear();
        self.channel.close();
        info!("Sync coordinator left channel {}", self.channel.name());
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.teardown();
    }
}
