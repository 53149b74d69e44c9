pub mod channel;
pub mod clock;
pub mod codec;
pub mod coordinator;
pub mod error;
pub mod presence;
pub mod relay_client;
pub mod version;
pub mod workspace;

pub use channel::{Envelope, LocalBus, LocalChannel, SyncChannel};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::WireFormat;
pub use coordinator::{SyncCoordinator, SyncHandlers, SyncSettings};
pub use error::{ChannelError, SyncError};
pub use relay_client::RelayChannel;
pub use version::StreamVersion;
pub use workspace::{PresenceEntry, Workspace, WorkspaceState};

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the data if a callback panicked while holding it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
