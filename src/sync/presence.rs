use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Pending "stopped typing" timers, one per user.
///
/// Each armed timer carries a generation so a timer that already woke up
/// while its user refreshed can tell it has been superseded.
#[derive(Debug, Default)]
pub struct PresenceTimers {
    pending: HashMap<String, PendingExpiry>,
    next_generation: u64,
}

#[derive(Debug)]
struct PendingExpiry {
    generation: u64,
    task: JoinHandle<()>,
}

impl PresenceTimers {
    /// Cancel the pending timer for `user_id`, if any
    pub fn cancel(&mut self, user_id: &str) -> bool {
        match self.pending.remove(user_id) {
            Some(expiry) => {
                expiry.task.abort();
                true
            }
            None => false,
        }
    }

    /// Arm a timer for `user_id`, replacing any pending one. `spawn` receives the
    /// generation the timer must present to `fire`.
    pub fn arm(&mut self, user_id: &str, spawn: impl FnOnce(u64) -> JoinHandle<()>) {
        self.cancel(user_id);
        self.next_generation += 1;
        let generation = self.next_generation;
        let task = spawn(generation);
        self.pending.insert(user_id.to_string(), PendingExpiry { generation, task });
    }

    /// Claim the expiry of `user_id`'s timer. False if it was cancelled or re-armed meanwhile.
    pub fn fire(&mut self, user_id: &str, generation: u64) -> bool {
        match self.pending.get(user_id) {
            Some(expiry) if expiry.generation == generation => {
                self.pending.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        for (_, expiry) in self.pending.drain() {
            expiry.task.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Suppresses repeated typing=true publishes inside a window. One window per context.
#[derive(Debug, Clone)]
pub struct TypingThrottle {
    window_ms: i64,
    last_sent: Option<i64>,
}

impl TypingThrottle {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms, last_sent: None }
    }

    pub fn allow(&mut self, now: i64) -> bool {
        if let Some(last) = self.last_sent {
            if now - last < self.window_ms {
                return false;
            }
        }
        self.last_sent = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn throttle_opens_again_after_window() {
        let mut throttle = TypingThrottle::new(500);
        assert!(throttle.allow(1_000));
        assert!(!throttle.allow(1_001));
        assert!(!throttle.allow(1_499));
        assert!(throttle.allow(1_500));
        assert!(!throttle.allow(1_600));
    }

    #[tokio::test]
    async fn rearming_supersedes_previous_generation() {
        let mut timers = PresenceTimers::default();
        let mut first = 0;
        timers.arm("user-1", |generation| {
            first = generation;
            tokio::spawn(tokio::time::sleep(Duration::from_secs(60)))
        });
        let mut second = 0;
        timers.arm("user-1", |generation| {
            second = generation;
            tokio::spawn(tokio::time::sleep(Duration::from_secs(60)))
        });

        assert_eq!(timers.len(), 1);
        assert!(!timers.fire("user-1", first));
        assert!(timers.fire("user-1", second));
        assert!(timers.is_empty());
    }

    #[tokio::test]
    async fn clear_aborts_pending_tasks() {
        let mut timers = PresenceTimers::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        timers.arm("user-2", |_| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let _ = tx.send(());
            })
        });
        timers.clear();
        assert!(timers.is_empty());
        // The aborted task drops its sender without sending
        assert!(rx.await.is_err());
    }
}
