use tracing::debug;

use crate::models::StreamKind;

/// Per-stream version state of one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamVersion {
    #[default]
    NoVersion,
    HasVersion(i64),
}

impl StreamVersion {
    /// Whether an update stamped `timestamp` supersedes this version. Ties lose.
    pub fn is_superseded_by(self, timestamp: i64) -> bool {
        match self {
            StreamVersion::NoVersion => true,
            StreamVersion::HasVersion(current) => timestamp > current,
        }
    }

    pub fn timestamp(self) -> Option<i64> {
        match self {
            StreamVersion::NoVersion => None,
            StreamVersion::HasVersion(ts) => Some(ts),
        }
    }
}

/// Last applied timestamp for each of the five streams
#[derive(Debug, Default, Clone)]
pub struct VersionTable {
    versions: [StreamVersion; StreamKind::ALL.len()],
}

impl VersionTable {
    pub fn get(&self, kind: StreamKind) -> StreamVersion {
        self.versions[kind.index()]
    }

    /// Record a remote update if it is strictly newer. Returns whether it should be applied.
    pub fn observe(&mut self, kind: StreamKind, timestamp: i64) -> bool {
        let slot = &mut self.versions[kind.index()];
        if !slot.is_superseded_by(timestamp) {
            debug!("Dropping stale {} update ({} <= {:?})", kind, timestamp, slot.timestamp());
            return false;
        }
        *slot = StreamVersion::HasVersion(timestamp);
        true
    }

    /// Record a locally published update. The retained version never regresses,
    /// so a skewed local clock cannot reopen the door to an older remote value.
    pub fn record_local(&mut self, kind: StreamKind, timestamp: i64) {
        let slot = &mut self.versions[kind.index()];
        if slot.is_superseded_by(timestamp) {
            *slot = StreamVersion::HasVersion(timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_always_applies() {
        let mut table = VersionTable::default();
        assert_eq!(table.get(StreamKind::Projects), StreamVersion::NoVersion);
        assert!(table.observe(StreamKind::Projects, 0));
        assert_eq!(table.get(StreamKind::Projects), StreamVersion::HasVersion(0));
    }

    #[test]
    fn only_strictly_newer_updates_apply() {
        let mut table = VersionTable::default();
        assert!(table.observe(StreamKind::Messages, 100));
        assert!(!table.observe(StreamKind::Messages, 100));
        assert!(!table.observe(StreamKind::Messages, 99));
        assert!(table.observe(StreamKind::Messages, 101));
        assert_eq!(table.get(StreamKind::Messages).timestamp(), Some(101));
    }

    #[test]
    fn streams_are_independent() {
        let mut table = VersionTable::default();
        table.observe(StreamKind::Documents, 500);
        assert!(table.observe(StreamKind::Personas, 1));
        assert_eq!(table.get(StreamKind::Agreements), StreamVersion::NoVersion);
    }

    #[test]
    fn local_record_never_regresses() {
        let mut table = VersionTable::default();
        table.observe(StreamKind::Agreements, 200);
        table.record_local(StreamKind::Agreements, 150);
        assert_eq!(table.get(StreamKind::Agreements), StreamVersion::HasVersion(200));
        table.record_local(StreamKind::Agreements, 250);
        assert_eq!(table.get(StreamKind::Agreements), StreamVersion::HasVersion(250));
    }
}
