//! Bearer-token table shared by the process-local backends.
//!
//! Sessions expire a fixed time after sign-in and the table holds at most
//! [`MAX_SESSIONS`] of them. Expired entries are pruned whenever a new
//! session is issued; when the table is still full the oldest session is
//! dropped.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Live sessions per backend.
pub const MAX_SESSIONS: usize = 10_000;

/// How long a session stays valid after sign-in.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug)]
pub(crate) struct SessionTable<V> {
    /// Token -> (value, issued at).
    entries: BTreeMap<String, (V, Instant)>,
    /// `None` never expires.
    ttl: Option<Duration>,
    capacity: usize,
}

impl<V> Default for SessionTable<V> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<V> SessionTable<V> {
    pub(crate) fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
            capacity: MAX_SESSIONS,
        }
    }

    #[must_use]
    pub(crate) fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub(crate) fn insert(&mut self, token: String, value: V, now: Instant) {
        self.prune(now);
        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, issued))| *issued)
                .map(|(token, _)| token.clone());
            let Some(oldest) = oldest else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!("session table full, dropped the oldest session");
        }
        self.entries.insert(token, (value, now));
    }

    pub(crate) fn get(&self, token: &str, now: Instant) -> Option<&V> {
        self.entries
            .get(token)
            .filter(|(_, issued)| alive(self.ttl, *issued, now))
            .map(|(value, _)| value)
    }

    /// An expired session counts as absent.
    pub(crate) fn remove(&mut self, token: &str, now: Instant) -> Option<V> {
        let (value, issued) = self.entries.remove(token)?;
        alive(self.ttl, issued, now).then_some(value)
    }

    pub(crate) fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries.retain(|_, (_, issued)| alive(ttl, *issued, now));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn alive(ttl: Option<Duration>, issued: Instant, now: Instant) -> bool {
    ttl.is_none_or(|ttl| now.saturating_duration_since(issued) < ttl)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn sessions_expire_after_ttl() {
        let start = Instant::now();
        let mut table = SessionTable::new(Some(HOUR));
        table.insert("t1".to_string(), "u1", start);

        assert_eq!(table.get("t1", start + HOUR / 2), Some(&"u1"));
        assert_eq!(table.get("t1", start + HOUR), None);
        assert_eq!(table.remove("t1", start + HOUR), None);
    }

    #[test]
    fn without_ttl_sessions_never_expire() {
        let start = Instant::now();
        let mut table = SessionTable::default();
        table.insert("t1".to_string(), (), start);

        assert!(table.get("t1", start + HOUR * 1000).is_some());
    }

    #[test]
    fn issuing_prunes_expired_sessions() {
        let start = Instant::now();
        let mut table = SessionTable::new(Some(HOUR));
        table.insert("t1".to_string(), (), start);
        table.insert("t2".to_string(), (), start + HOUR / 2);
        table.insert("t3".to_string(), (), start + HOUR);

        assert_eq!(table.len(), 2);
        assert!(table.get("t1", start + HOUR).is_none());
    }

    #[test]
    fn full_table_drops_the_oldest() {
        let start = Instant::now();
        let mut table = SessionTable::new(None).with_capacity(2);
        table.insert("t1".to_string(), 1, start);
        table.insert("t2".to_string(), 2, start + HOUR);
        table.insert("t3".to_string(), 3, start + HOUR * 2);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("t1", start), None);
        assert_eq!(table.get("t2", start + HOUR * 2), Some(&2));
        assert_eq!(table.get("t3", start + HOUR * 2), Some(&3));
    }

    #[test]
    fn logout_removes_the_session() {
        let start = Instant::now();
        let mut table = SessionTable::new(Some(HOUR));
        table.insert("t1".to_string(), "u1", start);

        assert_eq!(table.remove("t1", start), Some("u1"));
        assert_eq!(table.get("t1", start), None);
    }
}
