use std::time::{Duration, Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.duration
    }
}

/// Transient operator-facing messages. Each entry disappears after its
/// duration or when dismissed, whichever comes first.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.push_at(Instant::now(), kind, message)
    }

    pub fn push_at(
        &mut self,
        now: Instant,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Notification {
            id,
            message: message.into(),
            kind,
            created_at: now,
            duration: DEFAULT_DURATION,
        });
        id
    }

    /// Returns `false` when the id was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop everything past its duration. Returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    /// Live notifications at `now`, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(move |n| !n.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Earliest instant at which some notification expires.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.items.iter().map(|n| n.created_at + n.duration).min()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_expires_after_default_duration() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::new();
        q.push_at(t0, NotificationKind::Info, "Filters cleared");

        q.expire(t0 + Duration::from_millis(2999));
        assert_eq!(q.active(t0 + Duration::from_millis(2999)).count(), 1);

        q.expire(t0 + Duration::from_millis(3001));
        assert!(q.is_empty());
    }

    #[test]
    fn dismiss_removes_before_expiry() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::new();
        let a = q.push_at(t0, NotificationKind::Success, "Loaded 3 violation records");
        let b = q.push_at(t0, NotificationKind::Error, "Failed to load verified data");

        assert!(q.dismiss(a));
        assert!(!q.dismiss(a));
        let left: Vec<u64> = q.active(t0).map(|n| n.id).collect();
        assert_eq!(left, vec![b]);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut q = NotificationQueue::new();
        let a = q.push(NotificationKind::Info, "a");
        let b = q.push(NotificationKind::Info, "b");
        assert!(b > a);
    }

    #[test]
    fn next_expiry_tracks_oldest() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::new();
        assert!(q.next_expiry().is_none());
        q.push_at(t0 + Duration::from_millis(500), NotificationKind::Info, "late");
        q.push_at(t0, NotificationKind::Info, "early");
        assert_eq!(q.next_expiry(), Some(t0 + DEFAULT_DURATION));
    }
}
