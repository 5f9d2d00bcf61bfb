use dashmap::DashMap;

/// Concurrent map of username -> active flag; the single source of truth for
/// "is this user currently logged in".
///
/// A username that was never registered reads as inactive, so lookups are
/// total and never fail. Entries carry no TTL: a logged-in user stays active
/// until an explicit logout or account removal. Constructed once by the
/// server wiring and shared via `Arc`.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: DashMap<String, bool>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Insert or overwrite the entry for `username`. Idempotent.
    /// Empty usernames are ignored; the gate never admits them anyway.
    pub fn set_active(&self, username: &str, active: bool) {
        if username.is_empty() {
            return;
        }
        self.entries.insert(username.to_string(), active);
    }

    /// Stored flag, or `false` when the username was never registered.
    pub fn is_active(&self, username: &str) -> bool {
        self.entries.get(username).map(|e| *e).unwrap_or(false)
    }

    /// Delete the entry entirely; removing an absent user is a no-op.
    pub fn remove_user(&self, username: &str) {
        self.entries.remove(username);
    }
}
