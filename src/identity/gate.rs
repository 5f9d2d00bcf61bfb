//! Request admission: whitelist rules plus a session-registry lookup keyed by
//! the caller-asserted username. Runs before any handler; mutates nothing.

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::error::AppError;

use super::registry::SessionRegistry;

/// The parts of an inbound request the gate decides on. The username is the
/// value of the `x-username` header, treated as an opaque string; it is
/// verified against stored credentials at login time, not per request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub username: Option<&'a str>,
}

/// Static set of operations exempt from the session check: exact
/// (path, method) pairs and method-independent path prefixes.
/// Read-only after startup; either rule kind admits on its own.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    exact: Vec<(String, String)>,
    prefixes: Vec<String>,
}

impl Whitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, path: &str, method: &str) -> Self {
        self.exact.push((path.to_string(), method.to_string()));
        self
    }

    pub fn allow_prefix(mut self, prefix: &str) -> Self {
        self.prefixes.push(prefix.to_string());
        self
    }

    /// Exact rules match path equality plus case-insensitive method equality;
    /// prefix rules match any path underneath them regardless of method.
    pub fn permits(&self, path: &str, method: &str) -> bool {
        let exact = self
            .exact
            .iter()
            .any(|(p, m)| p == path && m.eq_ignore_ascii_case(method));
        let prefix = self.prefixes.iter().any(|pre| path.starts_with(pre.as_str()));
        exact || prefix
    }
}

/// Public operations: account creation and the self-authenticating login and
/// password-rotation endpoints, plus health and docs trees.
pub static DEFAULT_WHITELIST: Lazy<Whitelist> = Lazy::new(|| {
    Whitelist::new()
        .allow("/api/trainees", "POST")
        .allow("/api/trainers", "POST")
        .allow("/api/auth/login", "POST")
        .allow("/api/auth/password", "PUT")
        .allow_prefix("/health")
        .allow_prefix("/docs")
});

/// Admits or rejects every inbound request before it reaches domain logic.
pub struct AuthenticationGate {
    whitelist: Whitelist,
    registry: Arc<SessionRegistry>,
}

impl AuthenticationGate {
    pub fn new(whitelist: Whitelist, registry: Arc<SessionRegistry>) -> Self {
        Self { whitelist, registry }
    }

    pub fn with_default_whitelist(registry: Arc<SessionRegistry>) -> Self {
        Self::new(DEFAULT_WHITELIST.clone(), registry)
    }

    /// Whitelisted requests pass unconditionally; everything else requires a
    /// non-empty asserted username with an active registry entry.
    pub fn admit(&self, req: &RequestDescriptor<'_>) -> Result<(), AppError> {
        if self.whitelist.permits(req.path, req.method) {
            return Ok(());
        }
        match req.username {
            Some(u) if !u.is_empty() && self.registry.is_active(u) => Ok(()),
            // one message for both causes so callers cannot probe which usernames exist
            _ => Err(AppError::unauthorized("unauthorized", "authentication required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> (Arc<SessionRegistry>, AuthenticationGate) {
        let registry = Arc::new(SessionRegistry::new());
        let gate = AuthenticationGate::with_default_whitelist(registry.clone());
        (registry, gate)
    }

    fn req<'a>(path: &'a str, method: &'a str, username: Option<&'a str>) -> RequestDescriptor<'a> {
        RequestDescriptor { path, method, username }
    }

    #[test]
    fn whitelisted_exact_path_admits_without_session() {
        let (_registry, gate) = gate();
        assert!(gate.admit(&req("/api/auth/login", "POST", None)).is_ok());
        assert!(gate.admit(&req("/api/trainees", "POST", None)).is_ok());
    }

    #[test]
    fn whitelist_method_match_is_case_insensitive() {
        let (_registry, gate) = gate();
        assert!(gate.admit(&req("/api/auth/login", "post", None)).is_ok());
        assert!(gate.admit(&req("/api/trainers", "Post", None)).is_ok());
    }

    #[test]
    fn exact_rule_with_other_method_does_not_admit() {
        let (_registry, gate) = gate();
        let err = gate.admit(&req("/api/trainees", "GET", None)).unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn prefix_rules_admit_any_method_and_subpath() {
        let (_registry, gate) = gate();
        assert!(gate.admit(&req("/health", "GET", None)).is_ok());
        assert!(gate.admit(&req("/health/live", "HEAD", None)).is_ok());
        assert!(gate.admit(&req("/docs/openapi.json", "GET", None)).is_ok());
    }

    #[test]
    fn exact_and_prefix_rules_are_evaluated_independently() {
        let registry = Arc::new(SessionRegistry::new());
        let whitelist = Whitelist::new()
            .allow("/public/ping", "GET")
            .allow_prefix("/public");
        let gate = AuthenticationGate::new(whitelist, registry);
        // method mismatch on the exact rule still falls through to the prefix rule
        assert!(gate.admit(&req("/public/ping", "DELETE", None)).is_ok());
        assert!(gate.admit(&req("/public/other", "POST", None)).is_ok());
    }

    #[test]
    fn inactive_user_is_rejected_then_admitted_after_activation() {
        let (registry, gate) = gate();
        let r = req("/api/trainings", "GET", Some("bob"));
        assert!(gate.admit(&r).is_err());
        registry.set_active("bob", true);
        assert!(gate.admit(&r).is_ok());
        registry.set_active("bob", false);
        assert!(gate.admit(&r).is_err());
    }

    #[test]
    fn absent_or_empty_username_is_always_rejected() {
        let (registry, gate) = gate();
        registry.set_active("bob", true);
        assert!(gate.admit(&req("/api/trainings", "GET", None)).is_err());
        assert!(gate.admit(&req("/api/trainings", "GET", Some(""))).is_err());
    }

    #[test]
    fn rejection_message_does_not_distinguish_causes() {
        let (registry, gate) = gate();
        registry.set_active("eve", false);
        let missing = gate.admit(&req("/api/trainings", "GET", None)).unwrap_err();
        let inactive = gate.admit(&req("/api/trainings", "GET", Some("eve"))).unwrap_err();
        assert_eq!(missing.message(), inactive.message());
    }
}
