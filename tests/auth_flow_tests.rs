//! End-to-end identity flow tests: account registration through the issuer,
//! login, request admission via the gate, password rotation and logout.
//! These exercise positive and negative paths across the wired components.

use std::sync::Arc;

use traingate::identity::{
    generate_password, generate_username, AuthProvider, AuthenticationGate, LocalAuthProvider,
    LoginRequest, RequestDescriptor, SessionRegistry, Whitelist,
};
use traingate::security::UserStore;

struct Wired {
    users: Arc<UserStore>,
    registry: Arc<SessionRegistry>,
    provider: LocalAuthProvider,
    gate: AuthenticationGate,
}

fn wired() -> Wired {
    let users = Arc::new(UserStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let provider = LocalAuthProvider::new(users.clone(), registry.clone());
    let gate = AuthenticationGate::with_default_whitelist(registry.clone());
    Wired { users, registry, provider, gate }
}

/// Register an account the way the creation handlers do: issued username,
/// issued password, credential record stored.
fn register(w: &Wired, first: &str, last: &str) -> (String, String) {
    let existing = w.users.usernames();
    let username = generate_username(first, last, &existing);
    let password = generate_password().expect("password generation");
    w.users.add_user(&username, &password).expect("store account");
    (username, password)
}

fn api_get<'a>(path: &'a str, username: Option<&'a str>) -> RequestDescriptor<'a> {
    RequestDescriptor { path, method: "GET", username }
}

#[test]
fn registration_login_then_admission() {
    let w = wired();
    let (username, password) = register(&w, "Ali", "Yilmaz");
    assert_eq!(username, "Ali.Yilmaz");

    // freshly registered accounts are not logged in
    let req = api_get("/api/trainings", Some(&username));
    assert!(w.gate.admit(&req).is_err());

    w.provider
        .login(&LoginRequest { username: username.clone(), password })
        .expect("login with issued credentials");
    assert!(w.gate.admit(&req).is_ok());
}

#[test]
fn registration_collisions_issue_distinct_accounts() {
    let w = wired();
    let (first_username, _) = register(&w, "Ali", "Yilmaz");
    let (second_username, second_password) = register(&w, "Ali", "Yilmaz");
    assert_eq!(first_username, "Ali.Yilmaz");
    assert_eq!(second_username, "Ali.Yilmaz1");

    // the second account logs in independently of the first
    w.provider
        .login(&LoginRequest { username: second_username.clone(), password: second_password })
        .expect("second account login");
    assert!(w.registry.is_active(&second_username));
    assert!(!w.registry.is_active(&first_username));
}

#[test]
fn failed_login_is_rejected_and_leaves_no_session() {
    let w = wired();
    let (username, _password) = register(&w, "Sofia", "Marino");

    let err = w
        .provider
        .login(&LoginRequest { username: username.clone(), password: "guess".into() })
        .unwrap_err();
    assert_eq!(err.http_status(), 401);
    assert!(!w.registry.is_active(&username));
    assert!(w.gate.admit(&api_get("/api/trainings", Some(&username))).is_err());
}

#[test]
fn logout_revokes_admission() {
    let w = wired();
    let (username, password) = register(&w, "Jonas", "Berg");
    w.provider
        .login(&LoginRequest { username: username.clone(), password })
        .unwrap();
    assert!(w.gate.admit(&api_get("/api/trainees", Some(&username))).is_ok());

    w.provider.logout(&username);
    assert!(w.gate.admit(&api_get("/api/trainees", Some(&username))).is_err());
}

#[test]
fn password_rotation_flows_through_login() {
    let w = wired();
    let (username, password) = register(&w, "Aisha", "Diallo");

    // rotation is possible while logged out and leaves the session inactive
    w.provider
        .change_password(&username, &password, "N3wPass123")
        .expect("rotate password");
    assert!(!w.registry.is_active(&username));

    // the old password no longer logs in, the new one does
    assert!(w
        .provider
        .login(&LoginRequest { username: username.clone(), password })
        .is_err());
    w.provider
        .login(&LoginRequest { username: username.clone(), password: "N3wPass123".into() })
        .expect("login with rotated password");
    assert!(w.registry.is_active(&username));
}

#[test]
fn whitelisted_operations_need_no_session() {
    let w = wired();
    let login = RequestDescriptor { path: "/api/auth/login", method: "POST", username: None };
    let register_trainee = RequestDescriptor { path: "/api/trainees", method: "post", username: None };
    let rotate = RequestDescriptor { path: "/api/auth/password", method: "PUT", username: None };
    let health = RequestDescriptor { path: "/health/live", method: "GET", username: None };
    assert!(w.gate.admit(&login).is_ok());
    assert!(w.gate.admit(&register_trainee).is_ok());
    assert!(w.gate.admit(&rotate).is_ok());
    assert!(w.gate.admit(&health).is_ok());

    // but the listing variants of the same paths stay protected
    assert!(w.gate.admit(&api_get("/api/trainees", None)).is_err());
    assert!(w.gate.admit(&api_get("/api/trainers", None)).is_err());
}

#[test]
fn custom_whitelist_is_honoured_over_the_default() {
    let registry = Arc::new(SessionRegistry::new());
    let gate = AuthenticationGate::new(
        Whitelist::new().allow("/ping", "GET"),
        registry.clone(),
    );
    assert!(gate.admit(&RequestDescriptor { path: "/ping", method: "GET", username: None }).is_ok());
    // the default whitelist does not apply here
    assert!(gate
        .admit(&RequestDescriptor { path: "/api/auth/login", method: "POST", username: None })
        .is_err());
}

#[test]
fn account_removal_ends_the_session() {
    let w = wired();
    let (username, password) = register(&w, "Omar", "Haddad");
    w.provider
        .login(&LoginRequest { username: username.clone(), password })
        .unwrap();

    // deletion path: credential record and registry entry both go
    w.users.remove_user(&username);
    w.registry.remove_user(&username);
    assert!(w.gate.admit(&api_get("/api/trainings", Some(&username))).is_err());
    assert!(!w.users.authenticate(&username, "anything"));
}
