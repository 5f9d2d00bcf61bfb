use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::security::UserStore;

use super::registry::SessionRegistry;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login, logout and password rotation against stored credentials. The
/// registry contract: a successful login is the only path that marks a user
/// active, and password rotation never touches session state.
pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> AppResult<()>;
    fn logout(&self, username: &str);
    fn change_password(&self, username: &str, old_password: &str, new_password: &str) -> AppResult<()>;
}

pub struct LocalAuthProvider {
    users: Arc<UserStore>,
    registry: Arc<SessionRegistry>,
}

impl LocalAuthProvider {
    pub fn new(users: Arc<UserStore>, registry: Arc<SessionRegistry>) -> Self {
        Self { users, registry }
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<()> {
        if !self.users.authenticate(&req.username, &req.password) {
            // a failed login must never mark the user active
            return Err(AppError::invalid_credentials(
                "invalid_credentials",
                "username or password incorrect",
            ));
        }
        self.registry.set_active(&req.username, true);
        info!("auth.login user={}", req.username);
        Ok(())
    }

    fn logout(&self, username: &str) {
        self.registry.remove_user(username);
        info!("auth.logout user={}", username);
    }

    fn change_password(&self, username: &str, old_password: &str, new_password: &str) -> AppResult<()> {
        if !self.users.authenticate(username, old_password) {
            return Err(AppError::invalid_credentials(
                "invalid_credentials",
                "username or password incorrect",
            ));
        }
        self.users.set_password(username, new_password).map_err(AppError::from)?;
        info!("auth.password_change user={}", username);
        Ok(())
    }
}
