//! Credential storage and password hashing. Accounts live in a concurrent
//! in-memory map; passwords are stored as salted Argon2 PHC strings and only
//! ever compared through verification.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use dashmap::DashMap;
use password_hash::{PasswordHash, SaltString};

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    password_hash: String,
}

/// Concurrent map of username -> account. The active flag lives in the
/// session registry, not here; this store only answers credential questions.
#[derive(Debug, Default)]
pub struct UserStore {
    users: DashMap<String, UserAccount>,
}

impl UserStore {
    pub fn new() -> Self {
        Self { users: DashMap::new() }
    }

    /// Insert or overwrite the account for `username`, hashing `password`.
    pub fn add_user(&self, username: &str, password: &str) -> Result<()> {
        let password_hash = hash_password(password)?;
        self.users.insert(
            username.to_string(),
            UserAccount { username: username.to_string(), password_hash },
        );
        Ok(())
    }

    /// Exact-username lookup plus Argon2 verification; unknown users and
    /// wrong passwords are both plain `false`.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(acc) => verify_password(&acc.password_hash, password),
            None => false,
        }
    }

    pub fn set_password(&self, username: &str, new_password: &str) -> Result<()> {
        let password_hash = hash_password(new_password)?;
        match self.users.get_mut(username) {
            Some(mut acc) => {
                acc.password_hash = password_hash;
                Ok(())
            }
            None => Err(anyhow!("user not found")),
        }
    }

    pub fn remove_user(&self, username: &str) {
        self.users.remove(username);
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Snapshot of every registered username, handed to the credential issuer
    /// as the collision population at account-creation time.
    pub fn usernames(&self) -> Vec<String> {
        self.users.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let phc = hash_password("s3cr3t!").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, "s3cr3t!"));
        assert!(!verify_password(&phc, "wrong"));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn authenticate_unknown_user_is_false() {
        let store = UserStore::new();
        assert!(!store.authenticate("nobody", "pw"));
    }

    #[test]
    fn add_then_authenticate() {
        let store = UserStore::new();
        store.add_user("Ali.Yilmaz", "pw123").unwrap();
        assert!(store.authenticate("Ali.Yilmaz", "pw123"));
        assert!(!store.authenticate("Ali.Yilmaz", "pw124"));
        // usernames are case-sensitive at lookup time
        assert!(!store.authenticate("ali.yilmaz", "pw123"));
    }

    #[test]
    fn set_password_rotates_the_stored_hash() {
        let store = UserStore::new();
        store.add_user("bob", "old").unwrap();
        store.set_password("bob", "new").unwrap();
        assert!(!store.authenticate("bob", "old"));
        assert!(store.authenticate("bob", "new"));
    }

    #[test]
    fn set_password_for_missing_user_errors() {
        let store = UserStore::new();
        assert!(store.set_password("ghost", "new").is_err());
    }

    #[test]
    fn remove_user_drops_the_account() {
        let store = UserStore::new();
        store.add_user("bob", "pw").unwrap();
        store.remove_user("bob");
        assert!(!store.contains("bob"));
        assert!(!store.authenticate("bob", "pw"));
        // removing again is a no-op
        store.remove_user("bob");
    }

    #[test]
    fn usernames_snapshots_the_population() {
        let store = UserStore::new();
        store.add_user("a.b", "x").unwrap();
        store.add_user("c.d", "y").unwrap();
        let mut names = store.usernames();
        names.sort();
        assert_eq!(names, vec!["a.b".to_string(), "c.d".to_string()]);
    }
}
