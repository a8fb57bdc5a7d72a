/// Durable session cache
///
/// Two entries under one directory: the serialized session user and the
/// bearer token. They are written atomically (temp file + rename) and
/// always cleared together; a cache with a user but no token, or the
/// reverse, is treated as absent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cinevault_shared::auth::session::SessionUser;

/// Fixed cache entry names
const SESSION_FILE: &str = "session.json";
const TOKEN_FILE: &str = "token";

/// File-backed session cache
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Opens (and creates) the cache directory
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Persists the session user and token together
    pub fn save(&self, user: &SessionUser, token: &str) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(user)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        write_atomic(&self.session_path(), &json)?;
        write_atomic(&self.token_path(), token.as_bytes())?;
        Ok(())
    }

    /// Loads the cached session, if both entries are present and readable
    ///
    /// A half-written or corrupted cache reads as absent; the context will
    /// fall back to a fresh login.
    pub fn load(&self) -> Option<(SessionUser, String)> {
        let user = fs::read(self.session_path()).ok()?;
        let user: SessionUser = serde_json::from_slice(&user).ok()?;
        let token = fs::read_to_string(self.token_path()).ok()?;
        Some((user, token))
    }

    /// Removes both entries; missing files are fine
    pub fn clear(&self) {
        let _ = fs::remove_file(self.session_path());
        let _ = fs::remove_file(self.token_path());
    }
}

/// Writes via a temp file and rename so a crash never leaves half a file
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinevault_shared::models::profile::{Role, SubscriptionStatus};
    use uuid::Uuid;

    fn temp_store() -> SessionStore {
        let dir = std::env::temp_dir().join(format!("cinevault-test-{}", Uuid::new_v4()));
        SessionStore::open(dir).unwrap()
    }

    fn user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "viewer@example.com".to_string(),
            username: "viewer".to_string(),
            display_name: "Viewer".to_string(),
            bio: None,
            role: Role::User,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_start: None,
            subscription_end: None,
            subscription_plan: None,
            creator_status: None,
            is_subscriber: false,
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = temp_store();
        let user = user();

        store.save(&user, "token-abc").unwrap();

        let (loaded, token) = store.load().unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.email, user.email);
        assert_eq!(token, "token-abc");
    }

    #[test]
    fn test_clear_removes_both_entries() {
        let store = temp_store();
        store.save(&user(), "token-abc").unwrap();

        store.clear();
        assert!(store.load().is_none());

        // Clearing an empty cache is fine
        store.clear();
    }

    #[test]
    fn test_missing_token_reads_as_absent() {
        let store = temp_store();
        store.save(&user(), "token-abc").unwrap();

        std::fs::remove_file(store.token_path()).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupted_session_reads_as_absent() {
        let store = temp_store();
        store.save(&user(), "token-abc").unwrap();

        std::fs::write(store.session_path(), b"{ not json").unwrap();
        assert!(store.load().is_none());
    }
}
