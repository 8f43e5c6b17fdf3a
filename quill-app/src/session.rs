use crate::error::AppError;
use quill_client::models::User;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The locally persisted record identifying the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Typed load/save/clear of the session. The store is the sole source of
/// truth for "is a user logged in"; absence routes the host to login.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, AppError>;
    fn save(&self, session: &Session) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

const TOKEN_FILE: &str = "token";
const USER_FILE: &str = "user.json";

/// File-backed session store. The token and the serialized user record are
/// two separate values (like the two browser-storage keys they replace) and
/// are always cleared together.
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default directory: `QUILL_SESSION_DIR`, else `~/.quill`.
    pub fn default_dir() -> Result<PathBuf, AppError> {
        if let Ok(dir) = std::env::var("QUILL_SESSION_DIR") {
            return Ok(PathBuf::from(dir));
        }
        dirs::home_dir()
            .map(|home| home.join(".quill"))
            .ok_or(AppError::NoSessionDir)
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join(USER_FILE)
    }
}

impl SessionStore for FsSessionStore {
    fn load(&self) -> Result<Option<Session>, AppError> {
        let token = match read_if_present(&self.token_path())? {
            Some(token) => token.trim().to_string(),
            None => return Ok(None),
        };
        if token.is_empty() {
            return Ok(None);
        }

        let user_json = match read_if_present(&self.user_path())? {
            Some(json) => json,
            None => return Ok(None),
        };

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Ok(Some(Session { token, user })),
            Err(e) => {
                // Corrupt record is treated as logged out, not as a crash.
                tracing::warn!("Discarding unreadable session record: {}", e);
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;

        fs::write(self.token_path(), &session.token)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(self.token_path())?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(self.token_path(), perms)?;
        }

        let user_json = serde_json::to_string_pretty(&session.user)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(self.user_path(), user_json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        remove_if_present(&self.token_path())?;
        remove_if_present(&self.user_path())?;
        Ok(())
    }
}

fn read_if_present(path: &Path) -> Result<Option<String>, AppError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_present(path: &Path) -> Result<(), AppError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        Session {
            token: "tok-123".to_string(),
            user: User {
                id: 1,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        store.save(&sample_session()).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded, Some(sample_session()));
    }

    #[test]
    fn clear_removes_both_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        store.save(&sample_session()).expect("save");
        store.clear().expect("clear");

        assert!(!dir.path().join("token").exists());
        assert!(!dir.path().join("user.json").exists());
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn token_without_user_record_is_logged_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        std::fs::write(dir.path().join("token"), "tok-123").expect("write");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn corrupt_user_record_is_discarded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        std::fs::write(dir.path().join("token"), "tok-123").expect("write");
        std::fs::write(dir.path().join("user.json"), "{not json").expect("write");

        assert_eq!(store.load().expect("load"), None);
        // Both halves are gone afterwards.
        assert!(!dir.path().join("token").exists());
    }

    #[test]
    fn clearing_an_empty_store_is_fine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());
        store.clear().expect("clear");
    }
}
