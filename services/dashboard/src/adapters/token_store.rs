//! services/dashboard/src/adapters/token_store.rs
//!
//! A `CredentialStore` that keeps "remember me" tokens in a file and every other
//! token in process memory only.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use jaison_core::credentials::{MemoryCredentialStore, Persistence};
use jaison_core::ports::{CredentialStore, PortError, PortResult};
use tracing::{debug, warn};

pub struct FileCredentialStore {
    path: PathBuf,
    ephemeral: MemoryCredentialStore,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ephemeral: MemoryCredentialStore::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_durable(&self) -> PortResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &self.path, e)),
        }
    }

    fn write_durable(&self, token: &str) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| io_error("open", &self.path, e))?;
        // The mode above only applies to new files.
        restrict_permissions(&self.path);
        file.write_all(token.as_bytes())
            .map_err(|e| io_error("write", &self.path, e))?;
        debug!("Session token persisted to {}", self.path.display());
        Ok(())
    }

    fn remove_durable(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &self.path, e)),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    /// The durable token wins over the in-memory one.
    fn load(&self) -> PortResult<Option<String>> {
        match self.read_durable()? {
            Some(token) => Ok(Some(token)),
            None => self.ephemeral.load(),
        }
    }

    /// Saving under one policy clears the other location.
    fn save(&self, token: &str, policy: Persistence) -> PortResult<()> {
        match policy {
            Persistence::Durable => {
                self.write_durable(token)?;
                self.ephemeral.clear()
            }
            Persistence::Ephemeral => {
                self.remove_durable()?;
                self.ephemeral.save(token, policy)
            }
        }
    }

    fn clear(&self) -> PortResult<()> {
        self.ephemeral.clear()?;
        self.remove_durable()
    }
}

fn io_error(action: &str, path: &Path, e: io::Error) -> PortError {
    PortError::Unexpected(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!("Could not restrict permissions on {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileCredentialStore {
        let dir = std::env::temp_dir().join(format!("jaison-test-{}", uuid::Uuid::new_v4()));
        FileCredentialStore::new(dir.join("credentials"))
    }

    #[test]
    fn durable_tokens_survive_a_new_store() {
        let store = temp_store();
        store.save("tok-durable", Persistence::Durable).unwrap();

        let reopened = FileCredentialStore::new(store.path());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("tok-durable"));

        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn ephemeral_tokens_never_touch_the_disk() {
        let store = temp_store();
        store.save("tok-session", Persistence::Ephemeral).unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("tok-session"));
        assert!(!store.path().exists());
        assert!(FileCredentialStore::new(store.path()).load().unwrap().is_none());
    }

    #[test]
    fn switching_policy_clears_the_other_location() {
        let store = temp_store();
        store.save("tok-1", Persistence::Durable).unwrap();
        store.save("tok-2", Persistence::Ephemeral).unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-2"));

        store.save("tok-3", Persistence::Durable).unwrap();
        assert_eq!(store.ephemeral.load().unwrap(), None);
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-3"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let store = temp_store();
        store.save("tok", Persistence::Durable).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn an_existing_token_file_is_made_private_before_writing() {
        use std::os::unix::fs::PermissionsExt;

        let store = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "old-token").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save("new-token", Persistence::Durable).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "new-token");
        store.clear().unwrap();
    }
}
