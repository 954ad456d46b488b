//! Known users and the persisted login.
//!
//! There is no password check: a login succeeds for any username in the
//! [`UserDirectory`]. The identity survives restarts in a small JSON
//! key-value file; nothing else (in particular, not the cart) is stored.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use md_estimator_core::{Role, User};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Key under which the current identity is stored.
pub const SESSION_KEY: &str = "md_user";

/// Errors from logging in or persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No known user has this username.
    #[error("Invalid credentials: unknown user '{0}'")]
    UnknownUser(String),

    /// The session file could not be read or written.
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The identity could not be encoded.
    #[error("Session encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The fixed list of users allowed to sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new(vec![
            User {
                id: "1".to_string(),
                username: "admin".to_string(),
                name: "Admin User".to_string(),
                role: Role::Admin,
            },
            User {
                id: "2".to_string(),
                username: "emp".to_string(),
                name: "John Employee".to_string(),
                role: Role::Employee,
            },
        ])
    }
}

impl UserDirectory {
    /// Create a directory from an explicit user list.
    #[must_use]
    pub const fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Find a user by exact username.
    #[must_use]
    pub fn find(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    /// All known users.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }
}

/// JSON key-value file holding the current identity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored identity.
    ///
    /// A missing file, missing key or unreadable contents all mean nobody is
    /// signed in; unreadable contents are logged.
    #[must_use]
    pub fn load(&self) -> Option<User> {
        let mut entries = self.read_entries();
        let value = entries.remove(SESSION_KEY)?;
        match serde_json::from_value(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt stored identity");
                None
            }
        }
    }

    /// Store `user` as the current identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the file cannot be written.
    pub fn save(&self, user: &User) -> Result<(), SessionError> {
        let mut entries = self.read_entries();
        entries.insert(SESSION_KEY.to_string(), serde_json::to_value(user)?);
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), username = %user.username, "Session saved");
        Ok(())
    }

    /// Forget the current identity. Other keys in the file are kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the file exists but cannot be rewritten.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut entries = self.read_entries();
        if entries.remove(SESSION_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "Session cleared");
        Ok(())
    }

    fn read_entries(&self) -> BTreeMap<String, Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
            BTreeMap::new()
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}
