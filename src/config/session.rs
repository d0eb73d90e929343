use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::tracker::entities::{Role, User};

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Run `workclock login` first")]
    NotLoggedIn,
    #[error("This command requires an administrator account")]
    NotAdmin,
    #[error("Can't access session file {0:?}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Invalid session file {0:?}: {1}")]
    Invalid(PathBuf, serde_json::Error),
}

/// Identity remembered between invocations, together with the server it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub server_url: String,
    pub dni: String,
    #[serde(default)]
    pub role: Role,
}

impl Session {
    pub fn new(server_url: &str, user: User) -> Self {
        Self {
            server_url: server_url.to_string(),
            dni: user.dni,
            role: user.role,
        }
    }

    pub fn path(app_dir: &Path) -> PathBuf {
        app_dir.join(SESSION_FILE)
    }

    pub fn load(app_dir: &Path) -> Result<Option<Self>, SessionError> {
        let path = Self::path(app_dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| SessionError::Invalid(path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::Io(path, e)),
        }
    }

    /// Like [Session::load] but a missing session is an error.
    pub fn require(app_dir: &Path) -> Result<Self, SessionError> {
        Self::load(app_dir)?.ok_or(SessionError::NotLoggedIn)
    }

    pub fn require_admin(&self) -> Result<(), SessionError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(SessionError::NotAdmin)
        }
    }

    pub fn save(&self, app_dir: &Path) -> Result<(), SessionError> {
        let path = Self::path(app_dir);
        let content =
            serde_json::to_string_pretty(self).map_err(|e| SessionError::Invalid(path.clone(), e))?;
        std::fs::write(&path, content).map_err(|e| SessionError::Io(path, e))?;
        info!("Stored session for {}", self.dni);
        Ok(())
    }

    /// Returns whether there was a session to remove.
    pub fn clear(app_dir: &Path) -> Result<bool, SessionError> {
        let path = Self::path(app_dir);
        match std::fs::remove_file(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::Io(path, e)),
        }
    }

    pub fn welcome_message(&self) -> String {
        format!("Welcome {}!", self.dni)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::tracker::entities::{Role, User};

    use super::{Session, SessionError};

    #[test]
    fn save_load_clear() -> Result<()> {
        let dir = tempdir()?;
        assert!(Session::load(dir.path())?.is_none());
        assert!(matches!(
            Session::require(dir.path()),
            Err(SessionError::NotLoggedIn)
        ));

        let session = Session::new(
            "http://localhost:5000",
            User {
                dni: "12345678A".into(),
                role: Role::User,
            },
        );
        session.save(dir.path())?;

        assert_eq!(Session::require(dir.path())?, session);
        assert_eq!(session.welcome_message(), "Welcome 12345678A!");

        assert!(Session::clear(dir.path())?);
        assert!(!Session::clear(dir.path())?);
        assert!(Session::load(dir.path())?.is_none());
        Ok(())
    }

    #[test]
    fn admin_check() {
        let mut session = Session::new(
            "http://localhost:5000",
            User {
                dni: "admin".into(),
                role: Role::Admin,
            },
        );
        assert!(session.require_admin().is_ok());
        session.role = Role::User;
        assert!(matches!(session.require_admin(), Err(SessionError::NotAdmin)));
    }
}
