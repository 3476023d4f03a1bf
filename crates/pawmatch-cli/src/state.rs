//! On-disk CLI state: the favorites document and the saved login session.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{CliError, CliResult};

const FAVORITES_FILE: &str = "state.json";
const SESSION_FILE: &str = "session.json";

/// Login details persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cookie: Option<String>,
    pub(crate) created_at_ms: u64,
}

/// Locations of the files kept in the state directory.
#[derive(Debug, Clone)]
pub(crate) struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the state directory: explicit flag, then `$XDG_STATE_HOME/pawmatch`,
    /// then `$HOME/.local/state/pawmatch`, then `./.pawmatch`.
    pub(crate) fn resolve(
        explicit: Option<PathBuf>,
        xdg_state_home: Option<OsString>,
        home: Option<OsString>,
    ) -> Self {
        let non_empty = |value: Option<OsString>| value.filter(|v| !v.is_empty()).map(PathBuf::from);
        let root = explicit
            .or_else(|| non_empty(xdg_state_home).map(|dir| dir.join("pawmatch")))
            .or_else(|| {
                non_empty(home).map(|dir| dir.join(".local").join("state").join("pawmatch"))
            })
            .unwrap_or_else(|| PathBuf::from(".pawmatch"));
        Self::new(root)
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn favorites_file(&self) -> PathBuf {
        self.root.join(FAVORITES_FILE)
    }

    pub(crate) fn session_file(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    /// Saved session, if any. An unreadable file is logged and ignored.
    pub(crate) fn load_session(&self) -> Option<StoredSession> {
        let path = self.session_file();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to read session file");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|err| warn!(error = %err, path = %path.display(), "ignoring corrupt session file"))
            .ok()
    }

    pub(crate) fn save_session(&self, session: &StoredSession) -> CliResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| {
            CliError::failure(anyhow!(
                "failed to create state directory '{}': {err}",
                self.root.display()
            ))
        })?;
        let body = serde_json::to_vec_pretty(session)
            .map_err(|err| CliError::failure(anyhow!("failed to encode session: {err}")))?;
        let path = self.session_file();
        write_private(&path, &body).map_err(|err| {
            CliError::failure(anyhow!("failed to write '{}': {err}", path.display()))
        })
    }

    pub(crate) fn clear_session(&self) -> CliResult<()> {
        let path = self.session_file();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CliError::failure(anyhow!(
                "failed to remove '{}': {err}",
                path.display()
            ))),
        }
    }
}

/// Write `body` to `path`, readable by the owner only on unix. The session
/// file carries the auth cookie.
fn write_private(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let mut file = options.open(path)?;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(body)
    }
    #[cfg(not(unix))]
    {
        options.open(path)?.write_all(body)
    }
}
