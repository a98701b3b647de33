use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::{PersistedSession, SessionCredentials};
use crate::error::{SessionError, SessionResult};
use crate::store::SessionStore;

/// JSON-file store that survives process restarts.
///
/// The file is replaced through a sibling temp file and a rename, so a crash
/// mid-write leaves either the old record or the new one. Roles are held in
/// memory for the lifetime of the process only.
pub struct FileSessionStore {
    path: PathBuf,
    roles: Mutex<BTreeSet<String>>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            roles: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_else(|| "session".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_record(&self) -> SessionResult<Option<PersistedSession>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SessionError::Io(err)),
        }
    }

    async fn write_record(&self, record: &PersistedSession) -> SessionResult<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(record)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, payload).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), "persisted session record");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> SessionResult<Option<SessionCredentials>> {
        let roles = self.roles.lock().await;
        Ok(self
            .read_record()
            .await?
            .map(|record| record.into_credentials(roles.clone())))
    }

    async fn save(&self, credentials: &SessionCredentials) -> SessionResult<()> {
        let mut roles = self.roles.lock().await;
        self.write_record(&PersistedSession::from(credentials)).await?;
        *roles = credentials.roles.clone();
        Ok(())
    }

    async fn update_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> SessionResult<SessionCredentials> {
        let roles = self.roles.lock().await;
        let mut session = self
            .read_record()
            .await?
            .ok_or(SessionError::Missing)?
            .into_credentials(roles.clone());
        session.rotate(access_token, refresh_token);
        self.write_record(&PersistedSession::from(&session)).await?;
        Ok(session)
    }

    async fn clear(&self) -> SessionResult<bool> {
        let mut roles = self.roles.lock().await;
        roles.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(SessionError::Io(err)),
        }
    }
}
