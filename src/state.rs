//! JSON file holding a [`CursorState`] between runs.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cursor::CursorState;
use crate::error::{Error, Result};

/// Resume state stored as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state, or `None` if nothing has been saved yet
    pub async fn load(&self) -> Result<Option<CursorState>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::LocalIo(e)),
        };
        let state = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Save the state, replacing the previous file in one rename
    pub async fn save(&self, state: &CursorState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content)
            .await
            .map_err(Error::LocalIo)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(Error::LocalIo)?;
        debug!(path = ?self.path, pos = state.current_pos, "saved resume state");
        Ok(())
    }
}
