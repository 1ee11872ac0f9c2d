//! Per-session transcript file.
//!
//! The whole array is rewritten after every turn (temp file, then rename).
//! A log belongs to exactly one session, which is its only writer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLogEntry {
    pub user_message: String,
    pub bot_response: String,
    pub timestamp: String,
}

#[derive(Debug, Default)]
pub struct TurnLog {
    path: Option<PathBuf>,
    entries: Vec<TurnLogEntry>,
}

impl TurnLog {
    /// A log kept only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// `<dir>/<session_id>.json`, with anything but `[A-Za-z0-9_-]` in the id replaced.
    pub fn for_session(dir: &Path, session_id: &str) -> Self {
        let file_stem: String = session_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Self {
            path: Some(dir.join(format!("{}.json", file_stem))),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[TurnLogEntry] {
        &self.entries
    }

    pub async fn record(
        &mut self,
        user_message: &str,
        bot_response: &str,
        at: NaiveDateTime,
    ) -> std::io::Result<()> {
        self.entries.push(TurnLogEntry {
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        });
        self.persist().await
    }

    async fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        self.entries.serialize(&mut serializer)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, path).await
    }
}
