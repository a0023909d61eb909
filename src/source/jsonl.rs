//! JSON-lines file source

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use super::{top_by_id, AccountSource, SourceError, SourceResult};
use crate::types::Account;

/// Source that re-reads a JSONL file (one account per line) on every call,
/// so edits to the file show up on the next poll cycle.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> SourceResult<Vec<Account>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(parse_lenient(&content, &self.path))
    }
}

#[async_trait]
impl AccountSource for JsonlSource {
    async fn fetch_top(&self, limit: usize) -> SourceResult<Vec<Account>> {
        let accounts = self.read_all().await?;
        Ok(top_by_id(accounts, limit))
    }

    async fn get_account(&self, account_id: &str) -> SourceResult<Option<Account>> {
        let accounts = self.read_all().await?;
        // Last line wins, same as fetch_top.
        Ok(accounts.into_iter().rev().find(|a| a.account_id == account_id))
    }
}

/// Parse every line, skipping blank and malformed ones
fn parse_lenient(content: &str, path: &Path) -> Vec<Account> {
    let mut accounts = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Account>(line) {
            Ok(account) if !account.account_id.is_empty() => accounts.push(account),
            Ok(_) => warn!(path = %path.display(), line = idx + 1, "skipping account without id"),
            Err(e) => warn!(path = %path.display(), line = idx + 1, error = %e, "skipping malformed account"),
        }
    }
    accounts
}

/// Parse every line, failing on the first malformed one
pub(crate) fn parse_strict(content: &str) -> SourceResult<Vec<Account>> {
    let mut accounts = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let account = serde_json::from_str::<Account>(line)
            .map_err(|source| SourceError::Parse { line: idx + 1, source })?;
        accounts.push(account);
    }
    Ok(accounts)
}
