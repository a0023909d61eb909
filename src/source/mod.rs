//! Account sources
//!
//! A source is the data-retrieval layer the poll loop samples and the query
//! API reads from:
//! - `MemorySource`: in-process store, optionally seeded from a JSONL file
//! - `JsonlSource`: re-reads a JSON-lines file on every call

mod jsonl;
mod memory;

pub use jsonl::JsonlSource;
pub use memory::MemorySource;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Account;

/// Errors raised while reading accounts
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Capability to read account snapshots.
///
/// Implementations must tolerate being called once per poll cycle and may
/// fail transiently; callers treat every error as retryable.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Up to `limit` accounts ordered by ascending account id
    async fn fetch_top(&self, limit: usize) -> SourceResult<Vec<Account>>;

    /// Single account lookup
    async fn get_account(&self, account_id: &str) -> SourceResult<Option<Account>>;
}

/// Order by account id and keep the first `limit` entries.
///
/// Duplicate ids collapse to the last occurrence.
pub(crate) fn top_by_id(accounts: Vec<Account>, limit: usize) -> Vec<Account> {
    let by_id: BTreeMap<String, Account> = accounts
        .into_iter()
        .map(|account| (account.account_id.clone(), account))
        .collect();
    by_id.into_values().take(limit).collect()
}
