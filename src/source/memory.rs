//! In-memory account store

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::jsonl::parse_strict;
use super::{AccountSource, SourceResult};
use crate::types::Account;

/// Thread-safe in-process account store keyed by account id.
///
/// The map is ordered, so `fetch_top` is a plain prefix scan.
#[derive(Debug, Default)]
pub struct MemorySource {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding the given accounts
    pub fn with_accounts<I: IntoIterator<Item = Account>>(accounts: I) -> Self {
        let source = Self::new();
        for account in accounts {
            source.upsert(account);
        }
        source
    }

    /// Seed a store from a JSONL file; a missing file yields an empty store
    pub fn from_file<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::with_accounts(parse_strict(&content)?))
    }

    /// Insert or replace an account; returns the previous value
    pub fn upsert(&self, account: Account) -> Option<Account> {
        self.accounts
            .write()
            .insert(account.account_id.clone(), account)
    }

    pub fn remove(&self, account_id: &str) -> Option<Account> {
        self.accounts.write().remove(account_id)
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountSource for MemorySource {
    async fn fetch_top(&self, limit: usize) -> SourceResult<Vec<Account>> {
        Ok(self.accounts.read().values().take(limit).cloned().collect())
    }

    async fn get_account(&self, account_id: &str) -> SourceResult<Option<Account>> {
        Ok(self.accounts.read().get(account_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_upsert_and_fetch_in_id_order() {
        let source = MemorySource::new();
        source.upsert(Account::new("B", "ACTIVE"));
        source.upsert(Account::new("A", "ACTIVE"));
        source.upsert(Account::new("C", "ACTIVE"));

        let top = source.fetch_top(2).await.unwrap();
        let ids: Vec<_> = top.iter().map(|a| a.account_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let source = MemorySource::with_accounts(vec![Account::new("A", "ACTIVE")]);
        let previous = source.upsert(Account::new("A", "CLOSED"));
        assert_eq!(previous.unwrap().status, "ACTIVE");
        assert_eq!(source.len(), 1);

        let current = source.get_account("A").await.unwrap().unwrap();
        assert_eq!(current.status, "CLOSED");
    }

    #[tokio::test]
    async fn test_remove() {
        let source = MemorySource::with_accounts(vec![Account::new("A", "ACTIVE")]);
        assert!(source.remove("A").is_some());
        assert!(source.is_empty());
        assert!(source.get_account("A").await.unwrap().is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"account_id":"A","status":"ACTIVE"}}"#).unwrap();
        writeln!(file, r#"{{"account_id":"B","status":"ACTIVE"}}"#).unwrap();

        let source = MemorySource::from_file(file.path()).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_from_missing_file_is_empty() {
        let source = MemorySource::from_file("no/such/accounts.jsonl").unwrap();
        assert!(source.is_empty());
    }
}
