//! Change detection against the retained snapshot set

use std::collections::HashMap;

use crate::types::Account;

/// Result of comparing a fetched account with the retained state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// New id, or any compared field differs
    Changed,
    Unchanged,
}

/// Retains the last observed state of every account seen so far.
///
/// Entries are never evicted: an account that disappears from the source
/// keeps its last state and no deletion event is produced.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    snapshot: HashMap<String, Account>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify without touching the snapshot set
    pub fn classify(&self, account: &Account) -> Classification {
        match self.snapshot.get(&account.account_id) {
            Some(previous) if previous.is_same(account) => Classification::Unchanged,
            _ => Classification::Changed,
        }
    }

    /// Classify and, when changed, store the account as the new baseline.
    ///
    /// Returns the stored account for changed input, `None` otherwise.
    pub fn observe(&mut self, account: Account) -> Option<&Account> {
        if self.classify(&account) == Classification::Unchanged {
            return None;
        }
        let id = account.account_id.clone();
        self.snapshot.insert(id.clone(), account);
        self.snapshot.get(&id)
    }

    /// Run a whole batch, returning the changed accounts in input order
    pub fn detect(&mut self, batch: Vec<Account>) -> Vec<Account> {
        batch
            .into_iter()
            .filter_map(|account| self.observe(account).cloned())
            .collect()
    }

    pub fn get(&self, account_id: &str) -> Option<&Account> {
        self.snapshot.get(account_id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Balance;

    fn account(id: &str, status: &str) -> Account {
        Account::new(id, status)
            .with_balance(Balance::new(10.0, false))
            .with_balance(Balance::new(5.0, true))
    }

    #[test]
    fn test_first_sighting_is_changed() {
        let mut detector = ChangeDetector::new();
        assert_eq!(detector.classify(&account("A", "ACTIVE")), Classification::Changed);
        assert!(detector.observe(account("A", "ACTIVE")).is_some());
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn test_identical_fields_are_unchanged() {
        let mut detector = ChangeDetector::new();
        detector.observe(account("A", "ACTIVE"));

        let mut same = account("A", "ACTIVE");
        same.balances[0].balance_type = "LEDGER".to_string();
        assert!(detector.observe(same).is_none());
    }

    #[test]
    fn test_changed_account_replaces_snapshot() {
        let mut detector = ChangeDetector::new();
        detector.observe(account("A", "ACTIVE"));

        let stored = detector.observe(account("A", "CLOSED")).unwrap();
        assert_eq!(stored.status, "CLOSED");
        assert_eq!(detector.get("A").unwrap().status, "CLOSED");
    }

    #[test]
    fn test_balance_amount_change_detected() {
        let mut detector = ChangeDetector::new();
        detector.observe(account("A", "ACTIVE"));

        let mut moved = account("A", "ACTIVE");
        moved.balances[1].amount = 6.0;
        assert_eq!(detector.classify(&moved), Classification::Changed);
    }

    #[test]
    fn test_detect_batch_keeps_order_and_skips_unchanged() {
        let mut detector = ChangeDetector::new();
        detector.observe(account("B", "ACTIVE"));

        let changed = detector.detect(vec![
            account("A", "ACTIVE"),
            account("B", "ACTIVE"),
            account("C", "ACTIVE"),
        ]);
        let ids: Vec<_> = changed.iter().map(|a| a.account_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_missing_accounts_are_not_evicted() {
        let mut detector = ChangeDetector::new();
        detector.detect(vec![account("A", "ACTIVE"), account("B", "ACTIVE")]);
        detector.detect(vec![account("A", "ACTIVE")]);

        assert_eq!(detector.len(), 2);
        assert!(detector.get("B").is_some());
    }
}
