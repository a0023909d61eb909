//! Account types polled from the account store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{is_false, is_zero_amount};

/// Version of the rule implemented by [`Account::is_same`].
///
/// Bump this whenever the set of compared fields changes. The poll loop logs
/// it at startup; it is not part of the streamed payload.
pub const CHANGE_RULE_VERSION: u32 = 1;

/// Number of leading balances that take part in change detection.
pub const COMPARED_BALANCES: usize = 2;

/// RFC 3339 timestamp, or `None` when the value is empty, null or malformed.
///
/// Timestamps never take part in change detection, so a bad one must not
/// cost the whole account.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

/// A single balance line of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default, skip_serializing_if = "is_zero_amount")]
    pub amount: f64,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub balance_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub credit_flag: bool,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Balance {
    /// Create a balance without a type or timestamp
    pub fn new(amount: f64, credit_flag: bool) -> Self {
        Self {
            amount,
            balance_type: String::new(),
            credit_flag,
            last_updated: None,
        }
    }
}

/// Account summary as stored in the account collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prod_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prod_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub servicer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub balances: Vec<Balance>,
}

impl Account {
    /// Create an account with only an identifier and a status
    pub fn new(account_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper to append a balance
    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balances.push(balance);
        self
    }

    /// Change-detection equality (rule version [`CHANGE_RULE_VERSION`]).
    ///
    /// Two accounts are the same when the identifier, nickname, currency,
    /// product code and name, servicer and status match, and the first
    /// [`COMPARED_BALANCES`] balances agree on amount and credit flag.
    /// Timestamps and any further balances are ignored. A balance slot that
    /// is missing on both sides counts as equal.
    pub fn is_same(&self, other: &Account) -> bool {
        self.account_id == other.account_id
            && self.nickname == other.nickname
            && self.currency == other.currency
            && self.prod_code == other.prod_code
            && self.prod_name == other.prod_name
            && self.servicer == other.servicer
            && self.status == other.status
            && (0..COMPARED_BALANCES).all(|i| {
                match (self.balances.get(i), other.balances.get(i)) {
                    (Some(a), Some(b)) => a.amount == b.amount && a.credit_flag == b.credit_flag,
                    (None, None) => true,
                    _ => false,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account {
            account_id: "5010060647".to_string(),
            nickname: "Everyday".to_string(),
            prod_code: "DDA".to_string(),
            prod_name: "Checking".to_string(),
            currency: "USD".to_string(),
            servicer: "Main St".to_string(),
            status: "ACTIVE".to_string(),
            status_last_updated: None,
            balances: vec![Balance::new(100.0, false), Balance::new(25.5, true)],
        }
    }

    #[test]
    fn test_identical_accounts_are_same() {
        assert!(sample().is_same(&sample()));
    }

    #[test]
    fn test_status_change_is_detected() {
        let mut changed = sample();
        changed.status = "CLOSED".to_string();
        assert!(!sample().is_same(&changed));
    }

    #[test]
    fn test_second_balance_credit_flag_is_compared() {
        let mut changed = sample();
        changed.balances[1].credit_flag = false;
        assert!(!sample().is_same(&changed));
    }

    #[test]
    fn test_timestamps_and_extra_balances_are_ignored() {
        let mut changed = sample();
        changed.status_last_updated = Some(Utc::now());
        changed.balances[0].last_updated = Some(Utc::now());
        changed.balances[0].balance_type = "LEDGER".to_string();
        changed.balances.push(Balance::new(999.0, true));
        assert!(sample().is_same(&changed));
    }

    #[test]
    fn test_missing_balance_slots() {
        let a = Account::new("A", "ACTIVE");
        let b = Account::new("A", "ACTIVE");
        assert!(a.is_same(&b));

        let c = Account::new("A", "ACTIVE").with_balance(Balance::new(1.0, false));
        assert!(!a.is_same(&c));
        assert!(!c.is_same(&a));
    }

    #[test]
    fn test_account_serialization_uses_snake_case_and_omits_empty() {
        let account = Account::new("A", "ACTIVE").with_balance(Balance {
            amount: 12.5,
            balance_type: "AVAILABLE".to_string(),
            credit_flag: true,
            last_updated: None,
        });

        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains(r#""account_id":"A""#));
        assert!(json.contains(r#""type":"AVAILABLE""#));
        assert!(json.contains(r#""credit_flag":true"#));
        assert!(!json.contains("nickname"));
        assert!(!json.contains("status_last_updated"));
    }

    #[test]
    fn test_malformed_timestamps_become_none() {
        let line = r#"{"account_id":"A","status_last_updated":"","balances":[{"amount":2.0,"last_updated":"2020-01-02 03:04:05"},{"amount":3.0,"last_updated":17}]}"#;
        let account: Account = serde_json::from_str(line).unwrap();
        assert!(account.status_last_updated.is_none());
        assert_eq!(account.balances.len(), 2);
        assert!(account.balances.iter().all(|b| b.last_updated.is_none()));
        assert_eq!(account.balances[1].amount, 3.0);
    }

    #[test]
    fn test_account_deserialization_with_timestamps() {
        let line = r#"{"account_id":"111","status":"ACTIVE","status_last_updated":"2020-01-02T03:04:05Z","balances":[{"amount":1.5,"last_updated":"2020-01-02T03:04:05Z"}]}"#;
        let account: Account = serde_json::from_str(line).unwrap();
        assert_eq!(account.account_id, "111");
        assert!(account.status_last_updated.is_some());
        assert_eq!(account.balances.len(), 1);
        assert!(!account.balances[0].credit_flag);
    }
}
