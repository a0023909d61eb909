//! Broadcast message payloads

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::Account;

/// Payload sent on idle connections to keep them open
const KEEP_ALIVE_PAYLOAD: &str = "{}";

/// Immutable serialized payload fanned out to every subscriber.
///
/// Cloning is cheap: all subscribers share the same buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Message(Arc<str>);

impl Message {
    /// Serialize a changed account
    pub fn account(account: &Account) -> serde_json::Result<Self> {
        Self::json(account)
    }

    /// Serialize any JSON value
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(Self(serde_json::to_string(value)?.into()))
    }

    /// The empty-object keep-alive marker
    pub fn keep_alive() -> Self {
        Self(Arc::from(KEEP_ALIVE_PAYLOAD))
    }

    pub fn is_keep_alive(&self) -> bool {
        &*self.0 == KEEP_ALIVE_PAYLOAD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Message").field(&&*self.0).finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_alive_is_empty_object() {
        let msg = Message::keep_alive();
        assert_eq!(msg.as_str(), "{}");
        assert!(msg.is_keep_alive());
    }

    #[test]
    fn test_account_message_is_json() {
        let msg = Message::account(&Account::new("A", "ACTIVE")).unwrap();
        let value: serde_json::Value = serde_json::from_str(msg.as_str()).unwrap();
        assert_eq!(value["account_id"], "A");
        assert_eq!(value["status"], "ACTIVE");
        assert!(!msg.is_keep_alive());
    }
}
