//! Ledger transactions and the admin audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AuditLogId, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    #[serde(alias = "Inbound")]
    Inbound,
    #[serde(alias = "Outbound")]
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: f64,
    pub direction: TransactionDirection,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub direction: TransactionDirection,
    /// Booking date; defaults to the time of recording
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn from_new(id: TransactionId, new: NewTransaction, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            description: new.description,
            amount: new.amount,
            direction: new.direction,
            date: new.date.unwrap_or(recorded_at),
        }
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == TransactionDirection::Inbound
    }
}

/// One administrative action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub actor: String,
    /// Dotted action name, e.g. "scholarship.approved"
    pub action: String,
    pub target: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditLog {
    pub actor: String,
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
}

impl AuditLog {
    pub fn from_new(id: AuditLogId, new: NewAuditLog, time: DateTime<Utc>) -> Self {
        Self {
            id,
            actor: new.actor,
            action: new.action,
            target: new.target,
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_accepts_both_spellings() {
        let lower: TransactionDirection = serde_json::from_str("\"inbound\"").unwrap();
        let title: TransactionDirection = serde_json::from_str("\"Inbound\"").unwrap();
        assert_eq!(lower, title);
        assert_eq!(serde_json::to_string(&TransactionDirection::Outbound).unwrap(), "\"outbound\"");
    }

    #[test]
    fn test_transaction_date_defaults_to_recording_time() {
        let now = Utc::now();
        let new: NewTransaction =
            serde_json::from_str(r#"{"description": "Tuition", "amount": 250.0, "direction": "inbound"}"#).unwrap();
        let tx = Transaction::from_new(TransactionId::new(1), new, now);
        assert_eq!(tx.date, now);
        assert!(tx.is_inbound());
    }
}
