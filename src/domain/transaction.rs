use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CategoryId, Cents, TransactionType};

pub type TransactionId = Uuid;

/// A single income or expense entry in the ledger.
/// Transactions are immutable once read by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub category_id: CategoryId,
    /// Amount in cents (always positive)
    #[serde(with = "super::as_decimal")]
    pub amount: Cents,
    /// Always equal to the category's kind
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Calendar day the money moved
    pub date: NaiveDate,
    pub description: String,
    /// When the record was stored
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        category_id: CategoryId,
        transaction_type: TransactionType,
        amount: Cents,
        date: NaiveDate,
    ) -> Self {
        assert!(amount > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            category_id,
            amount,
            transaction_type,
            date,
            description: String::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}
