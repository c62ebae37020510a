use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction blueprint carried by a reminder and materialized on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTemplate {
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl TransactionTemplate {
    pub fn new(from_account: Uuid, to_account: Uuid, amount: f64) -> Self {
        Self {
            from_account,
            to_account,
            amount,
            currency: None,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Builds a dated transaction from this template.
    pub fn materialize(&self, date: NaiveDate, reminder_id: Option<Uuid>) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            from_account: self.from_account,
            to_account: self.to_account,
            date,
            amount: self.amount,
            currency: self.currency.clone(),
            memo: self.memo.clone(),
            reminder_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default)]
    pub reminder_id: Option<Uuid>,
}
