use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Transaction, TransactionSink, TransactionTemplate};
use crate::errors::LedgerError;

/// In-memory transaction journal.
///
/// When `accounts` is non-empty only templates referencing known accounts
/// are accepted; an empty set accepts any account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub accounts: HashSet<Uuid>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
            transactions: Vec::new(),
        }
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn for_reminder(&self, reminder_id: Uuid) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|txn| txn.reminder_id == Some(reminder_id))
            .collect()
    }

    fn check_template(&self, template: &TransactionTemplate) -> Result<(), LedgerError> {
        if !template.amount.is_finite() {
            return Err(LedgerError::InvalidTemplate(format!(
                "amount {} is not a finite number",
                template.amount
            )));
        }
        if template.from_account.is_nil() || template.to_account.is_nil() {
            return Err(LedgerError::InvalidTemplate(
                "template references a nil account".into(),
            ));
        }
        if self.accounts.is_empty() {
            return Ok(());
        }
        for account in [template.from_account, template.to_account] {
            if !self.accounts.contains(&account) {
                return Err(LedgerError::UnknownAccount(account));
            }
        }
        Ok(())
    }
}

impl TransactionSink for Journal {
    fn materialize(
        &mut self,
        template: &TransactionTemplate,
        date: NaiveDate,
        reminder_id: Uuid,
    ) -> Result<Uuid, LedgerError> {
        self.check_template(template)?;
        let txn = template.materialize(date, Some(reminder_id));
        let id = txn.id;
        tracing::debug!(%id, %date, %reminder_id, "journal recorded transaction");
        self.transactions.push(txn);
        Ok(id)
    }
}
