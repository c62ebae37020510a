use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reminder::Reminder;
use crate::errors::ReminderError;

/// The owned collection of reminders for one data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderBook {
    pub name: String,
    #[serde(default)]
    reminders: Vec<Reminder>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderBook {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            reminders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    /// Reminders in display order (description, kind, id).
    pub fn sorted(&self) -> Vec<&Reminder> {
        let mut list: Vec<&Reminder> = self.reminders.iter().collect();
        list.sort();
        list
    }

    pub fn add(&mut self, reminder: Reminder) -> Result<Uuid, ReminderError> {
        reminder.validate()?;
        let id = reminder.id();
        if self.get(id).is_some() {
            return Err(ReminderError::Duplicate(id));
        }
        tracing::debug!(%id, description = reminder.description(), "reminder added");
        self.reminders.push(reminder);
        self.touch();
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Reminder, ReminderError> {
        let position = self
            .reminders
            .iter()
            .position(|reminder| reminder.id() == id)
            .ok_or(ReminderError::NotFound(id))?;
        let removed = self.reminders.remove(position);
        tracing::debug!(%id, "reminder removed");
        self.touch();
        Ok(removed)
    }

    /// Commits an edited copy over the stored reminder with the same id.
    pub fn update(&mut self, edited: Reminder) -> Result<(), ReminderError> {
        edited.validate()?;
        let id = edited.id();
        let slot = self.get_mut(id).ok_or(ReminderError::NotFound(id))?;
        *slot = edited;
        self.touch();
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id() == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Reminder> {
        self.reminders.iter_mut().find(|reminder| reminder.id() == id)
    }

    /// Resolves an id or a unique prefix of its hyphenated form.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&Reminder, ReminderError> {
        let needle = prefix.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(ReminderError::InvalidReference("empty reminder id".into()));
        }
        let mut matches = self
            .reminders
            .iter()
            .filter(|reminder| reminder.id().to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found),
            (None, _) => Err(ReminderError::InvalidReference(format!(
                "no reminder matches `{prefix}`"
            ))),
            (Some(_), Some(_)) => Err(ReminderError::InvalidReference(format!(
                "`{prefix}` matches more than one reminder"
            ))),
        }
    }

    /// Re-checks every record, e.g. after loading from disk.
    pub fn validate(&self) -> Result<(), ReminderError> {
        let mut seen = std::collections::HashSet::new();
        for reminder in &self.reminders {
            reminder.validate()?;
            if !seen.insert(reminder.id()) {
                return Err(ReminderError::Duplicate(reminder.id()));
            }
        }
        Ok(())
    }
}
