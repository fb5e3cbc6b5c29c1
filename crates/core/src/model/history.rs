#![forbid(unsafe_code)]

use super::{Audit, FieldChange, IssueField};
use crate::ids::{IssueId, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A change history entry before it is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    pub issue_id: IssueId,
    pub changed_field: IssueField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_on: OffsetDateTime,
    pub changed_by: UserId,
}

impl ChangeRecord {
    pub fn from_change(issue_id: IssueId, change: FieldChange, audit: &Audit) -> Self {
        Self {
            issue_id,
            changed_field: change.field,
            old_value: change.old_value,
            new_value: change.new_value,
            changed_on: audit.at,
            changed_by: audit.actor,
        }
    }
}

/// A persisted change history entry. Never modified once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub entry_id: i64,
    pub issue_id: IssueId,
    pub changed_field: IssueField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub changed_on: OffsetDateTime,
    pub changed_by: UserId,
}

impl ChangeEntry {
    pub fn from_record(entry_id: i64, record: ChangeRecord) -> Self {
        Self {
            entry_id,
            issue_id: record.issue_id,
            changed_field: record.changed_field,
            old_value: record.old_value,
            new_value: record.new_value,
            changed_on: record.changed_on,
            changed_by: record.changed_by,
        }
    }
}
