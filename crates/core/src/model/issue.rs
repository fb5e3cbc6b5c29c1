#![forbid(unsafe_code)]

use super::Audit;
use crate::ValidationError;
use crate::error::{non_blank, required, required_text};
use crate::ids::{IssueId, ProjectId, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::Open,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        }
    }
}

impl FromStr for IssueStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "status",
                value: value.to_string(),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl IssuePriority {
    pub const ALL: [IssuePriority; 4] = [
        IssuePriority::Low,
        IssuePriority::Medium,
        IssuePriority::High,
        IssuePriority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssuePriority::Low => "low",
            IssuePriority::Medium => "medium",
            IssuePriority::High => "high",
            IssuePriority::Critical => "critical",
        }
    }
}

impl FromStr for IssuePriority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "priority",
                value: value.to_string(),
            })
    }
}

/// Issue fields whose edits are recorded in change history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueField {
    IssueSummary,
    IssueDescription,
    AssignedTo,
    Status,
    Label,
    Priority,
    TargetResolutionDate,
    ActualResolutionDate,
    Progress,
    ResolutionSummary,
    Project,
}

impl IssueField {
    pub const TRACKED: [IssueField; 11] = [
        IssueField::IssueSummary,
        IssueField::IssueDescription,
        IssueField::AssignedTo,
        IssueField::Status,
        IssueField::Label,
        IssueField::Priority,
        IssueField::TargetResolutionDate,
        IssueField::ActualResolutionDate,
        IssueField::Progress,
        IssueField::ResolutionSummary,
        IssueField::Project,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueField::IssueSummary => "issue_summary",
            IssueField::IssueDescription => "issue_description",
            IssueField::AssignedTo => "assigned_to",
            IssueField::Status => "status",
            IssueField::Label => "label",
            IssueField::Priority => "priority",
            IssueField::TargetResolutionDate => "target_resolution_date",
            IssueField::ActualResolutionDate => "actual_resolution_date",
            IssueField::Progress => "progress",
            IssueField::ResolutionSummary => "resolution_summary",
            IssueField::Project => "project",
        }
    }
}

impl FromStr for IssueField {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::TRACKED
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "changed_field",
                value: value.to_string(),
            })
    }
}

impl std::fmt::Display for IssueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub issue_id: IssueId,
    pub issue_summary: String,
    pub issue_description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub status: IssueStatus,
    pub label: Option<String>,
    pub priority: IssuePriority,
    pub target_resolution_date: Option<Date>,
    pub actual_resolution_date: Option<Date>,
    pub progress: Option<String>,
    pub resolution_summary: Option<String>,
    pub created_on: Date,
    pub created_by: UserId,
    pub last_modification_on: Date,
    pub last_modification_by: UserId,
    pub project: ProjectId,
}

/// One tracked field that differs between two versions of an issue.
/// Values are rendered as text; `None` means the field was empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub field: IssueField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl Issue {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank("issue_summary", &self.issue_summary)?;
        Ok(())
    }

    pub fn field_value(&self, field: IssueField) -> Option<String> {
        match field {
            IssueField::IssueSummary => Some(self.issue_summary.clone()),
            IssueField::IssueDescription => self.issue_description.clone(),
            IssueField::AssignedTo => self.assigned_to.map(|id| id.to_string()),
            IssueField::Status => Some(self.status.as_str().to_string()),
            IssueField::Label => self.label.clone(),
            IssueField::Priority => Some(self.priority.as_str().to_string()),
            IssueField::TargetResolutionDate => {
                self.target_resolution_date.map(|date| date.to_string())
            }
            IssueField::ActualResolutionDate => {
                self.actual_resolution_date.map(|date| date.to_string())
            }
            IssueField::Progress => self.progress.clone(),
            IssueField::ResolutionSummary => self.resolution_summary.clone(),
            IssueField::Project => Some(self.project.to_string()),
        }
    }

    /// Tracked fields that differ from `self` to `next`, in declaration order.
    pub fn diff(&self, next: &Issue) -> Vec<FieldChange> {
        IssueField::TRACKED
            .into_iter()
            .filter_map(|field| {
                let old_value = self.field_value(field);
                let new_value = next.field_value(field);
                (old_value != new_value).then_some(FieldChange {
                    field,
                    old_value,
                    new_value,
                })
            })
            .collect()
    }

    /// Copy of `next` that keeps this issue's identity and creation stamp and
    /// takes the modification stamp from `audit`.
    pub fn revised(&self, next: &Issue, audit: &Audit) -> Issue {
        Issue {
            issue_id: self.issue_id,
            created_on: self.created_on,
            created_by: self.created_by,
            last_modification_on: audit.date(),
            last_modification_by: audit.actor,
            ..next.clone()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueDraft {
    pub issue_id: Option<IssueId>,
    pub issue_summary: Option<String>,
    pub issue_description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub status: Option<String>,
    pub label: Option<String>,
    pub priority: Option<String>,
    pub target_resolution_date: Option<Date>,
    pub actual_resolution_date: Option<Date>,
    pub progress: Option<String>,
    pub resolution_summary: Option<String>,
    pub project: Option<ProjectId>,
}

impl IssueDraft {
    pub fn new(
        project: ProjectId,
        issue_summary: impl Into<String>,
        status: IssueStatus,
        priority: IssuePriority,
    ) -> Self {
        Self {
            project: Some(project),
            issue_summary: Some(issue_summary.into()),
            status: Some(status.as_str().to_string()),
            priority: Some(priority.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn build(self, issue_id: IssueId, audit: &Audit) -> Result<Issue, ValidationError> {
        let issue_summary = required_text("issue_summary", self.issue_summary)?;
        let status = required("status", self.status)?.parse::<IssueStatus>()?;
        let priority = required("priority", self.priority)?.parse::<IssuePriority>()?;
        let project = required("project", self.project)?;
        Ok(Issue {
            issue_id,
            issue_summary,
            issue_description: self.issue_description,
            assigned_to: self.assigned_to,
            status,
            label: self.label,
            priority,
            target_resolution_date: self.target_resolution_date,
            actual_resolution_date: self.actual_resolution_date,
            progress: self.progress,
            resolution_summary: self.resolution_summary,
            created_on: audit.date(),
            created_by: audit.actor,
            last_modification_on: audit.date(),
            last_modification_by: audit.actor,
            project,
        })
    }
}
