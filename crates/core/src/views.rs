#![forbid(unsafe_code)]

//! Response shapes. `short` carries the fields a client may edit; `long`
//! carries every declared field including audit metadata.

use crate::ids::{IssueId, ProjectId, UserId};
use crate::model::{AssignedProject, Issue, IssuePriority, IssueStatus, Project, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

pub trait Projection {
    type Short: Serialize;
    type Long: Serialize;

    fn short(&self) -> Self::Short;
    fn long(&self) -> Self::Long;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectShort {
    pub project_id: ProjectId,
    pub project_name: String,
    pub target_end_date: Date,
    pub actual_end_date: Option<Date>,
    pub label: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectLong {
    pub project_id: ProjectId,
    pub project_name: String,
    pub target_end_date: Date,
    pub actual_end_date: Option<Date>,
    pub label: Option<Value>,
    pub created_on: Date,
    pub created_by: UserId,
    pub modified_on: Option<Date>,
    pub modified_by: Option<UserId>,
}

impl Projection for Project {
    type Short = ProjectShort;
    type Long = ProjectLong;

    fn short(&self) -> ProjectShort {
        ProjectShort {
            project_id: self.project_id,
            project_name: self.project_name.clone(),
            target_end_date: self.target_end_date,
            actual_end_date: self.actual_end_date,
            label: self.label.clone(),
        }
    }

    fn long(&self) -> ProjectLong {
        ProjectLong {
            project_id: self.project_id,
            project_name: self.project_name.clone(),
            target_end_date: self.target_end_date,
            actual_end_date: self.actual_end_date,
            label: self.label.clone(),
            created_on: self.created_on,
            created_by: self.created_by,
            modified_on: self.modified_on,
            modified_by: self.modified_by,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShort {
    pub user_id: UserId,
    pub user_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLong {
    pub user_id: UserId,
    pub user_name: String,
    pub username: String,
    pub created_on: Date,
}

impl Projection for User {
    type Short = UserShort;
    type Long = UserLong;

    fn short(&self) -> UserShort {
        UserShort {
            user_id: self.user_id,
            user_name: self.user_name.clone(),
        }
    }

    fn long(&self) -> UserLong {
        UserLong {
            user_id: self.user_id,
            user_name: self.user_name.clone(),
            username: self.username.clone(),
            created_on: self.created_on,
        }
    }
}

/// Every assignment field is editable, so both projections share this shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentView {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub user_role: String,
}

impl Projection for AssignedProject {
    type Short = AssignmentView;
    type Long = AssignmentView;

    fn short(&self) -> AssignmentView {
        self.long()
    }

    fn long(&self) -> AssignmentView {
        AssignmentView {
            user_id: self.user_id,
            project_id: self.project_id,
            user_role: self.user_role.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueShort {
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
    pub project: ProjectId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLong {
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

impl Projection for Issue {
    type Short = IssueShort;
    type Long = IssueLong;

    fn short(&self) -> IssueShort {
        IssueShort {
            issue_id: self.issue_id,
            issue_summary: self.issue_summary.clone(),
            issue_description: self.issue_description.clone(),
            assigned_to: self.assigned_to,
            status: self.status,
            label: self.label.clone(),
            priority: self.priority,
            target_resolution_date: self.target_resolution_date,
            actual_resolution_date: self.actual_resolution_date,
            progress: self.progress.clone(),
            resolution_summary: self.resolution_summary.clone(),
            project: self.project,
        }
    }

    fn long(&self) -> IssueLong {
        IssueLong {
            issue_id: self.issue_id,
            issue_summary: self.issue_summary.clone(),
            issue_description: self.issue_description.clone(),
            assigned_to: self.assigned_to,
            status: self.status,
            label: self.label.clone(),
            priority: self.priority,
            target_resolution_date: self.target_resolution_date,
            actual_resolution_date: self.actual_resolution_date,
            progress: self.progress.clone(),
            resolution_summary: self.resolution_summary.clone(),
            created_on: self.created_on,
            created_by: self.created_by,
            last_modification_on: self.last_modification_on,
            last_modification_by: self.last_modification_by,
            project: self.project,
        }
    }
}
