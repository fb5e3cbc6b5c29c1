#![forbid(unsafe_code)]

use super::Audit;
use crate::ValidationError;
use crate::error::{non_blank, required, required_text};
use crate::ids::{ProjectId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

#[derive(Clone, Debug, PartialEq)]
pub struct Project {
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

impl Project {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank("project_name", &self.project_name)?;
        Ok(())
    }
}

/// Insert input for a project. Every field is optional so a request body can
/// be deserialized as-is; `build` reports the first missing field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDraft {
    pub project_id: Option<ProjectId>,
    pub project_name: Option<String>,
    pub target_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub label: Option<Value>,
}

impl ProjectDraft {
    pub fn new(project_name: impl Into<String>, target_end_date: Date) -> Self {
        Self {
            project_name: Some(project_name.into()),
            target_end_date: Some(target_end_date),
            ..Self::default()
        }
    }

    pub fn build(self, project_id: ProjectId, audit: &Audit) -> Result<Project, ValidationError> {
        Ok(Project {
            project_id,
            project_name: required_text("project_name", self.project_name)?,
            target_end_date: required("target_end_date", self.target_end_date)?,
            actual_end_date: self.actual_end_date,
            label: self.label,
            created_on: audit.date(),
            created_by: audit.actor,
            modified_on: None,
            modified_by: None,
        })
    }
}
