#![forbid(unsafe_code)]

use crate::ValidationError;
use crate::error::non_blank;
use crate::ids::{ProjectId, UserId};
use serde::{Deserialize, Serialize};

/// Junction row: the role a user holds on a project. At most one per pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedProject {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub user_role: String,
}

impl AssignedProject {
    pub fn try_new(
        user_id: UserId,
        project_id: ProjectId,
        user_role: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let assignment = Self {
            user_id,
            project_id,
            user_role: user_role.into(),
        };
        assignment.validate()?;
        Ok(assignment)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank("user_role", &self.user_role)?;
        Ok(())
    }
}
