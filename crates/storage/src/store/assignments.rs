#![forbid(unsafe_code)]

use super::rows::{ensure_project_ref_tx, ensure_user_ref_tx, fetch_assignment};
use super::{StoreError, UnitOfWork};
use rusqlite::params;
use tk_core::ids::{ProjectId, UserId};
use tk_core::model::AssignedProject;
use tracing::debug;

impl UnitOfWork<'_> {
    pub fn insert_assignment(
        &mut self,
        assignment: &AssignedProject,
    ) -> Result<AssignedProject, StoreError> {
        self.atomic("insert_assignment", |conn| {
            assignment.validate()?;
            ensure_user_ref_tx(conn, "user_id", assignment.user_id)?;
            ensure_project_ref_tx(conn, "project_id", assignment.project_id)?;
            if fetch_assignment(conn, assignment.user_id, assignment.project_id)?.is_some() {
                return Err(StoreError::ConstraintViolation(format!(
                    "user {} already has a role on project {}",
                    assignment.user_id, assignment.project_id
                )));
            }

            conn.execute(
                "INSERT INTO assigned_projects(user_id, project_id, user_role) VALUES (?1, ?2, ?3)",
                params![
                    assignment.user_id.get(),
                    assignment.project_id.get(),
                    assignment.user_role,
                ],
            )?;
            debug!(
                user_id = %assignment.user_id,
                project_id = %assignment.project_id,
                role = %assignment.user_role,
                "assignment inserted"
            );
            Ok(assignment.clone())
        })
    }

    /// The role is the only mutable part of an assignment.
    pub fn update_assignment_role(
        &mut self,
        user_id: UserId,
        project_id: ProjectId,
        user_role: &str,
    ) -> Result<AssignedProject, StoreError> {
        self.atomic("update_assignment_role", |conn| {
            let assignment = AssignedProject::try_new(user_id, project_id, user_role)?;
            let updated = conn.execute(
                "UPDATE assigned_projects SET user_role=?3 WHERE user_id=?1 AND project_id=?2",
                params![user_id.get(), project_id.get(), assignment.user_role],
            )?;
            if updated == 0 {
                return Err(StoreError::not_found(
                    "assignment",
                    format!("{user_id}/{project_id}"),
                ));
            }
            Ok(assignment)
        })
    }

    pub fn delete_assignment(
        &mut self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<(), StoreError> {
        self.atomic("delete_assignment", |conn| {
            let deleted = conn.execute(
                "DELETE FROM assigned_projects WHERE user_id=?1 AND project_id=?2",
                params![user_id.get(), project_id.get()],
            )?;
            if deleted == 0 {
                return Err(StoreError::not_found(
                    "assignment",
                    format!("{user_id}/{project_id}"),
                ));
            }
            Ok(())
        })
    }
}
