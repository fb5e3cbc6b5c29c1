#![forbid(unsafe_code)]

use crate::ValidationError;
use crate::error::{non_blank, required_text};
use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub username: String,
    pub created_on: Date,
}

impl User {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank("user_name", &self.user_name)?;
        non_blank("username", &self.username)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDraft {
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub username: Option<String>,
}

impl UserDraft {
    pub fn new(user_name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: None,
            user_name: Some(user_name.into()),
            username: Some(username.into()),
        }
    }

    pub fn build(self, user_id: UserId, created_on: Date) -> Result<User, ValidationError> {
        Ok(User {
            user_id,
            user_name: required_text("user_name", self.user_name)?,
            username: required_text("username", self.username)?,
            created_on,
        })
    }
}
