use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserRegister {
    #[validate(length(min = 3, max = 64, message = "username must be between 3 and 64 characters"))]
    pub(crate) username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListUsersQuery {
    #[serde(default)]
    #[serde(alias = "isAdmin")]
    pub(crate) is_admin: Option<bool>,
    #[serde(default)]
    pub(crate) username: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) is_admin: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: format_primitive(user.created_at),
        }
    }
}

fn default_limit() -> i64 {
    100
}
