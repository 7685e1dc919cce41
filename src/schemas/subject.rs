use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Subject;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SubjectResponse {
    pub(crate) fn from_db(subject: Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            description: subject.description,
            created_at: format_primitive(subject.created_at),
            updated_at: format_primitive(subject.updated_at),
        }
    }
}
