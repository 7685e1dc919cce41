use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Chapter;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChapterCreate {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChapterUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChapterResponse {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ChapterResponse {
    pub(crate) fn from_db(chapter: Chapter) -> Self {
        Self {
            id: chapter.id,
            subject_id: chapter.subject_id,
            name: chapter.name,
            description: chapter.description,
            created_at: format_primitive(chapter.created_at),
            updated_at: format_primitive(chapter.updated_at),
        }
    }
}
