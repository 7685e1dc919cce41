use serde::Serialize;

use crate::core::time::format_primitive;
use crate::repositories::attempts::AttemptHistoryRow;

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) subject_name: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i64,
    pub(crate) completed_at: String,
}

impl AttemptResponse {
    pub(crate) fn from_row(row: AttemptHistoryRow) -> Self {
        Self {
            id: row.id,
            quiz_id: row.quiz_id,
            quiz_title: row.quiz_title,
            subject_name: row.subject_name,
            score: row.score,
            total_questions: row.question_count,
            completed_at: format_primitive(row.completed_at),
        }
    }
}
