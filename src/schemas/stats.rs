use serde::Serialize;

use crate::schemas::attempt::AttemptResponse;
use crate::services::reporting::MonthCount;

#[derive(Debug, Serialize)]
pub(crate) struct SubjectQuizCount {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) quiz_count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminStatsResponse {
    pub(crate) total_users: i64,
    pub(crate) active_quizzes: i64,
    pub(crate) completed_attempts: i64,
    pub(crate) avg_score: f64,
    pub(crate) subjects: Vec<SubjectQuizCount>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectAttemptCount {
    pub(crate) name: String,
    pub(crate) attempt_count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserStatsResponse {
    pub(crate) recent_attempts: Vec<AttemptResponse>,
    pub(crate) subject_attempts: Vec<SubjectAttemptCount>,
    pub(crate) monthly_attempts: Vec<MonthCount>,
}
