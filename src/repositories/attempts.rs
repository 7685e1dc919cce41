use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::QuizAttempt;

const COLUMNS: &str = "id, user_id, quiz_id, score, completed_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AttemptHistoryRow {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) subject_name: String,
    pub(crate) score: i32,
    pub(crate) question_count: i64,
    pub(crate) completed_at: PrimitiveDateTime,
}

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) score: i32,
    pub(crate) completed_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (id, user_id, quiz_id, score, completed_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.quiz_id)
    .bind(params.score)
    .bind(params.completed_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn count_by_user_and_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2")
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts").fetch_one(pool).await
}

pub(crate) async fn count_by_user(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Mean score over every attempt; zero when the table is empty.
pub(crate) async fn average_score(pool: &PgPool) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(AVG(score), 0)::FLOAT8 FROM quiz_attempts")
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_history_by_user(
    pool: &PgPool,
    user_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<AttemptHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptHistoryRow>(
        "SELECT a.id,
                a.quiz_id,
                qz.title AS quiz_title,
                s.name AS subject_name,
                a.score,
                (SELECT COUNT(*) FROM questions qn WHERE qn.quiz_id = a.quiz_id) AS question_count,
                a.completed_at
         FROM quiz_attempts a
         JOIN quizzes qz ON qz.id = a.quiz_id
         JOIN chapters c ON c.id = qz.chapter_id
         JOIN subjects s ON s.id = c.subject_id
         WHERE a.user_id = $1
         ORDER BY a.completed_at DESC
         OFFSET $2 LIMIT $3",
    )
    .bind(user_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn subject_counts_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT s.name, COUNT(*) AS attempt_count
         FROM quiz_attempts a
         JOIN quizzes qz ON qz.id = a.quiz_id
         JOIN chapters c ON c.id = qz.chapter_id
         JOIN subjects s ON s.id = c.subject_id
         WHERE a.user_id = $1
         GROUP BY s.name
         ORDER BY s.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Raw completion instants; month bucketing happens in the reporting service.
pub(crate) async fn completion_times_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<PrimitiveDateTime>, sqlx::Error> {
    sqlx::query_scalar("SELECT completed_at FROM quiz_attempts WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}
