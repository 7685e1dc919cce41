use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Quiz;

const COLUMNS: &str =
    "id, chapter_id, title, duration_minutes, start_date, end_date, created_at, updated_at";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) id: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) duration_minutes: i32,
    pub(crate) start_date: PrimitiveDateTime,
    pub(crate) end_date: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateQuiz {
    pub(crate) title: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) start_date: Option<PrimitiveDateTime>,
    pub(crate) end_date: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuiz<'_>,
) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, chapter_id, title, duration_minutes, start_date, end_date, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.chapter_id)
    .bind(params.title)
    .bind(params.duration_minutes)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_chapter(
    pool: &PgPool,
    chapter_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes WHERE chapter_id = $1
         ORDER BY start_date OFFSET $2 LIMIT $3"
    ))
    .bind(chapter_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_chapter(pool: &PgPool, chapter_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE chapter_id = $1")
        .bind(chapter_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateQuiz,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quizzes SET
            title = COALESCE($1, title),
            duration_minutes = COALESCE($2, duration_minutes),
            start_date = COALESCE($3, start_date),
            end_date = COALESCE($4, end_date),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.title)
    .bind(params.duration_minutes)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.updated_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn count_open_at(pool: &PgPool, now: PrimitiveDateTime) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE start_date <= $1 AND end_date >= $1")
        .bind(now)
        .fetch_one(pool)
        .await
}

/// Removes the quiz and every dependent row, children first, within the
/// caller's transaction.
pub(crate) async fn delete_cascade(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    quiz_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM quiz_attempts WHERE quiz_id = $1")
        .bind(quiz_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(quiz_id).execute(&mut **tx).await?;

    Ok(())
}
