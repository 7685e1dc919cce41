use sqlx::PgPool;

use crate::db::models::Chapter;

const COLUMNS: &str = "id, subject_id, name, description, created_at, updated_at";

pub(crate) struct CreateChapter<'a> {
    pub(crate) id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateChapter {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateChapter<'_>,
) -> Result<Chapter, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "INSERT INTO chapters (id, subject_id, name, description, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.subject_id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!("SELECT {COLUMNS} FROM chapters WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_subject(
    pool: &PgPool,
    subject_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "SELECT {COLUMNS} FROM chapters WHERE subject_id = $1
         ORDER BY created_at OFFSET $2 LIMIT $3"
    ))
    .bind(subject_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_subject(pool: &PgPool, subject_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM chapters WHERE subject_id = $1")
        .bind(subject_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateChapter,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE chapters SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            updated_at = $3
         WHERE id = $4",
    )
    .bind(params.name)
    .bind(params.description)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Removes the chapter and every dependent row, children first, within the
/// caller's transaction.
pub(crate) async fn delete_cascade(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    chapter_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM quiz_attempts WHERE quiz_id IN (
            SELECT id FROM quizzes WHERE chapter_id = $1
         )",
    )
    .bind(chapter_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "DELETE FROM questions WHERE quiz_id IN (
            SELECT id FROM quizzes WHERE chapter_id = $1
         )",
    )
    .bind(chapter_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM quizzes WHERE chapter_id = $1")
        .bind(chapter_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM chapters WHERE id = $1")
        .bind(chapter_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
