use sqlx::PgPool;

use crate::db::models::Subject;

const COLUMNS: &str = "id, name, description, created_at, updated_at";

pub(crate) struct CreateSubject<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateSubject {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubject<'_>,
) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (id, name, description, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects ORDER BY name OFFSET $1 LIMIT $2"
    ))
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM subjects").fetch_one(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateSubject,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subjects SET
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

/// Removes the subject and every dependent row, children first, within the
/// caller's transaction.
pub(crate) async fn delete_cascade(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    subject_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM quiz_attempts WHERE quiz_id IN (
            SELECT q.id FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            WHERE c.subject_id = $1
         )",
    )
    .bind(subject_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "DELETE FROM questions WHERE quiz_id IN (
            SELECT q.id FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            WHERE c.subject_id = $1
         )",
    )
    .bind(subject_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "DELETE FROM quizzes WHERE chapter_id IN (
            SELECT id FROM chapters WHERE subject_id = $1
         )",
    )
    .bind(subject_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM chapters WHERE subject_id = $1")
        .bind(subject_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(subject_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubjectQuizCountRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) quiz_count: i64,
}

/// Per-subject quiz totals; subjects without quizzes appear with a zero.
pub(crate) async fn quiz_counts(pool: &PgPool) -> Result<Vec<SubjectQuizCountRow>, sqlx::Error> {
    sqlx::query_as::<_, SubjectQuizCountRow>(
        "SELECT s.id,
                s.name,
                COUNT(q.id) AS quiz_count
         FROM subjects s
         LEFT JOIN chapters c ON c.subject_id = s.id
         LEFT JOIN quizzes q ON q.chapter_id = c.id
         GROUP BY s.id, s.name
         ORDER BY s.name",
    )
    .fetch_all(pool)
    .await
}
