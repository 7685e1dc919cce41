use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::AnswerChoice;

const COLUMNS: &str = "\
    id, quiz_id, position, text, option_a, option_b, option_c, option_d, \
    correct_answer, created_at, updated_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) position: i32,
    pub(crate) text: &'a str,
    pub(crate) option_a: &'a str,
    pub(crate) option_b: &'a str,
    pub(crate) option_c: &'a str,
    pub(crate) option_d: &'a str,
    pub(crate) correct_answer: AnswerChoice,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateQuestion<'a> {
    pub(crate) text: &'a str,
    pub(crate) option_a: &'a str,
    pub(crate) option_b: &'a str,
    pub(crate) option_c: &'a str,
    pub(crate) option_d: &'a str,
    pub(crate) correct_answer: AnswerChoice,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, quiz_id, position, text, option_a, option_b, option_c, option_d,
            correct_answer, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.position)
    .bind(params.text)
    .bind(params.option_a)
    .bind(params.option_b)
    .bind(params.option_c)
    .bind(params.option_d)
    .bind(params.correct_answer)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE quiz_id = $1 ORDER BY position"
    ))
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateQuestion<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE questions SET
            text = $1,
            option_a = $2,
            option_b = $3,
            option_c = $4,
            option_d = $5,
            correct_answer = $6,
            updated_at = $7
         WHERE id = $8",
    )
    .bind(params.text)
    .bind(params.option_a)
    .bind(params.option_b)
    .bind(params.option_c)
    .bind(params.option_d)
    .bind(params.correct_answer)
    .bind(params.updated_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn max_position(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(position) FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}
