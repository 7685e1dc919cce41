use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::User;

const COLUMNS: &str = "id, username, email, hashed_password, is_admin, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_username(
    executor: impl sqlx::PgExecutor<'_>,
    username: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn exists_by_email(
    executor: impl sqlx::PgExecutor<'_>,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn count_all(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(executor).await
}

pub(crate) async fn count_non_admin(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = FALSE").fetch_one(pool).await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) is_admin: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, username, email, hashed_password, is_admin, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.is_admin)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct ListUsersFilter {
    pub(crate) is_admin: Option<bool>,
    pub(crate) username_prefix: Option<String>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &ListUsersFilter,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users WHERE TRUE"));

    if let Some(is_admin) = filter.is_admin {
        builder.push(" AND is_admin = ");
        builder.push_bind(is_admin);
    }

    if let Some(prefix) = &filter.username_prefix {
        builder.push(" AND username LIKE ");
        builder.push_bind(format!("{prefix}%"));
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(filter.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &ListUsersFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");

    if let Some(is_admin) = filter.is_admin {
        builder.push(" AND is_admin = ");
        builder.push_bind(is_admin);
    }

    if let Some(prefix) = &filter.username_prefix {
        builder.push(" AND username LIKE ");
        builder.push_bind(format!("{prefix}%"));
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
