use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("QUIZDESK_FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let username = &admin.first_admin_username;
    let user = repositories::users::find_by_username(state.db(), username).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let mut needs_update = false;

        let verified = security::verify_password(&admin.first_admin_password, &user.hashed_password)
            .unwrap_or(false);
        let hashed_password = if verified {
            user.hashed_password.clone()
        } else {
            needs_update = true;
            security::hash_password(&admin.first_admin_password)?
        };

        if !user.is_admin {
            needs_update = true;
        }

        if needs_update {
            sqlx::query(
                "UPDATE users
                 SET hashed_password = $1,
                     is_admin = TRUE,
                     updated_at = $2
                 WHERE id = $3",
            )
            .bind(hashed_password)
            .bind(now)
            .bind(user.id)
            .execute(state.db())
            .await?;

            tracing::info!("Updated bootstrap admin {username}");
        } else {
            tracing::info!("Bootstrap admin already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;

    sqlx::query(
        "INSERT INTO users (id, username, email, hashed_password, is_admin, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(username)
    .bind(&admin.first_admin_email)
    .bind(hashed_password)
    .bind(true)
    .bind(now)
    .bind(now)
    .execute(state.db())
    .await?;

    tracing::info!("Created bootstrap admin {username}");
    Ok(())
}
