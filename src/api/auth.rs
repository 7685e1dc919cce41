use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_password_len;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserLogin, UserRegister, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_password_len(&payload.password)?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    if repositories::users::exists_by_username(&mut *tx, &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing username"))?
        .is_some()
    {
        return Err(ApiError::Validation("Username already registered".to_string()));
    }

    if repositories::users::exists_by_email(&mut *tx, &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing email"))?
        .is_some()
    {
        return Err(ApiError::Validation("Email already registered".to_string()));
    }

    // The very first account becomes the administrator.
    let user_count = repositories::users::count_all(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let is_admin = user_count == 0;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            email: &payload.email,
            hashed_password,
            is_admin,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token, user))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = fetch_user_by_username(&state, &payload.username).await?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse::bearer(token, user)))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn fetch_user_by_username(state: &AppState, username: &str) -> Result<User, ApiError> {
    repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn first_registered_user_becomes_admin() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": "founder",
                    "email": "founder@example.com",
                    "password": "founder-pass"
                })),
            ))
            .await
            .expect("register first user");

        let status = response.status();
        let first = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {first}");
        assert_eq!(first["user"]["is_admin"], true);
        assert!(first["access_token"].as_str().is_some_and(|token| !token.is_empty()));

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": "second",
                    "email": "second@example.com",
                    "password": "second-pass"
                })),
            ))
            .await
            .expect("register second user");

        let status = response.status();
        let second = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {second}");
        assert_eq!(second["user"]["is_admin"], false);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let payload = json!({
            "username": "repeat",
            "email": "repeat@example.com",
            "password": "repeat-pass"
        });

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(payload.clone()),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(payload),
            ))
            .await
            .expect("register duplicate");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "response: {body}");
    }

    #[tokio::test]
    async fn login_roundtrip_and_me() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let user = test_support::insert_user(
            ctx.state.db(),
            "casual",
            "casual@example.com",
            "casual-pass",
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": "casual", "password": "casual-pass" })),
            ))
            .await
            .expect("login");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        let token = body["access_token"].as_str().expect("token").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/auth/me",
                Some(&token),
                None,
            ))
            .await
            .expect("me");

        let status = response.status();
        let me = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {me}");
        assert_eq!(me["id"], user.id.as_str());
        assert_eq!(me["username"], "casual");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        test_support::insert_user(ctx.state.db(), "victim", "victim@example.com", "victim-pass")
            .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": "victim", "password": "not-the-password" })),
            ))
            .await
            .expect("login");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
