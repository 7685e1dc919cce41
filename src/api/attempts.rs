use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{clamp_page, default_limit, PaginatedResponse};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::attempt::AttemptResponse;

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_attempts))
}

async fn list_attempts(
    Query(params): Query<ListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<AttemptResponse>>, ApiError> {
    let (skip, limit) = clamp_page(params.skip, params.limit);

    let rows = repositories::attempts::list_history_by_user(state.db(), &user.id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;
    let total_count = repositories::attempts::count_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(AttemptResponse::from_row).collect(),
        total_count,
        skip,
        limit,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn history_lists_only_own_attempts() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
        let student =
            test_support::insert_user(ctx.state.db(), "student", "student@example.com", "pass-123")
                .await;
        let student_token = test_support::bearer_token(&student.id, ctx.state.settings());
        let other =
            test_support::insert_user(ctx.state.db(), "other", "other@example.com", "pass-456")
                .await;
        let other_token = test_support::bearer_token(&other.id, ctx.state.settings());

        let subject_id = test_support::create_subject(&ctx, &admin_token, "Geography").await;
        let chapter_id =
            test_support::create_chapter(&ctx, &admin_token, &subject_id, "Capitals").await;
        let quiz = test_support::create_open_quiz(&ctx, &admin_token, &chapter_id).await;

        for token in [&student_token, &other_token] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    &format!("/api/v1/quizzes/{}/submit", quiz.id),
                    Some(token),
                    Some(json!({
                        "answers": [{ "question_id": quiz.question_ids[0], "answer": "a" }]
                    })),
                ))
                .await
                .expect("submit quiz");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/attempts",
                Some(&student_token),
                None,
            ))
            .await
            .expect("list attempts");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["total_count"], 1);

        let attempt = &body["items"][0];
        assert_eq!(attempt["quiz_id"], quiz.id.as_str());
        assert_eq!(attempt["quiz_title"], "Seeded quiz");
        assert_eq!(attempt["subject_name"], "Geography");
        assert_eq!(attempt["score"], 1);
        assert_eq!(attempt["total_questions"], quiz.question_ids.len() as i64);
    }

    #[tokio::test]
    async fn history_requires_authentication() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/attempts", None, None))
            .await
            .expect("list attempts without token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
