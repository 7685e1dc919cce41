use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::attempt::AttemptResponse;
use crate::schemas::stats::{
    AdminStatsResponse, SubjectAttemptCount, SubjectQuizCount, UserStatsResponse,
};
use crate::services::reporting;

const RECENT_ATTEMPTS: i64 = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/admin", get(admin_stats)).route("/me", get(my_stats))
}

async fn admin_stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminStatsResponse>, ApiError> {
    let total_users = repositories::users::count_non_admin(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let active_quizzes = repositories::quizzes::count_open_at(state.db(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count open quizzes"))?;
    let completed_attempts = repositories::attempts::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    let avg_score = repositories::attempts::average_score(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to average scores"))?;
    let subjects = repositories::subjects::quiz_counts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count quizzes per subject"))?;

    Ok(Json(AdminStatsResponse {
        total_users,
        active_quizzes,
        completed_attempts,
        avg_score,
        subjects: subjects
            .into_iter()
            .map(|row| SubjectQuizCount { id: row.id, name: row.name, quiz_count: row.quiz_count })
            .collect(),
    }))
}

async fn my_stats(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    let recent =
        repositories::attempts::list_history_by_user(state.db(), &user.id, 0, RECENT_ATTEMPTS)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list recent attempts"))?;
    let subject_counts = repositories::attempts::subject_counts_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts per subject"))?;
    let completions = repositories::attempts::completion_times_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch completion times"))?;

    Ok(Json(UserStatsResponse {
        recent_attempts: recent.into_iter().map(AttemptResponse::from_row).collect(),
        subject_attempts: subject_counts
            .into_iter()
            .map(|(name, attempt_count)| SubjectAttemptCount { name, attempt_count })
            .collect(),
        monthly_attempts: reporting::month_histogram(&completions),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn admin_stats_on_a_fresh_database_are_all_zero() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let token = test_support::bearer_token(&admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/stats/admin",
                Some(&token),
                None,
            ))
            .await
            .expect("admin stats");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["total_users"], 0);
        assert_eq!(body["active_quizzes"], 0);
        assert_eq!(body["completed_attempts"], 0);
        assert_eq!(body["avg_score"], 0.0);
        assert_eq!(body["subjects"].as_array().expect("subjects").len(), 0);
    }

    #[tokio::test]
    async fn admin_stats_count_subjects_even_without_quizzes() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
        let student =
            test_support::insert_user(ctx.state.db(), "student", "student@example.com", "pass-123")
                .await;
        let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

        let with_quiz = test_support::create_subject(&ctx, &admin_token, "Math").await;
        let chapter_id =
            test_support::create_chapter(&ctx, &admin_token, &with_quiz, "Algebra").await;
        let quiz = test_support::create_open_quiz(&ctx, &admin_token, &chapter_id).await;
        test_support::create_subject(&ctx, &admin_token, "Empty subject").await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/quizzes/{}/submit", quiz.id),
                Some(&student_token),
                Some(json!({
                    "answers": [{ "question_id": quiz.question_ids[0], "answer": "a" }]
                })),
            ))
            .await
            .expect("submit quiz");
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/stats/admin",
                Some(&admin_token),
                None,
            ))
            .await
            .expect("admin stats");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["total_users"], 1);
        assert_eq!(body["active_quizzes"], 1);
        assert_eq!(body["completed_attempts"], 1);
        assert_eq!(body["avg_score"], 1.0);

        let subjects = body["subjects"].as_array().expect("subjects");
        assert_eq!(subjects.len(), 2);
        let empty = subjects
            .iter()
            .find(|s| s["name"] == "Empty subject")
            .expect("empty subject present");
        assert_eq!(empty["quiz_count"], 0);
    }

    #[tokio::test]
    async fn my_stats_bucket_attempts_by_subject_and_month() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
        let student =
            test_support::insert_user(ctx.state.db(), "student", "student@example.com", "pass-123")
                .await;
        let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

        let subject_id = test_support::create_subject(&ctx, &admin_token, "Geography").await;
        let chapter_id =
            test_support::create_chapter(&ctx, &admin_token, &subject_id, "Capitals").await;
        let quiz = test_support::create_open_quiz(&ctx, &admin_token, &chapter_id).await;

        for _ in 0..2 {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    &format!("/api/v1/quizzes/{}/submit", quiz.id),
                    Some(&student_token),
                    Some(json!({ "answers": [] })),
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
                "/api/v1/stats/me",
                Some(&student_token),
                None,
            ))
            .await
            .expect("my stats");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");

        assert_eq!(body["recent_attempts"].as_array().expect("recent").len(), 2);
        assert_eq!(body["subject_attempts"][0]["name"], "Geography");
        assert_eq!(body["subject_attempts"][0]["attempt_count"], 2);

        let monthly = body["monthly_attempts"].as_array().expect("monthly");
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0]["count"], 2);
    }

    #[tokio::test]
    async fn admin_stats_require_admin() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let student =
            test_support::insert_user(ctx.state.db(), "student", "student@example.com", "pass-123")
                .await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/stats/admin",
                Some(&token),
                None,
            ))
            .await
            .expect("admin stats as student");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
