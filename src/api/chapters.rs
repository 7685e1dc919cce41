use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{clamp_page, default_limit, PaginatedResponse};
use crate::api::quizzes::insert_questions;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Chapter;
use crate::repositories;
use crate::schemas::chapter::{ChapterResponse, ChapterUpdate};
use crate::schemas::quiz::{QuizCreate, QuizResponse, QuizSummaryResponse};
use crate::services::authoring;

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:chapter_id",
            get(get_chapter).patch(update_chapter).delete(delete_chapter),
        )
        .route("/:chapter_id/quizzes", get(list_quizzes).post(create_quiz))
}

async fn get_chapter(
    Path(chapter_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ChapterResponse>, ApiError> {
    let chapter = fetch_chapter(&state, &chapter_id).await?;
    Ok(Json(ChapterResponse::from_db(chapter)))
}

async fn update_chapter(
    Path(chapter_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ChapterUpdate>,
) -> Result<Json<ChapterResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    fetch_chapter(&state, &chapter_id).await?;

    repositories::chapters::update(
        state.db(),
        &chapter_id,
        repositories::chapters::UpdateChapter {
            name: payload.name,
            description: payload.description,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update chapter"))?;

    let updated = fetch_chapter(&state, &chapter_id).await?;
    Ok(Json(ChapterResponse::from_db(updated)))
}

async fn delete_chapter(
    Path(chapter_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    fetch_chapter(&state, &chapter_id).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::chapters::delete_cascade(&mut tx, &chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete chapter"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.id,
        chapter_id = %chapter_id,
        action = "chapter_delete",
        "Chapter deleted with all dependents"
    );

    Ok(StatusCode::OK)
}

async fn create_quiz(
    Path(chapter_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    fetch_chapter(&state, &chapter_id).await?;

    let (start_date, end_date) =
        authoring::resolve_window(&payload.window, payload.duration_minutes)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    let drafts = authoring::retain_complete(payload.questions);

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let quiz = repositories::quizzes::create(
        &mut *tx,
        repositories::quizzes::CreateQuiz {
            id: &Uuid::new_v4().to_string(),
            chapter_id: &chapter_id,
            title: &payload.title,
            duration_minutes: payload.duration_minutes,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    let questions = insert_questions(&mut tx, &quiz.id, drafts, 0).await?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.id,
        quiz_id = %quiz.id,
        question_count = questions.len(),
        action = "quiz_create",
        "Quiz created"
    );

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz, questions))))
}

async fn list_quizzes(
    Path(chapter_id): Path<String>,
    Query(params): Query<ListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<QuizSummaryResponse>>, ApiError> {
    fetch_chapter(&state, &chapter_id).await?;
    let (skip, limit) = clamp_page(params.skip, params.limit);

    let quizzes = repositories::quizzes::list_by_chapter(state.db(), &chapter_id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;
    let total_count = repositories::quizzes::count_by_chapter(state.db(), &chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count quizzes"))?;

    Ok(Json(PaginatedResponse {
        items: quizzes.into_iter().map(QuizSummaryResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn fetch_chapter(state: &AppState, chapter_id: &str) -> Result<Chapter, ApiError> {
    repositories::chapters::find_by_id(state.db(), chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch chapter"))?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn chapter_crud_roundtrip() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let token = test_support::bearer_token(&admin.id, ctx.state.settings());

        let subject_id = test_support::create_subject(&ctx, &token, "Physics").await;
        let chapter_id =
            test_support::create_chapter(&ctx, &token, &subject_id, "Mechanics").await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PATCH,
                &format!("/api/v1/chapters/{chapter_id}"),
                Some(&token),
                Some(json!({ "description": "Forces and motion" })),
            ))
            .await
            .expect("update chapter");

        let status = response.status();
        let updated = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {updated}");
        assert_eq!(updated["name"], "Mechanics");
        assert_eq!(updated["description"], "Forces and motion");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/subjects/{subject_id}/chapters"),
                Some(&token),
                None,
            ))
            .await
            .expect("list chapters");

        let status = response.status();
        let list = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {list}");
        assert_eq!(list["total_count"], 1);
        assert_eq!(list["items"][0]["subject_id"], subject_id.as_str());
    }

    #[tokio::test]
    async fn deleting_chapter_keeps_the_subject() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let token = test_support::bearer_token(&admin.id, ctx.state.settings());

        let subject_id = test_support::create_subject(&ctx, &token, "Chemistry").await;
        let chapter_id =
            test_support::create_chapter(&ctx, &token, &subject_id, "Stoichiometry").await;
        test_support::create_open_quiz(&ctx, &token, &chapter_id).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::DELETE,
                &format!("/api/v1/chapters/{chapter_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("delete chapter");
        assert_eq!(response.status(), StatusCode::OK);

        for table in ["chapters", "quizzes", "questions"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(ctx.state.db())
                .await
                .expect("count rows");
            assert_eq!(count, 0, "{table} still has rows");
        }

        let subjects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
            .fetch_one(ctx.state.db())
            .await
            .expect("count subjects");
        assert_eq!(subjects, 1);
    }

    #[tokio::test]
    async fn blank_question_drafts_are_dropped_on_create() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let token = test_support::bearer_token(&admin.id, ctx.state.settings());

        let subject_id = test_support::create_subject(&ctx, &token, "Biology").await;
        let chapter_id = test_support::create_chapter(&ctx, &token, &subject_id, "Cells").await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/chapters/{chapter_id}/quizzes"),
                Some(&token),
                Some(json!({
                    "title": "Cell structure",
                    "duration_minutes": 30,
                    "window": { "mode": "all_day", "date": "2030-06-01" },
                    "questions": [
                        {
                            "text": "What bounds the cell?",
                            "option_a": "Membrane",
                            "option_b": "Wall",
                            "option_c": "Capsid",
                            "option_d": "Vacuole",
                            "correct_answer": "a"
                        },
                        {
                            "text": "   ",
                            "option_a": "x",
                            "option_b": "y",
                            "option_c": "z",
                            "option_d": "w",
                            "correct_answer": "b"
                        }
                    ]
                })),
            ))
            .await
            .expect("create quiz");

        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        assert_eq!(created["questions"].as_array().expect("questions").len(), 1);
        assert_eq!(created["questions"][0]["position"], 0);
        assert_eq!(created["start_date"], "2030-06-01T00:00:00Z");
        assert_eq!(created["end_date"], "2030-06-01T23:59:59Z");
    }

    #[tokio::test]
    async fn quiz_with_zero_duration_is_rejected() {
        let Some(ctx) = test_support::setup_test_context().await else { return };

        let admin =
            test_support::insert_admin(ctx.state.db(), "admin", "admin@example.com", "admin-pass")
                .await;
        let token = test_support::bearer_token(&admin.id, ctx.state.settings());

        let subject_id = test_support::create_subject(&ctx, &token, "Biology").await;
        let chapter_id = test_support::create_chapter(&ctx, &token, &subject_id, "Cells").await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/chapters/{chapter_id}/quizzes"),
                Some(&token),
                Some(json!({
                    "title": "Bad window",
                    "duration_minutes": 0,
                    "window": { "mode": "timed", "start_date": "2030-06-01T10:00" },
                    "questions": []
                })),
            ))
            .await
            .expect("create quiz");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(ctx.state.db())
            .await
            .expect("count quizzes");
        assert_eq!(count, 0);
    }
}
