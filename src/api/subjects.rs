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
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Subject;
use crate::repositories;
use crate::schemas::chapter::{ChapterCreate, ChapterResponse};
use crate::schemas::subject::{SubjectCreate, SubjectResponse, SubjectUpdate};

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route(
            "/:subject_id",
            get(get_subject).patch(update_subject).delete(delete_subject),
        )
        .route("/:subject_id/chapters", get(list_chapters).post(create_chapter))
}

async fn create_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

    let now = primitive_now_utc();
    let subject = repositories::subjects::create(
        state.db(),
        repositories::subjects::CreateSubject {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            description: payload.description.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    Ok((StatusCode::CREATED, Json(SubjectResponse::from_db(subject))))
}

async fn list_subjects(
    Query(params): Query<ListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<SubjectResponse>>, ApiError> {
    let (skip, limit) = clamp_page(params.skip, params.limit);

    let subjects = repositories::subjects::list(state.db(), skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;
    let total_count = repositories::subjects::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count subjects"))?;

    Ok(Json(PaginatedResponse {
        items: subjects.into_iter().map(SubjectResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn get_subject(
    Path(subject_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubjectResponse>, ApiError> {
    let subject = fetch_subject(&state, &subject_id).await?;
    Ok(Json(SubjectResponse::from_db(subject)))
}

async fn update_subject(
    Path(subject_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SubjectUpdate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    fetch_subject(&state, &subject_id).await?;

    repositories::subjects::update(
        state.db(),
        &subject_id,
        repositories::subjects::UpdateSubject {
            name: payload.name,
            description: payload.description,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update subject"))?;

    let updated = fetch_subject(&state, &subject_id).await?;
    Ok(Json(SubjectResponse::from_db(updated)))
}

async fn delete_subject(
    Path(subject_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    fetch_subject(&state, &subject_id).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::subjects::delete_cascade(&mut tx, &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete subject"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.id,
        subject_id = %subject_id,
        action = "subject_delete",
        "Subject deleted with all dependents"
    );

    Ok(StatusCode::OK)
}

async fn create_chapter(
    Path(subject_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ChapterCreate>,
) -> Result<(StatusCode, Json<ChapterResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    fetch_subject(&state, &subject_id).await?;

    let now = primitive_now_utc();
    let chapter = repositories::chapters::create(
        state.db(),
        repositories::chapters::CreateChapter {
            id: &Uuid::new_v4().to_string(),
            subject_id: &subject_id,
            name: &payload.name,
            description: payload.description.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create chapter"))?;

    Ok((StatusCode::CREATED, Json(ChapterResponse::from_db(chapter))))
}

async fn list_chapters(
    Path(subject_id): Path<String>,
    Query(params): Query<ListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ChapterResponse>>, ApiError> {
    fetch_subject(&state, &subject_id).await?;
    let (skip, limit) = clamp_page(params.skip, params.limit);

    let chapters = repositories::chapters::list_by_subject(state.db(), &subject_id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list chapters"))?;
    let total_count = repositories::chapters::count_by_subject(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count chapters"))?;

    Ok(Json(PaginatedResponse {
        items: chapters.into_iter().map(ChapterResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn fetch_subject(state: &AppState, subject_id: &str) -> Result<Subject, ApiError> {
    repositories::subjects::find_by_id(state.db(), subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))
}
