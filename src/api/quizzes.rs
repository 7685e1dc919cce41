use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::config::RetakePolicy;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Question, Quiz};
use crate::repositories;
use crate::schemas::quiz::{
    QuestionDraft, QuizResponse, QuizSubmission, QuizUpdate, SubmissionResult,
    TakeQuestionResponse, TakeQuizResponse,
};
use crate::services::{authoring, availability, scoring};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:quiz_id", get(get_quiz).patch(update_quiz).delete(delete_quiz))
        .route("/:quiz_id/take", get(take_quiz))
        .route("/:quiz_id/submit", post(submit_quiz))
        .route("/:quiz_id/questions/:question_id", delete(delete_question))
}

async fn get_quiz(
    Path(quiz_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    let questions = repositories::questions::list_by_quiz(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    Ok(Json(QuizResponse::from_db(quiz, questions)))
}

async fn update_quiz(
    Path(quiz_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let quiz = fetch_quiz(&state, &quiz_id).await?;

    // A new window is resolved against the duration that will be in effect.
    let effective_duration = payload.duration_minutes.unwrap_or(quiz.duration_minutes);
    let window = match payload.window.as_ref() {
        Some(window) => Some(
            authoring::resolve_window(window, effective_duration)
                .map_err(|e| ApiError::Validation(e.to_string()))?,
        ),
        None => None,
    };

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::quizzes::update(
        &mut *tx,
        &quiz.id,
        repositories::quizzes::UpdateQuiz {
            title: payload.title,
            duration_minutes: payload.duration_minutes,
            start_date: window.map(|(start, _)| start),
            end_date: window.map(|(_, end)| end),
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?;

    if let Some(drafts) = payload.questions {
        let drafts = authoring::retain_complete(drafts);
        let existing = repositories::questions::list_by_quiz(&mut *tx, &quiz.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
        let diff = authoring::split_for_update(drafts, &existing);

        for (question_id, draft) in diff.updates {
            repositories::questions::update(
                &mut *tx,
                &question_id,
                repositories::questions::UpdateQuestion {
                    text: &draft.text,
                    option_a: &draft.option_a,
                    option_b: &draft.option_b,
                    option_c: &draft.option_c,
                    option_d: &draft.option_d,
                    correct_answer: draft.correct_answer,
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update question"))?;
        }

        let next_position = repositories::questions::max_position(&mut *tx, &quiz.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch question positions"))?
            .map_or(0, |max| max + 1);
        insert_questions(&mut tx, &quiz.id, diff.inserts, next_position).await?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(admin_id = %admin.id, quiz_id = %quiz.id, action = "quiz_update", "Quiz updated");

    let updated = fetch_quiz(&state, &quiz_id).await?;
    let questions = repositories::questions::list_by_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    Ok(Json(QuizResponse::from_db(updated, questions)))
}

async fn delete_quiz(
    Path(quiz_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    fetch_quiz(&state, &quiz_id).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::quizzes::delete_cascade(&mut tx, &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.id,
        quiz_id = %quiz_id,
        action = "quiz_delete",
        "Quiz deleted with questions and attempts"
    );

    Ok(StatusCode::OK)
}

async fn delete_question(
    Path((quiz_id, question_id)): Path<(String, String)>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if question.quiz_id != quiz_id {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    tracing::info!(
        admin_id = %admin.id,
        quiz_id = %quiz_id,
        question_id = %question_id,
        action = "question_delete",
        "Question deleted"
    );

    Ok(StatusCode::OK)
}

async fn take_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TakeQuizResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;

    if let Some(reason) = availability::classify(&quiz, primitive_now_utc()).refusal_reason() {
        return Err(ApiError::Forbidden(reason));
    }

    let questions = repositories::questions::list_by_quiz(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(TakeQuizResponse {
        id: quiz.id,
        title: quiz.title,
        duration_minutes: quiz.duration_minutes,
        start_date: format_primitive(quiz.start_date),
        end_date: format_primitive(quiz.end_date),
        questions: questions.into_iter().map(TakeQuestionResponse::from_db).collect(),
    }))
}

async fn submit_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizSubmission>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;

    let now = primitive_now_utc();
    if let Some(reason) = availability::classify(&quiz, now).refusal_reason() {
        return Err(ApiError::Forbidden(reason));
    }

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    if state.settings().quiz().retake_policy == RetakePolicy::Single {
        let attempts = repositories::attempts::count_by_user_and_quiz(&mut *tx, &user.id, &quiz.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
        if attempts > 0 {
            return Err(ApiError::Conflict("Quiz has already been attempted".to_string()));
        }
    }

    let questions = repositories::questions::list_by_quiz(&mut *tx, &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    // Later entries for the same question win.
    let answers: HashMap<String, String> = payload
        .answers
        .into_iter()
        .map(|entry| (entry.question_id, entry.answer))
        .collect();

    let (score, total_questions) = scoring::grade(&questions, &answers);

    let attempt = repositories::attempts::create(
        &mut *tx,
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            quiz_id: &quiz.id,
            score,
            completed_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record attempt"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        user_id = %user.id,
        quiz_id = %quiz.id,
        score,
        total_questions,
        action = "quiz_submit",
        "Attempt recorded"
    );

    Ok(Json(SubmissionResult { attempt_id: attempt.id, score, total_questions }))
}

pub(crate) async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    quiz_id: &str,
    drafts: Vec<QuestionDraft>,
    start_position: i32,
) -> Result<Vec<Question>, ApiError> {
    let now = primitive_now_utc();
    let mut questions = Vec::with_capacity(drafts.len());

    for (offset, draft) in drafts.into_iter().enumerate() {
        let question = repositories::questions::create(
            &mut **tx,
            repositories::questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                quiz_id,
                position: start_position + offset as i32,
                text: &draft.text,
                option_a: &draft.option_a,
                option_b: &draft.option_b,
                option_c: &draft.option_c,
                option_d: &draft.option_d,
                correct_answer: draft.correct_answer,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
        questions.push(question);
    }

    Ok(questions)
}

async fn fetch_quiz(state: &AppState, quiz_id: &str) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}
