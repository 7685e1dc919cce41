use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{Question, Quiz};
use crate::db::types::AnswerChoice;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuestionDraft {
    #[serde(default)]
    #[serde(alias = "existingId")]
    pub(crate) existing_id: Option<String>,
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "optionA")]
    pub(crate) option_a: String,
    #[serde(default)]
    #[serde(alias = "optionB")]
    pub(crate) option_b: String,
    #[serde(default)]
    #[serde(alias = "optionC")]
    pub(crate) option_c: String,
    #[serde(default)]
    #[serde(alias = "optionD")]
    pub(crate) option_d: String,
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: AnswerChoice,
}

/// Availability window requested by the author. `timed` derives the end from
/// the quiz duration; `all_day` covers one calendar date.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub(crate) enum QuizWindow {
    Timed {
        #[serde(alias = "startDate")]
        #[serde(deserialize_with = "deserialize_offset_datetime_flexible")]
        start_date: OffsetDateTime,
    },
    AllDay {
        #[serde(deserialize_with = "deserialize_calendar_date")]
        date: Date,
    },
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    pub(crate) window: QuizWindow,
    #[serde(default)]
    pub(crate) questions: Vec<QuestionDraft>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    pub(crate) window: Option<QuizWindow>,
    #[serde(default)]
    pub(crate) questions: Option<Vec<QuestionDraft>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) position: i32,
    pub(crate) text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) correct_answer: AnswerChoice,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            quiz_id: question.quiz_id,
            position: question.position,
            text: question.text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
            correct_answer: question.correct_answer,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz, questions: Vec<Question>) -> Self {
        Self {
            id: quiz.id,
            chapter_id: quiz.chapter_id,
            title: quiz.title,
            duration_minutes: quiz.duration_minutes,
            start_date: format_primitive(quiz.start_date),
            end_date: format_primitive(quiz.end_date),
            created_at: format_primitive(quiz.created_at),
            updated_at: format_primitive(quiz.updated_at),
            questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizSummaryResponse {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
}

impl QuizSummaryResponse {
    pub(crate) fn from_db(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            chapter_id: quiz.chapter_id,
            title: quiz.title,
            duration_minutes: quiz.duration_minutes,
            start_date: format_primitive(quiz.start_date),
            end_date: format_primitive(quiz.end_date),
        }
    }
}

/// Question sheet handed to a taker; the correct answer never leaves the
/// server on this path.
#[derive(Debug, Serialize)]
pub(crate) struct TakeQuestionResponse {
    pub(crate) id: String,
    pub(crate) position: i32,
    pub(crate) text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
}

impl TakeQuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            position: question.position,
            text: question.text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TakeQuizResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) questions: Vec<TakeQuestionResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerSubmission {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default)]
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizSubmission {
    #[serde(default)]
    pub(crate) answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResult {
    pub(crate) attempt_id: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // Frontend's datetime-local often sends without timezone.
    if raw.len() == 16 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}:00Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if raw.len() == 19 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    // Fallback for explicit format "YYYY-MM-DDTHH:MM[:SS]"
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_offset_datetime_flexible<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_offset_datetime_flexible(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}

fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Date::parse(&raw, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| D::Error::custom(format!("invalid date: {raw}")))
}
