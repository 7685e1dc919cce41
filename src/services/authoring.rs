use std::collections::HashSet;

use anyhow::{anyhow, Result};
use time::{macros::time, Duration, PrimitiveDateTime};

use crate::core::time::to_primitive_utc;
use crate::db::models::Question;
use crate::schemas::quiz::{QuestionDraft, QuizWindow};

/// Drops drafts whose question text is blank after trimming, keeping the
/// order of the survivors. Incomplete drafts are not an error.
pub(crate) fn retain_complete(drafts: Vec<QuestionDraft>) -> Vec<QuestionDraft> {
    drafts.into_iter().filter(|draft| !draft.text.trim().is_empty()).collect()
}

/// Computes the stored availability window.
///
/// `Timed` derives the end from the duration; `AllDay` spans the whole
/// calendar day and keeps the duration as metadata only.
pub(crate) fn resolve_window(
    window: &QuizWindow,
    duration_minutes: i32,
) -> Result<(PrimitiveDateTime, PrimitiveDateTime)> {
    let (start, end) = match window {
        QuizWindow::Timed { start_date } => {
            let start = to_primitive_utc(*start_date);
            (start, start + Duration::minutes(duration_minutes as i64))
        }
        QuizWindow::AllDay { date } => (
            PrimitiveDateTime::new(*date, time!(0:00:00)),
            PrimitiveDateTime::new(*date, time!(23:59:59)),
        ),
    };

    if end <= start {
        return Err(anyhow!("quiz window must end after it starts"));
    }

    Ok((start, end))
}

pub(crate) struct QuestionDiff {
    pub(crate) updates: Vec<(String, QuestionDraft)>,
    pub(crate) inserts: Vec<QuestionDraft>,
}

/// Splits drafts into in-place updates (existing id owned by the quiz) and
/// appends. A draft pointing at a question of another quiz is treated as new,
/// never re-parented. Questions absent from `drafts` are left alone.
pub(crate) fn split_for_update(drafts: Vec<QuestionDraft>, existing: &[Question]) -> QuestionDiff {
    let owned: HashSet<&str> = existing.iter().map(|question| question.id.as_str()).collect();

    let mut updates = Vec::new();
    let mut inserts = Vec::new();

    for draft in drafts {
        let owned_id =
            draft.existing_id.as_deref().filter(|id| owned.contains(id)).map(str::to_string);
        match owned_id {
            Some(id) => updates.push((id, draft)),
            None => inserts.push(draft),
        }
    }

    QuestionDiff { updates, inserts }
}
