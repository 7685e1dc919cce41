use time::PrimitiveDateTime;

use crate::db::models::Quiz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Availability {
    NotYetOpen,
    Open,
    Closed,
}

impl Availability {
    pub(crate) fn refusal_reason(self) -> Option<&'static str> {
        match self {
            Availability::NotYetOpen => Some("Quiz is not open yet"),
            Availability::Closed => Some("Quiz has closed"),
            Availability::Open => None,
        }
    }
}

/// Both window bounds are inclusive.
pub(crate) fn classify(quiz: &Quiz, now: PrimitiveDateTime) -> Availability {
    if now < quiz.start_date {
        Availability::NotYetOpen
    } else if now > quiz.end_date {
        Availability::Closed
    } else {
        Availability::Open
    }
}

pub(crate) fn is_available(quiz: &Quiz, now: PrimitiveDateTime) -> bool {
    classify(quiz, now) == Availability::Open
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn quiz_with_window(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Quiz {
        Quiz {
            id: "quiz-1".to_string(),
            chapter_id: "chapter-1".to_string(),
            title: "Sample".to_string(),
            duration_minutes: 30,
            start_date: start,
            end_date: end,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn open_inside_window() {
        let quiz = quiz_with_window(datetime!(2026-01-10 09:00:00), datetime!(2026-01-10 10:00:00));
        assert!(is_available(&quiz, datetime!(2026-01-10 09:30:00)));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let quiz = quiz_with_window(datetime!(2026-01-10 09:00:00), datetime!(2026-01-10 10:00:00));
        assert!(is_available(&quiz, datetime!(2026-01-10 09:00:00)));
        assert!(is_available(&quiz, datetime!(2026-01-10 10:00:00)));
    }

    #[test]
    fn before_window_is_not_yet_open() {
        let quiz = quiz_with_window(datetime!(2026-01-10 09:00:00), datetime!(2026-01-10 10:00:00));
        let state = classify(&quiz, datetime!(2026-01-10 08:59:59));
        assert_eq!(state, Availability::NotYetOpen);
        assert!(state.refusal_reason().is_some());
    }

    #[test]
    fn after_window_is_closed() {
        let quiz = quiz_with_window(datetime!(2026-01-10 09:00:00), datetime!(2026-01-10 10:00:00));
        let state = classify(&quiz, datetime!(2026-01-10 10:00:01));
        assert_eq!(state, Availability::Closed);
        assert_eq!(state.refusal_reason(), Some("Quiz has closed"));
    }
}
