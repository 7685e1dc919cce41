use std::collections::HashMap;

use crate::db::models::Question;
use crate::db::types::AnswerChoice;

/// Parses a submitted answer leniently: surrounding whitespace and letter
/// case are ignored, anything else is not a choice.
pub(crate) fn parse_choice(raw: &str) -> Option<AnswerChoice> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "a" => Some(AnswerChoice::A),
        "b" => Some(AnswerChoice::B),
        "c" => Some(AnswerChoice::C),
        "d" => Some(AnswerChoice::D),
        _ => None,
    }
}

/// Grades a submission against the authoritative question set.
///
/// Returns `(score, total)`. Missing or unparseable answers count as
/// incorrect; answers for question ids outside the set are ignored.
pub(crate) fn grade(questions: &[Question], answers: &HashMap<String, String>) -> (i32, i32) {
    let total = questions.len() as i32;
    let mut score = 0;

    for question in questions {
        let submitted = answers.get(&question.id).and_then(|raw| parse_choice(raw));
        if submitted == Some(question.correct_answer) {
            score += 1;
        }
    }

    (score, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn question(id: &str, correct: AnswerChoice) -> Question {
        let now = datetime!(2026-01-01 00:00:00);
        Question {
            id: id.to_string(),
            quiz_id: "quiz-1".to_string(),
            position: 0,
            text: "q".to_string(),
            option_a: "a".to_string(),
            option_b: "b".to_string(),
            option_c: "c".to_string(),
            option_d: "d".to_string(),
            correct_answer: correct,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn parse_choice_is_lenient() {
        assert_eq!(parse_choice(" B "), Some(AnswerChoice::B));
        assert_eq!(parse_choice("d"), Some(AnswerChoice::D));
        assert_eq!(parse_choice("x"), None);
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("ab"), None);
    }

    #[test]
    fn grade_counts_exact_matches_only() {
        let questions = vec![
            question("q-1", AnswerChoice::A),
            question("q-2", AnswerChoice::B),
            question("q-3", AnswerChoice::C),
        ];
        let answers = HashMap::from([
            ("q-1".to_string(), "a".to_string()),
            ("q-2".to_string(), "x".to_string()),
            ("q-3".to_string(), "C".to_string()),
        ]);

        assert_eq!(grade(&questions, &answers), (2, 3));
    }

    #[test]
    fn grade_ignores_unknown_question_ids() {
        let questions = vec![question("q-1", AnswerChoice::A)];
        let answers = HashMap::from([
            ("q-1".to_string(), "a".to_string()),
            ("ghost".to_string(), "b".to_string()),
        ]);

        assert_eq!(grade(&questions, &answers), (1, 1));
    }

    #[test]
    fn grade_treats_missing_answers_as_incorrect() {
        let questions = vec![question("q-1", AnswerChoice::A), question("q-2", AnswerChoice::B)];
        let answers = HashMap::from([("q-1".to_string(), "a".to_string())]);

        assert_eq!(grade(&questions, &answers), (1, 2));
    }

    #[test]
    fn grade_of_empty_quiz_is_zero_of_zero() {
        assert_eq!(grade(&[], &HashMap::new()), (0, 0));
    }
}
