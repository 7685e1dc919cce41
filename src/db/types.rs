use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "answerchoice", rename_all = "lowercase")]
pub(crate) enum AnswerChoice {
    A,
    B,
    C,
    D,
}

impl AnswerChoice {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AnswerChoice::A => "a",
            AnswerChoice::B => "b",
            AnswerChoice::C => "c",
            AnswerChoice::D => "d",
        }
    }
}
