pub(crate) mod attempts;
pub(crate) mod chapters;
pub(crate) mod questions;
pub(crate) mod quizzes;
pub(crate) mod subjects;
pub(crate) mod users;
