pub(crate) mod attempts;
pub(crate) mod auth;
pub(crate) mod chapters;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod quizzes;
pub(crate) mod router;
pub(crate) mod stats;
pub(crate) mod subjects;
pub(crate) mod users;
pub(crate) mod validation;
