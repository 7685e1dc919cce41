pub(crate) mod authoring;
pub(crate) mod availability;
pub(crate) mod reporting;
pub(crate) mod scoring;
