//! Command handlers grouped by concern.

pub(crate) mod auth;
pub(crate) mod browse;
pub(crate) mod catalog;
pub(crate) mod favorites;
pub(crate) mod matching;
