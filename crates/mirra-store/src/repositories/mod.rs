//! Repositories — stateless query modules, every method takes `&Connection`.

pub mod broadcast_log;
pub mod counters;
pub mod documents;
