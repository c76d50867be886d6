//! API models for request and response payloads

pub mod analytics;
pub mod employee;
pub mod ml;
