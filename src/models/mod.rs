//! Core data models for the league.
//!
//! Every entity deserializes through a raw row type and is validated on
//! construction, so malformed rows are rejected instead of propagated.

mod activity;
mod ids;
mod participant;
mod season;
mod segment;
mod window;

pub use activity::*;
pub use ids::*;
pub use participant::*;
pub use season::*;
pub use segment::*;
pub use window::*;

use thiserror::Error;

/// Errors raised when building an entity from raw values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Empty time window: {start} is not before {end}")]
    EmptyWindow { start: String, end: String },

    #[error("Inconsistent row: {0}")]
    Mismatch(String),
}
