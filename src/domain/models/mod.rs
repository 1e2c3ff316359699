pub mod user;
pub mod workload;
pub mod auth;

use thiserror::Error;

/// Raised when a stored or submitted string does not name a known enum member.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}
