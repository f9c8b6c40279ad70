use thiserror::Error;

use crate::options::{EngineKind, OptionStyle};

#[derive(Debug, Error)]
pub enum GreeksError {
    #[error("Unknown instrument: no trading-day convention for '{name}'")]
    UnknownInstrument { name: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid term: {field}: {reason}")]
    InvalidTerm { field: String, reason: String },

    #[error("Invalid lattice parameters: risk-neutral probability {probability} outside (0, 1)")]
    InvalidLatticeParameters { probability: f64 },

    #[error("Unsupported style: the {engine} engine cannot value {style} options")]
    UnsupportedStyle {
        engine: EngineKind,
        style: OptionStyle,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl GreeksError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        GreeksError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_term(field: &str, reason: impl Into<String>) -> Self {
        GreeksError::InvalidTerm {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GreeksError {
    fn from(e: serde_json::Error) -> Self {
        GreeksError::SerializationError(e.to_string())
    }
}
