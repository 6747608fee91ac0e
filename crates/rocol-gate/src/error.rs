use std::fmt;

/// Errors produced by the validation gate.
///
/// The three failure kinds carry every collected message, so one error value
/// reports all problems found by its stage.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Structural checks found errors.
    #[error("crate {object_id} failed structural validation:\n{}", .messages.join("\n"))]
    GraphLink {
        object_id: String,
        messages: Vec<String>,
    },

    /// The expectation workbook disagrees with the crate.
    #[error("metadata does not pass validation against {location}:\n{}", .messages.join("\n"))]
    ExpectationMismatch {
        location: String,
        messages: Vec<String>,
    },

    /// The mode definition reported errors.
    #[error("ro-crate-metadata does not pass mode validation:\n{}", .messages.join("\n"))]
    ModeViolation { messages: Vec<String> },

    /// The expectation workbook could not be opened.
    #[error("cannot read workbook {location}: {reason}")]
    Workbook { location: String, reason: String },

    /// The mode definition could neither be fetched nor read locally.
    #[error("cannot load mode definition {location}: {reason}")]
    ModeLoad { location: String, reason: String },
}

impl GateError {
    /// The individual messages of an aggregating error; a single entry for
    /// the others.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::GraphLink { messages, .. }
            | Self::ExpectationMismatch { messages, .. }
            | Self::ModeViolation { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl PartialEq for GateError {
    fn eq(&self, other: &Self) -> bool {
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for GateError {}

pub type GateResult<T> = Result<T, GateError>;
