//! Error types surfaced by the planning pipeline.
//!
//! Placement failures are not errors; they end up in a plan's failed list.
//! What lands here is input that cannot be turned into a valid model, a
//! dangerous-goods collaborator that could not answer, or a worker that died.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dangerous_goods::CollaboratorError;
use crate::model::ValidationError;

/// Errors returned while assembling load plans.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A record could not be converted into a valid item or container.
    #[error("invalid input for {context}: {source}")]
    InvalidInput {
        context: String,
        #[source]
        source: ValidationError,
    },
    /// An item is flagged as dangerous goods but carries no catalog entry.
    #[error("item '{item_id}' is flagged as dangerous goods but has no catalog entry")]
    MissingDangerousGoodEntry { item_id: String },
    /// Two consignment items share an id, so placements cannot be traced back.
    #[error("item id '{item_id}' appears more than once")]
    DuplicateItemId { item_id: String },
    /// The compatibility collaborator failed; the plan has no DG verdict.
    #[error("dangerous goods compatibility check failed: {0}")]
    Collaborator(#[from] CollaboratorError),
    /// A parallel planning worker panicked or was cancelled.
    #[error("planning worker failed: {0}")]
    Worker(String),
}

impl PlanError {
    pub(crate) fn invalid_input(context: impl Into<String>, source: ValidationError) -> Self {
        PlanError::InvalidInput {
            context: context.into(),
            source,
        }
    }

    /// Short, stable identifier for reports and logs.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::InvalidInput { .. } => "invalid_input",
            PlanError::MissingDangerousGoodEntry { .. } => "missing_dangerous_good_entry",
            PlanError::DuplicateItemId { .. } => "duplicate_item_id",
            PlanError::Collaborator(_) => "collaborator_failure",
            PlanError::Worker(_) => "worker_failure",
        }
    }
}

/// Errors while loading JSON input files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_names_context_and_cause() {
        let err = PlanError::invalid_input(
            "consignment 'C-1'",
            ValidationError::InvalidWeight("Weight must not be negative, got: -1".to_string()),
        );
        assert_eq!(err.code(), "invalid_input");
        let message = err.to_string();
        assert!(message.contains("consignment 'C-1'"));
        assert!(message.contains("must not be negative"));
    }

    #[test]
    fn collaborator_errors_convert() {
        let err: PlanError = CollaboratorError::Unavailable("catalog offline".to_string()).into();
        assert_eq!(err.code(), "collaborator_failure");
        assert!(err.to_string().contains("catalog offline"));
    }
}
