//! Pipeline error taxonomy
//!
//! Only two conditions fail a contract-generation call outright: no
//! participant resolved at all, and a terminal template/render error. Every
//! other failure is accumulated as a warning on the response envelope.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every participant group entry failed resolution.
    #[error("no participant could be resolved")]
    NoParticipantsResolved {
        errors: Vec<ParticipantError>,
        summary: ResolutionSummary,
    },

    /// No usable document template exists.
    #[error("document template not found: {0}")]
    TemplateNotFound(String),

    /// The template engine rejected the render (unresolved placeholder,
    /// syntax error). Partially written artifacts are cleaned up first.
    #[error("document render failed: {0}")]
    RenderFailed(String),

    /// Storage failure on a step the pipeline cannot continue without
    /// (contract row insert, document-info update).
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// One participant that could not be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantError {
    pub role: String,
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// Counters accumulated by the participant resolver.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionSummary {
    pub total: usize,
    pub successful: usize,
    pub existing: usize,
    pub reused: usize,
    pub errors: usize,
}

/// A sub-entity insert that failed; the batch continued past it.
#[derive(Debug, Clone, Serialize)]
pub struct PersistenceWarning {
    pub entity: String,
    pub index: Option<usize>,
    pub detail: String,
}

/// A paragraph lookup that found no stored template and degraded to the
/// generated placeholder text.
#[derive(Debug, Clone, Serialize)]
pub struct MissingParagraph {
    pub person_role: String,
    pub contract_type: String,
    pub section: String,
    pub message: String,
}
