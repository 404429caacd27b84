//! Error types for the structural calc pipeline

use thiserror::Error;

/// Main error type for model construction, solving and extraction
#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Member '{0}' not found in model")]
    MemberNotFound(String),

    #[error("Material '{0}' not found in model")]
    MaterialNotFound(String),

    #[error("Section '{0}' not found in model")]
    SectionNotFound(String),

    #[error("Plate '{0}' not found in model")]
    PlateNotFound(String),

    #[error("Load combination '{0}' not found in model")]
    CombinationNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unrecognised unit '{0}'")]
    UnknownUnit(String),

    #[error("Singular stiffness matrix - model may be unstable or have insufficient supports")]
    SingularMatrix,

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Model not analyzed - run analyze() first")]
    NotAnalyzed,

    #[error("Mesher failed: {0}")]
    Mesher(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pipeline operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Log a recovered per-entity failure and keep it for the run report
pub(crate) fn recover(warnings: &mut Vec<String>, msg: String) {
    log::warn!("{}", msg);
    warnings.push(msg);
}
