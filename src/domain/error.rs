//! Domain error types.

use crate::domain::indicator::IndicatorError;

/// Top-level error type for invest-tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("insufficient data for {subject}: {reason}")]
    InsufficientData { subject: String, reason: String },

    #[error("strategy {strategy} does not apply to asset {asset}")]
    UnsuitableAsset { strategy: String, asset: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("no strategy could be backtested on {asset}")]
    AllStrategiesFailed { asset: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// Too few price points for a computation that needs `minimum`.
    pub fn too_few_points(subject: &str, points: usize, minimum: usize) -> Self {
        TrackerError::InsufficientData {
            subject: subject.to_string(),
            reason: format!("have {points} price points, need {minimum}"),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        TrackerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn persistence(reason: impl std::fmt::Display) -> Self {
        TrackerError::Persistence {
            reason: reason.to_string(),
        }
    }

    /// Whether a batch caller may skip this failure and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::InsufficientData { .. }
                | TrackerError::UnsuitableAsset { .. }
                | TrackerError::Indicator(_)
        )
    }
}

impl From<&TrackerError> for std::process::ExitCode {
    fn from(err: &TrackerError) -> Self {
        let code: u8 = match err {
            TrackerError::Io(_) => 1,
            TrackerError::ConfigParse { .. }
            | TrackerError::ConfigMissing { .. }
            | TrackerError::ConfigInvalid { .. } => 2,
            TrackerError::Persistence { .. } => 3,
            TrackerError::NotFound { .. } | TrackerError::UnknownStrategy(_) => 4,
            TrackerError::InsufficientData { .. }
            | TrackerError::UnsuitableAsset { .. }
            | TrackerError::Indicator(_)
            | TrackerError::AllStrategiesFailed { .. } => 5,
            TrackerError::InvalidInput { .. } | TrackerError::InvalidTransition { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
