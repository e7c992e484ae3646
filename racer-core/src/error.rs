use thiserror::Error;

/// Everything that can go wrong while loading or validating vehicle tuning.
///
/// Tuning is checked once, when it is loaded; the simulation itself has no
/// error channel.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("curve table must have exactly {expected} samples, got {got}")]
    CurveLength { expected: usize, got: usize },

    #[error("curve table sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl TuningError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> TuningError {
        TuningError::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
