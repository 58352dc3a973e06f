//! Typed failures raised by the data and ML layers.
//!
//! The application layer wraps these in `anyhow` with context about
//! which pipeline step failed; nothing here is ever retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("unrecognized outcome label '{0}'")]
    UnrecognizedLabel(String),

    #[error("unrecognized file letter '{0}' (expected a-h)")]
    UnrecognizedFile(String),

    #[error("rank {0} is outside 1-8")]
    InvalidRank(i64),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("no terms remain after document-frequency filtering")]
    EmptyVocabulary,

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model used before fit: {0}")]
    NotFitted(&'static str),
}

impl AnalysisError {
    pub fn missing_column(column: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            path: path.into(),
        }
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result alias for the data and ML layers.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let e = AnalysisError::missing_column("talk_text", "debates_2022.csv");
        assert_eq!(
            e.to_string(),
            "missing required column 'talk_text' in debates_2022.csv"
        );
        assert_eq!(
            AnalysisError::UnrecognizedLabel("seventeen".into()).to_string(),
            "unrecognized outcome label 'seventeen'"
        );
    }
}
