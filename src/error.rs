use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid preset format, check the syntax")]
pub struct InvalidPresetFormat;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    #[error("{input:?} is not a number")]
    InvalidNumber { input: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected KEY=VALUE, got {0:?}")]
    MalformedPair(String),

    #[error("unknown column key {0:?}")]
    UnknownColumn(String),

    #[error("column {column:?}: {source}")]
    Coerce {
        column: String,
        #[source]
        source: CoerceError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("completion failed: {0}")]
    Completion(String),

    #[error("the model did not return a valid output: {0}")]
    MalformedResponse(String),

    #[error("the model returned a preset that does not parse")]
    InvalidPreset,
}

impl From<InvalidPresetFormat> for AiError {
    fn from(_: InvalidPresetFormat) -> Self {
        AiError::InvalidPreset
    }
}
