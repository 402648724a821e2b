use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Input file has no readable first line: {}", path.display())]
    EmptyInput { path: PathBuf },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Internal processing error: {0}")]
    ProcessingError(String),

    // Catch-all for anyhow errors when direct conversion is suitable
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InputNotFound { .. } => 2,
            PipelineError::EmptyInput { .. } => 3,
            PipelineError::Write { .. } => 4,
            PipelineError::ConfigError(_) => 5,
            PipelineError::CsvSystemError { .. } => 6,
            PipelineError::IoError { .. } => 7,
            PipelineError::ProcessingError(_) | PipelineError::AnyhowError(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_path() {
        let err = PipelineError::InputNotFound { path: PathBuf::from("solicitacao_to.csv") };
        assert_eq!(err.to_string(), "Input file not found: solicitacao_to.csv");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: PipelineError = io.into();
        assert!(err.to_string().contains("I/O error"));
        assert_eq!(err.exit_code(), 7);
    }
}
