// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },
    #[error("{file}:{line}: import cycle through {path}")]
    ImportCycle { file: String, line: usize, path: String },
}

impl RuleError {
    pub fn parse(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::ImportCycle { line, .. } => Some(*line),
            Self::Io { .. } => None,
        }
    }
}
