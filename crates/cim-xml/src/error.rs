//! CIM-XML error types

use thiserror::Error;

/// Errors raised while writing or re-reading CIM-XML
#[derive(Debug, Error)]
pub enum XmlError {
    /// A string could not be transcoded
    #[error("transcoding failed: {0}")]
    Transcoding(String),

    /// Input to the tokenizer is not well formed
    #[error("malformed XML at line {line}: {message}")]
    Malformed { line: u32, message: String },

    /// Object model failure while reading an element
    #[error(transparent)]
    Cim(#[from] cim::CimError),
}

impl XmlError {
    pub fn malformed(line: u32, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

/// Result type for CIM-XML operations
pub type Result<T> = std::result::Result<T, XmlError>;
