//! MOF compiler errors

use std::path::PathBuf;

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, MofError>;

/// MOF compilation errors
///
/// Lexer and parse errors are fatal to the compilation unit they occur in.
#[derive(Debug, Error)]
pub enum MofError {
    /// Malformed token
    #[error("{file}:{line}: {message}")]
    Lexer {
        file: String,
        line: u32,
        message: String,
    },

    /// Syntax error, or a failure while building or storing an object
    #[error("{file}:{line}: {message} (near {token:?})")]
    Parse {
        file: String,
        line: u32,
        token: String,
        message: String,
    },

    /// Source or include file could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Option combination the compiler does not implement
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Cim(#[from] cim::CimError),

    #[error(transparent)]
    Xml(#[from] cim_xml::XmlError),
}

impl MofError {
    pub fn lexer(line: u32, message: impl Into<String>) -> Self {
        Self::Lexer {
            file: String::new(),
            line,
            message: message.into(),
        }
    }

    pub fn parse(
        file: impl Into<String>,
        line: u32,
        token: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            token: token.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Fill in the file name of a lexer error raised before it was known
    pub fn in_file(self, name: &str) -> Self {
        match self {
            Self::Lexer {
                file,
                line,
                message,
            } if file.is_empty() => Self::Lexer {
                file: name.to_string(),
                line,
                message,
            },
            other => other,
        }
    }

    /// Line the error was raised on, when it has one
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Lexer { line, .. } | Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_gets_file() {
        let err = MofError::lexer(7, "unterminated string").in_file("a.mof");
        assert_eq!(err.to_string(), "a.mof:7: unterminated string");
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn test_parse_error_display() {
        let err = MofError::parse("b.mof", 3, "}", "expected ';'");
        assert_eq!(err.to_string(), "b.mof:3: expected ';' (near \"}\")");
    }
}
