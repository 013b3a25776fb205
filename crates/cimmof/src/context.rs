//! Parser context
//!
//! Everything a compilation needs to remember between productions: the
//! stack of open source files, the position of the last token seen and
//! the instance aliases declared so far. One context lives in each
//! [`MofCompiler`](crate::MofCompiler).

use std::path::{Path, PathBuf};

use cim::ObjectPath;

use crate::error::MofError;

/// Maximum nesting of `#pragma include`
pub const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct SourceFrame {
    name: String,
    dir: Option<PathBuf>,
    line: u32,
    token: String,
}

/// State of the compilation in flight
#[derive(Debug, Default)]
pub struct ParserContext {
    frames: Vec<SourceFrame>,
    aliases: Vec<(String, ObjectPath)>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a source file; `dir` is searched first for its includes
    pub fn push_file(&mut self, name: impl Into<String>, dir: Option<PathBuf>) {
        self.frames.push(SourceFrame {
            name: name.into(),
            dir,
            line: 0,
            token: String::new(),
        });
    }

    pub fn pop_file(&mut self) {
        self.frames.pop();
    }

    /// Number of files currently open
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn file_name(&self) -> &str {
        self.frames.last().map(|f| f.name.as_str()).unwrap_or("")
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.frames.last().and_then(|f| f.dir.as_deref())
    }

    pub fn line(&self) -> u32 {
        self.frames.last().map(|f| f.line).unwrap_or(0)
    }

    pub fn token(&self) -> &str {
        self.frames.last().map(|f| f.token.as_str()).unwrap_or("")
    }

    pub fn set_position(&mut self, line: u32, token: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
            frame.token.clear();
            frame.token.push_str(token);
        }
    }

    /// Fatal error at the current position
    pub fn error(&self, message: impl Into<String>) -> MofError {
        MofError::parse(self.file_name(), self.line(), self.token(), message)
    }

    /// Record an alias; `false` if the name is already taken
    pub fn add_alias(&mut self, name: &str, path: ObjectPath) -> bool {
        if self.alias(name).is_some() {
            return false;
        }
        self.aliases.push((name.to_string(), path));
        true
    }

    pub fn alias(&self, name: &str) -> Option<&ObjectPath> {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, path)| path)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}
