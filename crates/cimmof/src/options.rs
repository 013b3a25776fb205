//! Compiler options

use std::path::PathBuf;

use crate::error::{MofError, Result};

/// Namespace compiled into when none is given
pub const DEFAULT_NAMESPACE: &str = "root/cimv2";

/// What the compiler does with each completed declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    /// Store declarations in the repository
    #[default]
    UseRepository,
    /// Write declarations as CIM-XML; the repository is only read
    XmlOutput,
    /// Parse and build objects, store nothing
    SyntaxOnly,
}

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Target namespace
    pub namespace: String,
    /// Directories searched for `#pragma include` files
    pub include_paths: Vec<PathBuf>,
    pub mode: OperationMode,
    /// Echo every declaration as CIM-XML before it is stored
    pub trace: bool,
    /// Allow adding classes marked `Experimental`, or changing that mark
    pub allow_experimental: bool,
    /// Allow any version change when updating a class
    pub allow_version: bool,
    /// Allow redeclaring a class that already exists
    pub update_class: bool,
    pub suppress_warnings: bool,
    pub suppress_all_messages: bool,
    /// Keep compiling after an error. Not supported.
    pub continue_on_error: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            include_paths: Vec::new(),
            mode: OperationMode::UseRepository,
            trace: false,
            allow_experimental: false,
            allow_version: false,
            update_class: false,
            suppress_warnings: false,
            suppress_all_messages: false,
            continue_on_error: false,
        }
    }
}

impl CompilerOptions {
    /// Options for writing CIM-XML instead of updating a repository
    pub fn xml_output() -> Self {
        Self {
            mode: OperationMode::XmlOutput,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn with_mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_update_class(mut self, update_class: bool) -> Self {
        self.update_class = update_class;
        self
    }

    pub fn with_allow_experimental(mut self, allow: bool) -> Self {
        self.allow_experimental = allow;
        self
    }

    pub fn with_allow_version(mut self, allow: bool) -> Self {
        self.allow_version = allow;
        self
    }

    pub fn uses_repository(&self) -> bool {
        self.mode == OperationMode::UseRepository
    }

    pub fn xml(&self) -> bool {
        self.mode == OperationMode::XmlOutput
    }

    /// Reject option combinations the compiler cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.continue_on_error {
            return Err(MofError::Unsupported("continue on error".into()));
        }
        if self.trace && self.xml() {
            return Err(MofError::Unsupported("trace together with XML output".into()));
        }
        Ok(())
    }
}
