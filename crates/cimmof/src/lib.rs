//! MOF (Managed Object Format) Compiler
//!
//! This crate compiles DMTF MOF source into [`cim`] objects and either
//! stores them in a [`Repository`] or writes them as a CIM-XML
//! declaration document.
//!
//! # Architecture
//!
//! The compiler pipeline consists of:
//! 1. Lexer: Tokenizes the MOF text
//! 2. Parser: Recursive descent; each completed production is handed to
//!    the driver immediately
//! 3. Driver: Types literals against qualifier declarations and classes,
//!    applies the class update policy, and stores or echoes the result
//!
//! # Example
//!
//! ```ignore
//! use cimmof::{CompilerOptions, MemoryRepository, MofCompiler};
//!
//! let mof = r#"
//!     qualifier Key : boolean = false, scope(property, reference), flavor(DisableOverride, ToSubclass);
//!     class Foo { [Key] string Id; uint32 Count; };
//!     instance of Foo { Id = "a"; Count = 5; };
//! "#;
//!
//! let mut compiler = MofCompiler::new(MemoryRepository::new(), CompilerOptions::default())?;
//! compiler.compile_str("foo.mof", mof)?;
//! compiler.finish()?;
//! ```

pub mod context;
pub mod driver;
pub mod lexer;
pub mod messages;
pub mod options;
pub mod repository;
pub mod update;
pub mod value;
mod error;
mod parser;

pub use context::ParserContext;
pub use driver::MofCompiler;
pub use error::{MofError, Result};
pub use messages::{Diagnostic, MessageCode, Severity};
pub use options::{CompilerOptions, OperationMode, DEFAULT_NAMESPACE};
pub use repository::{MemoryRepository, Repository};
pub use update::{UpdateDecision, Version};
