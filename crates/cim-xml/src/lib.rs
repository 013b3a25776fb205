//! CIM-XML generation
//!
//! This crate serializes the [`cim`] object model into the DMTF CIM-XML
//! wire format and builds the HTTP envelopes that carry it.
//!
//! - [`utf`]: UTF-16 / UTF-8 transcoding with explicit bounds checks
//! - [`generator`]: character escaping, scalar formatting, URI encoding
//! - [`writer`]: element writers (`<CLASS>`, `<INSTANCE>`, `<PROPERTY>`, paths, ...)
//! - [`message`]: message envelopes and request/response formatters
//! - [`http`]: HTTP request and response headers
//! - [`indent`]: tokenizer and indented printer for trace output
//!
//! Writers append to a caller-owned [`bytes::BytesMut`]; nothing is built
//! in memory beyond the output itself.
//!
//! # Example
//!
//! ```ignore
//! use bytes::BytesMut;
//! use cim::{CimName, Instance, Property, PropertyList};
//! use cim_xml::writer::append_instance_element;
//!
//! let instance = Instance::new(CimName::new("Foo")?);
//! instance.add_property(Property::new(CimName::new("Count")?, 5u32)?)?;
//!
//! let mut out = BytesMut::new();
//! append_instance_element(&mut out, &instance, true, true, &PropertyList::all())?;
//! ```

pub mod generator;
pub mod http;
pub mod indent;
pub mod message;
pub mod utf;
pub mod writer;
mod error;

pub use error::{Result, XmlError};
pub use http::HttpMethod;
pub use indent::{indented_print, XmlEntry, XmlEntryKind, XmlTokenizer, DEFAULT_INDENT_CHARS};
pub use message::{next_message_id, ErrorResponse, MessageIdFactory, ParamValue, RequestContext};
