//! CIM (Common Information Model) object model
//!
//! This crate provides the in-memory representation of CIM schema and
//! data: classes, instances, properties, qualifiers, methods and typed
//! values.
//!
//! # Sharing
//!
//! Every element type is a handle over a shared body. Cloning a handle is
//! cheap and yields a second view of the same body, so a change made
//! through one handle is seen through the other. `deep_clone()` produces an
//! independent copy. A `Default` handle is uninitialized and every accessor
//! on it returns [`CimError::UninitializedObject`].
//!
//! # Example
//!
//! ```ignore
//! use cim::{CimName, Instance, Property};
//!
//! let instance = Instance::new(CimName::new("Foo")?);
//! instance.add_property(Property::new(CimName::new("Count")?, 5u32)?)?;
//! assert_eq!(instance.property_count()?, 1);
//! ```

pub mod datetime;
pub mod flavor;
pub mod method;
pub mod name;
pub mod object;
pub mod parameter;
pub mod path;
pub mod property;
pub mod property_list;
pub mod qualifier;
pub mod qualifier_decl;
pub mod raw;
pub mod status;
pub mod types;
pub mod value;
mod error;
mod ordered_set;

pub use datetime::CimDateTime;
pub use error::{CimError, Result};
pub use flavor::{Flavor, Scope};
pub use method::Method;
pub use name::{CimName, NamespaceName};
pub use object::{Class, Instance, Object};
pub use parameter::Parameter;
pub use path::{KeyBinding, KeyType, ObjectPath};
pub use property::Property;
pub use property_list::PropertyList;
pub use qualifier::{Qualifier, QualifierList};
pub use qualifier_decl::QualifierDecl;
pub use status::StatusCode;
pub use types::CimType;
pub use value::{CimValue, Scalar};
