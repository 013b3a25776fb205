//! Read-only views of object bodies
//!
//! Serializers borrow an element's body through `raw()` and read it via
//! these traits, which avoids one lock round-trip per attribute.

use crate::flavor::{Flavor, Scope};
use crate::method::Method;
use crate::name::CimName;
use crate::parameter::Parameter;
use crate::path::ObjectPath;
use crate::property::Property;
use crate::qualifier::QualifierList;
use crate::types::CimType;
use crate::value::CimValue;

pub trait RawQualifier {
    fn name(&self) -> &CimName;
    fn value(&self) -> &CimValue;
    fn flavor(&self) -> Flavor;
    fn propagated(&self) -> bool;
}

pub trait RawQualifierDecl {
    fn name(&self) -> &CimName;
    fn value(&self) -> &CimValue;
    fn scope(&self) -> Scope;
    fn flavor(&self) -> Flavor;
    fn array_size(&self) -> u32;
}

pub trait RawProperty {
    fn name(&self) -> &CimName;
    fn value(&self) -> &CimValue;
    fn array_size(&self) -> u32;
    fn reference_class_name(&self) -> Option<&CimName>;
    fn class_origin(&self) -> Option<&CimName>;
    fn propagated(&self) -> bool;
    fn qualifiers(&self) -> &QualifierList;
}

pub trait RawParameter {
    fn name(&self) -> &CimName;
    fn cim_type(&self) -> CimType;
    fn is_array(&self) -> bool;
    fn array_size(&self) -> u32;
    fn reference_class_name(&self) -> Option<&CimName>;
    fn qualifiers(&self) -> &QualifierList;
}

pub trait RawMethod {
    fn name(&self) -> &CimName;
    fn return_type(&self) -> CimType;
    fn class_origin(&self) -> Option<&CimName>;
    fn propagated(&self) -> bool;
    fn qualifiers(&self) -> &QualifierList;
    fn parameters(&self) -> Box<dyn Iterator<Item = &Parameter> + '_>;
}

/// Body shared by classes and instances
pub trait RawObject {
    fn class_name(&self) -> &CimName;
    fn path(&self) -> &ObjectPath;
    fn is_class(&self) -> bool;
    /// Superclass of a class; always `None` for instances
    fn super_class_name(&self) -> Option<&CimName>;
    fn qualifiers(&self) -> &QualifierList;
    fn properties(&self) -> Box<dyn Iterator<Item = &Property> + '_>;
    fn find_property(&self, name: &CimName) -> Option<&Property>;
    fn methods(&self) -> Box<dyn Iterator<Item = &Method> + '_>;
}
