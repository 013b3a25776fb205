//! CIM-XML element writers
//!
//! Each `append_*` function streams one element of the DTD into the output
//! buffer. No document tree is built. Element bodies are read through the
//! raw accessor traits of the object model, so a whole class is written
//! under one read lock per element.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use cim::raw::{RawMethod, RawObject, RawParameter, RawProperty, RawQualifier, RawQualifierDecl};
use cim::{
    CimName, CimType, CimValue, Class, Flavor, Instance, KeyType, Method, NamespaceName, Object,
    ObjectPath, Parameter, Property, PropertyList, Qualifier, QualifierDecl, Scalar, Scope,
    StatusCode,
};

use crate::error::Result;
use crate::generator::{
    append_bool, append_display, append_real32, append_real64, append_special,
    append_special_char16,
};

/// Qualifier marking string-encoded embedded objects
pub const EMBEDDED_OBJECT: &str = "EmbeddedObject";

#[inline]
fn push(out: &mut BytesMut, text: &str) {
    out.put_slice(text.as_bytes());
}

fn push_type(out: &mut BytesMut, cim_type: CimType) {
    out.put_slice(b"TYPE=\"");
    push(out, cim_type.as_str());
    out.put_u8(b'"');
}

fn push_u32_attribute(out: &mut BytesMut, name: &str, value: u32) {
    out.put_u8(b' ');
    push(out, name);
    out.put_slice(b"=\"");
    append_display(out, value);
    out.put_u8(b'"');
}

fn push_name_attribute(out: &mut BytesMut, name: &str, value: &CimName) {
    out.put_u8(b' ');
    push(out, name);
    out.put_slice(b"=\"");
    push(out, value.as_str());
    out.put_u8(b'"');
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<LOCALNAMESPACEPATH>` with one `<NAMESPACE>` per segment
pub fn append_local_namespace_path_element(out: &mut BytesMut, namespace: &NamespaceName) {
    out.put_slice(b"<LOCALNAMESPACEPATH>\n");
    for segment in namespace.segments() {
        out.put_slice(b"<NAMESPACE NAME=\"");
        push(out, segment);
        out.put_slice(b"\"/>\n");
    }
    out.put_slice(b"</LOCALNAMESPACEPATH>\n");
}

/// `<NAMESPACEPATH>`: host plus local namespace path
pub fn append_namespace_path_element(
    out: &mut BytesMut,
    host: &str,
    namespace: Option<&NamespaceName>,
) {
    out.put_slice(b"<NAMESPACEPATH>\n<HOST>");
    push(out, host);
    out.put_slice(b"</HOST>\n");
    match namespace {
        Some(ns) => append_local_namespace_path_element(out, ns),
        None => out.put_slice(b"<LOCALNAMESPACEPATH>\n</LOCALNAMESPACEPATH>\n"),
    }
    out.put_slice(b"</NAMESPACEPATH>\n");
}

pub fn append_class_name_element(out: &mut BytesMut, class_name: &CimName) {
    out.put_slice(b"<CLASSNAME NAME=\"");
    push(out, class_name.as_str());
    out.put_slice(b"\"/>\n");
}

/// `<INSTANCENAME>` with its key bindings
///
/// Reference-typed keys are written as nested `<VALUE.REFERENCE>`
/// elements; all others as `<KEYVALUE>` with their value type.
pub fn append_instance_name_element(out: &mut BytesMut, path: &ObjectPath) -> Result<()> {
    out.put_slice(b"<INSTANCENAME CLASSNAME=\"");
    push(out, path.class_name().as_str());
    out.put_slice(b"\">\n");

    for binding in path.key_bindings() {
        out.put_slice(b"<KEYBINDING NAME=\"");
        push(out, binding.name().as_str());
        out.put_slice(b"\">\n");

        if binding.key_type() == KeyType::Reference {
            let reference = ObjectPath::parse(binding.value())?;
            append_value_reference_element(out, &reference, false)?;
        } else {
            out.put_slice(b"<KEYVALUE VALUETYPE=\"");
            push(out, binding.key_type().as_str());
            out.put_slice(b"\">");
            append_special(out, binding.value());
            out.put_slice(b"</KEYVALUE>\n");
        }
        out.put_slice(b"</KEYBINDING>\n");
    }
    out.put_slice(b"</INSTANCENAME>\n");
    Ok(())
}

pub fn append_class_path_element(out: &mut BytesMut, path: &ObjectPath) {
    out.put_slice(b"<CLASSPATH>\n");
    append_namespace_path_element(out, path.host(), path.namespace());
    append_class_name_element(out, path.class_name());
    out.put_slice(b"</CLASSPATH>\n");
}

pub fn append_instance_path_element(out: &mut BytesMut, path: &ObjectPath) -> Result<()> {
    out.put_slice(b"<INSTANCEPATH>\n");
    append_namespace_path_element(out, path.host(), path.namespace());
    append_instance_name_element(out, path)?;
    out.put_slice(b"</INSTANCEPATH>\n");
    Ok(())
}

fn append_optional_local_namespace(out: &mut BytesMut, namespace: Option<&NamespaceName>) {
    match namespace {
        Some(ns) => append_local_namespace_path_element(out, ns),
        None => out.put_slice(b"<LOCALNAMESPACEPATH>\n</LOCALNAMESPACEPATH>\n"),
    }
}

pub fn append_local_class_path_element(out: &mut BytesMut, path: &ObjectPath) {
    out.put_slice(b"<LOCALCLASSPATH>\n");
    append_optional_local_namespace(out, path.namespace());
    append_class_name_element(out, path.class_name());
    out.put_slice(b"</LOCALCLASSPATH>\n");
}

pub fn append_local_instance_path_element(out: &mut BytesMut, path: &ObjectPath) -> Result<()> {
    out.put_slice(b"<LOCALINSTANCEPATH>\n");
    append_optional_local_namespace(out, path.namespace());
    append_instance_name_element(out, path)?;
    out.put_slice(b"</LOCALINSTANCEPATH>\n");
    Ok(())
}

/// `LOCALINSTANCEPATH` when the path has keys, `LOCALCLASSPATH` otherwise
///
/// A singleton instance of a keyless class is written as a class path.
pub fn append_local_object_path_element(out: &mut BytesMut, path: &ObjectPath) -> Result<()> {
    if path.key_bindings().is_empty() {
        append_local_class_path_element(out, path);
        Ok(())
    } else {
        append_local_instance_path_element(out, path)
    }
}

/// Most specific instance path form the path supports:
/// `INSTANCEPATH`, `LOCALINSTANCEPATH` or `INSTANCENAME`
pub fn append_instance_path(out: &mut BytesMut, path: &ObjectPath) -> Result<()> {
    if !path.host().is_empty() {
        append_instance_path_element(out, path)
    } else if path.namespace().is_some() {
        append_local_instance_path_element(out, path)
    } else {
        append_instance_name_element(out, path)
    }
}

/// Most specific class path form: `CLASSPATH`, `LOCALCLASSPATH` or `CLASSNAME`
pub fn append_class_path(out: &mut BytesMut, path: &ObjectPath) {
    if !path.host().is_empty() {
        append_class_path_element(out, path);
    } else if path.namespace().is_some() {
        append_local_class_path_element(out, path);
    } else {
        append_class_name_element(out, path.class_name());
    }
}

pub fn append_value_reference_element(
    out: &mut BytesMut,
    reference: &ObjectPath,
    is_class_path: bool,
) -> Result<()> {
    out.put_slice(b"<VALUE.REFERENCE>\n");
    if is_class_path {
        append_class_path(out, reference);
    } else {
        append_instance_path(out, reference)?;
    }
    out.put_slice(b"</VALUE.REFERENCE>\n");
    Ok(())
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Text of one scalar inside a `<VALUE>` element
fn append_scalar(out: &mut BytesMut, scalar: &Scalar) -> Result<()> {
    match scalar {
        Scalar::Boolean(b) => append_bool(out, *b),
        Scalar::Uint8(v) => append_display(out, u32::from(*v)),
        Scalar::Sint8(v) => append_display(out, i32::from(*v)),
        Scalar::Uint16(v) => append_display(out, u32::from(*v)),
        Scalar::Sint16(v) => append_display(out, i32::from(*v)),
        Scalar::Uint32(v) => append_display(out, v),
        Scalar::Sint32(v) => append_display(out, v),
        Scalar::Uint64(v) => append_display(out, v),
        Scalar::Sint64(v) => append_display(out, v),
        Scalar::Real32(v) => append_real32(out, *v),
        Scalar::Real64(v) => append_real64(out, *v),
        Scalar::Char16(c) => append_special_char16(out, *c),
        Scalar::String(s) => append_special(out, s),
        Scalar::DateTime(d) => push(out, d.as_str()),
        Scalar::Reference(path) => append_value_reference_element(out, path, false)?,
        Scalar::Object(object) => append_embedded(out, object)?,
        Scalar::Instance(instance) => append_embedded(out, instance.as_object())?,
    }
    Ok(())
}

/// Embedded objects travel as the escaped text of their own element
fn append_embedded(out: &mut BytesMut, object: &Object) -> Result<()> {
    let mut element = BytesMut::new();
    append_object_element(&mut element, object)?;
    append_special(out, &String::from_utf8_lossy(&element));
    Ok(())
}

/// `<VALUE>`, `<VALUE.ARRAY>`, `<VALUE.REFERENCE>` or `<VALUE.REFARRAY>`
///
/// A null value writes nothing at all.
pub fn append_value_element(out: &mut BytesMut, value: &CimValue) -> Result<()> {
    match value {
        CimValue::Null { .. } => {}
        CimValue::Array {
            cim_type: CimType::Reference,
            elements,
        } => {
            out.put_slice(b"<VALUE.REFARRAY>\n");
            for element in elements {
                if let Scalar::Reference(path) = element {
                    append_value_reference_element(out, path, false)?;
                }
            }
            out.put_slice(b"</VALUE.REFARRAY>\n");
        }
        CimValue::Array { elements, .. } => {
            out.put_slice(b"<VALUE.ARRAY>\n");
            for element in elements {
                out.put_slice(b"<VALUE>");
                append_scalar(out, element)?;
                out.put_slice(b"</VALUE>\n");
            }
            out.put_slice(b"</VALUE.ARRAY>\n");
        }
        CimValue::Scalar(Scalar::Reference(path)) => {
            append_value_reference_element(out, path, false)?;
        }
        CimValue::Scalar(scalar) => {
            out.put_slice(b"<VALUE>");
            append_scalar(out, scalar)?;
            out.put_slice(b"</VALUE>\n");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Qualifiers
// ---------------------------------------------------------------------------

pub fn append_qualifier_flavor_entity(out: &mut BytesMut, flavor: Flavor) {
    if !flavor.contains(Flavor::OVERRIDABLE) {
        out.put_slice(b" OVERRIDABLE=\"false\"");
    }
    if !flavor.contains(Flavor::TOSUBCLASS) {
        out.put_slice(b" TOSUBCLASS=\"false\"");
    }
    if flavor.contains(Flavor::TRANSLATABLE) {
        out.put_slice(b" TRANSLATABLE=\"true\"");
    }
}

/// `<SCOPE .../>`, or nothing for an empty scope
pub fn append_scope_element(out: &mut BytesMut, scope: Scope) {
    if scope.is_empty() {
        return;
    }
    out.put_slice(b"<SCOPE");
    let attributes = [
        (Scope::CLASS, " CLASS"),
        (Scope::ASSOCIATION, " ASSOCIATION"),
        (Scope::REFERENCE, " REFERENCE"),
        (Scope::PROPERTY, " PROPERTY"),
        (Scope::METHOD, " METHOD"),
        (Scope::PARAMETER, " PARAMETER"),
        (Scope::INDICATION, " INDICATION"),
    ];
    for (flag, attribute) in attributes {
        if scope.contains(flag) {
            push(out, attribute);
            out.put_slice(b"=\"true\"");
        }
    }
    out.put_slice(b"/>");
}

fn append_raw_qualifier(out: &mut BytesMut, rep: &impl RawQualifier) -> Result<()> {
    out.put_slice(b"<QUALIFIER NAME=\"");
    push(out, rep.name().as_str());
    out.put_slice(b"\" ");
    push_type(out, rep.value().cim_type());
    if rep.propagated() {
        out.put_slice(b" PROPAGATED=\"true\"");
    }
    append_qualifier_flavor_entity(out, rep.flavor());
    out.put_slice(b">\n");
    append_value_element(out, rep.value())?;
    out.put_slice(b"</QUALIFIER>\n");
    Ok(())
}

pub fn append_qualifier_element(out: &mut BytesMut, qualifier: &Qualifier) -> Result<()> {
    append_raw_qualifier(out, &*qualifier.raw()?)
}

pub fn append_qualifier_decl_element(out: &mut BytesMut, decl: &QualifierDecl) -> Result<()> {
    let rep = decl.raw()?;
    out.put_slice(b"<QUALIFIER.DECLARATION NAME=\"");
    push(out, rep.name().as_str());
    out.put_slice(b"\" ");
    push_type(out, rep.value().cim_type());
    if rep.value().is_array() {
        out.put_slice(b" ISARRAY=\"true\"");
        if rep.array_size() > 0 {
            push_u32_attribute(out, "ARRAYSIZE", rep.array_size());
        }
    }
    append_qualifier_flavor_entity(out, rep.flavor());
    out.put_slice(b">\n");
    append_scope_element(out, rep.scope());
    append_value_element(out, rep.value())?;
    out.put_slice(b"</QUALIFIER.DECLARATION>\n");
    Ok(())
}

fn append_qualifiers<'a>(
    out: &mut BytesMut,
    qualifiers: impl Iterator<Item = &'a Qualifier>,
) -> Result<()> {
    for qualifier in qualifiers {
        append_qualifier_element(out, qualifier)?;
    }
    Ok(())
}

/// Boolean `EmbeddedObject` qualifier with no flavor, written for
/// object-typed properties that do not carry an instance
fn append_embedded_object_qualifier(out: &mut BytesMut) -> Result<()> {
    let name = CimName::new(EMBEDDED_OBJECT)?;
    append_qualifier_element(out, &Qualifier::new(name, true, Flavor::empty()))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// How an object- or instance-typed property announces its encoding
enum EmbeddedMarker {
    /// Plain CIM type
    None,
    /// `EmbeddedObject` attribute with the given kind
    Attribute(&'static str),
    /// No attribute; an `EmbeddedObject` qualifier is synthesized
    Qualifier,
}

fn embedded_marker(value: &CimValue) -> Result<EmbeddedMarker> {
    let marker = match value {
        CimValue::Scalar(Scalar::Object(object)) => {
            if object.is_instance()? {
                EmbeddedMarker::Attribute("object")
            } else {
                EmbeddedMarker::Qualifier
            }
        }
        CimValue::Array {
            cim_type: CimType::Object,
            elements,
        } => match elements.first() {
            Some(Scalar::Object(first)) if first.is_instance()? => {
                EmbeddedMarker::Attribute("object")
            }
            _ => EmbeddedMarker::Qualifier,
        },
        CimValue::Null {
            cim_type: CimType::Object,
            ..
        } => EmbeddedMarker::Qualifier,
        CimValue::Array {
            cim_type: CimType::Instance,
            elements,
        } if elements.is_empty() => EmbeddedMarker::None,
        CimValue::Null {
            cim_type: CimType::Instance,
            is_array: true,
            ..
        } => EmbeddedMarker::None,
        v if v.cim_type() == CimType::Instance => EmbeddedMarker::Attribute("instance"),
        _ => EmbeddedMarker::None,
    };
    Ok(marker)
}

/// Writes the type attribute(s) and reports whether a qualifier must be
/// synthesized
fn append_property_type(
    out: &mut BytesMut,
    rep: &impl RawProperty,
    leading_space: bool,
) -> Result<bool> {
    let value = rep.value();
    if !value.cim_type().is_embedded() {
        if leading_space {
            out.put_u8(b' ');
        }
        push_type(out, value.cim_type());
        return Ok(false);
    }

    out.put_slice(b" TYPE=\"string\"");
    match embedded_marker(value)? {
        EmbeddedMarker::Attribute(kind) => {
            out.put_slice(b" EmbeddedObject=\"");
            push(out, kind);
            out.put_slice(b"\" EMBEDDEDOBJECT=\"");
            push(out, kind);
            out.put_u8(b'"');
            Ok(false)
        }
        EmbeddedMarker::Qualifier => Ok(rep.qualifiers().find_str(EMBEDDED_OBJECT).is_none()),
        EmbeddedMarker::None => Ok(false),
    }
}

fn append_property_body(
    out: &mut BytesMut,
    rep: &impl RawProperty,
    include_qualifiers: bool,
    synthesize_qualifier: bool,
) -> Result<()> {
    if include_qualifiers {
        append_qualifiers(out, rep.qualifiers().iter())?;
        if synthesize_qualifier {
            trace!(property = %rep.name(), "adding EmbeddedObject qualifier");
            append_embedded_object_qualifier(out)?;
        }
    }
    append_value_element(out, rep.value())
}

fn append_class_origin_and_propagated(
    out: &mut BytesMut,
    rep: &impl RawProperty,
    include_class_origin: bool,
) {
    if include_class_origin {
        if let Some(origin) = rep.class_origin() {
            push_name_attribute(out, "CLASSORIGIN", origin);
        }
    }
    if rep.propagated() {
        out.put_slice(b" PROPAGATED=\"true\"");
    }
}

fn append_raw_property(
    out: &mut BytesMut,
    rep: &impl RawProperty,
    include_qualifiers: bool,
    include_class_origin: bool,
) -> Result<()> {
    let value = rep.value();

    if value.is_array() {
        out.put_slice(b"<PROPERTY.ARRAY NAME=\"");
        push(out, rep.name().as_str());
        out.put_slice(b"\" ");
        let synthesize = append_property_type(out, rep, true)?;
        if rep.array_size() > 0 {
            push_u32_attribute(out, "ARRAYSIZE", rep.array_size());
        }
        append_class_origin_and_propagated(out, rep, include_class_origin);
        out.put_slice(b">\n");
        append_property_body(out, rep, include_qualifiers, synthesize)?;
        out.put_slice(b"</PROPERTY.ARRAY>\n");
    } else if value.cim_type() == CimType::Reference {
        out.put_slice(b"<PROPERTY.REFERENCE NAME=\"");
        push(out, rep.name().as_str());
        out.put_slice(b"\" ");
        if let Some(class) = rep.reference_class_name() {
            push_name_attribute(out, "REFERENCECLASS", class);
        }
        append_class_origin_and_propagated(out, rep, include_class_origin);
        out.put_slice(b">\n");
        append_property_body(out, rep, include_qualifiers, false)?;
        out.put_slice(b"</PROPERTY.REFERENCE>\n");
    } else {
        out.put_slice(b"<PROPERTY NAME=\"");
        push(out, rep.name().as_str());
        out.put_slice(b"\" ");
        append_class_origin_and_propagated(out, rep, include_class_origin);
        let synthesize = append_property_type(out, rep, true)?;
        out.put_slice(b">\n");
        append_property_body(out, rep, include_qualifiers, synthesize)?;
        out.put_slice(b"</PROPERTY>\n");
    }
    Ok(())
}

/// `<PROPERTY>`, `<PROPERTY.ARRAY>` or `<PROPERTY.REFERENCE>`
///
/// Object- and instance-typed properties are written as strings with an
/// `EmbeddedObject` attribute. When an object-typed property holds a class
/// (or nothing) an `EmbeddedObject` qualifier is added to the output
/// instead, unless the property already carries one. The property itself
/// is left untouched.
pub fn append_property_element(
    out: &mut BytesMut,
    property: &Property,
    include_qualifiers: bool,
    include_class_origin: bool,
) -> Result<()> {
    append_raw_property(
        out,
        &*property.raw()?,
        include_qualifiers,
        include_class_origin,
    )
}

// ---------------------------------------------------------------------------
// Methods and parameters
// ---------------------------------------------------------------------------

pub fn append_parameter_element(out: &mut BytesMut, parameter: &Parameter) -> Result<()> {
    let rep = parameter.raw()?;
    let element: &[u8] = match (rep.is_array(), rep.cim_type() == CimType::Reference) {
        (true, true) => b"PARAMETER.REFARRAY",
        (true, false) => b"PARAMETER.ARRAY",
        (false, true) => b"PARAMETER.REFERENCE",
        (false, false) => b"PARAMETER",
    };

    out.put_u8(b'<');
    out.put_slice(element);
    out.put_slice(b" NAME=\"");
    push(out, rep.name().as_str());
    out.put_u8(b'"');

    if rep.cim_type() == CimType::Reference {
        if let Some(class) = rep.reference_class_name() {
            push_name_attribute(out, "REFERENCECLASS", class);
        }
    } else {
        out.put_u8(b' ');
        push_type(out, rep.cim_type());
    }
    if rep.is_array() && rep.array_size() > 0 {
        push_u32_attribute(out, "ARRAYSIZE", rep.array_size());
    }
    out.put_slice(b">\n");

    append_qualifiers(out, rep.qualifiers().iter())?;

    out.put_slice(b"</");
    out.put_slice(element);
    out.put_slice(b">\n");
    Ok(())
}

pub fn append_method_element(out: &mut BytesMut, method: &Method) -> Result<()> {
    let rep = method.raw()?;
    out.put_slice(b"<METHOD NAME=\"");
    push(out, rep.name().as_str());
    out.put_slice(b"\" ");
    push_type(out, rep.return_type());
    if let Some(origin) = rep.class_origin() {
        push_name_attribute(out, "CLASSORIGIN", origin);
    }
    if rep.propagated() {
        out.put_slice(b" PROPAGATED=\"true\"");
    }
    out.put_slice(b">\n");

    append_qualifiers(out, rep.qualifiers().iter())?;
    for parameter in rep.parameters() {
        append_parameter_element(out, parameter)?;
    }

    out.put_slice(b"</METHOD>\n");
    Ok(())
}

// ---------------------------------------------------------------------------
// Classes and instances
// ---------------------------------------------------------------------------

fn append_raw_class(out: &mut BytesMut, rep: &dyn RawObject) -> Result<()> {
    out.put_slice(b"<CLASS NAME=\"");
    push(out, rep.class_name().as_str());
    out.put_slice(b"\" ");
    if let Some(super_class) = rep.super_class_name() {
        out.put_slice(b" SUPERCLASS=\"");
        push(out, super_class.as_str());
        out.put_slice(b"\" ");
    }
    out.put_slice(b">\n");

    append_qualifiers(out, rep.qualifiers().iter())?;
    for property in rep.properties() {
        append_property_element(out, property, true, true)?;
    }
    for method in rep.methods() {
        append_method_element(out, method)?;
    }

    out.put_slice(b"</CLASS>\n");
    Ok(())
}

fn append_raw_instance(
    out: &mut BytesMut,
    rep: &dyn RawObject,
    include_qualifiers: bool,
    include_class_origin: bool,
    property_list: &PropertyList,
) -> Result<()> {
    out.put_slice(b"<INSTANCE CLASSNAME=\"");
    push(out, rep.class_name().as_str());
    out.put_slice(b"\" >\n");

    if include_qualifiers {
        append_qualifiers(out, rep.qualifiers().iter())?;
    }

    if property_list.is_null() {
        for property in rep.properties() {
            append_property_element(out, property, include_qualifiers, include_class_origin)?;
        }
    } else {
        for name in property_list.names() {
            match rep.find_property(name) {
                Some(property) => append_property_element(
                    out,
                    property,
                    include_qualifiers,
                    include_class_origin,
                )?,
                None => trace!(property = %name, "requested property not in instance"),
            }
        }
    }

    out.put_slice(b"</INSTANCE>\n");
    Ok(())
}

/// `<CLASS>` with qualifiers, properties and methods in declaration order
pub fn append_class_element(out: &mut BytesMut, class: &Class) -> Result<()> {
    append_raw_class(out, &*class.raw()?)
}

/// `<INSTANCE>`
///
/// With an explicit property list only the listed properties are written,
/// in list order; names missing from the instance are skipped.
pub fn append_instance_element(
    out: &mut BytesMut,
    instance: &Instance,
    include_qualifiers: bool,
    include_class_origin: bool,
    property_list: &PropertyList,
) -> Result<()> {
    append_raw_instance(
        out,
        &*instance.raw()?,
        include_qualifiers,
        include_class_origin,
        property_list,
    )
}

/// `<CLASS>` or `<INSTANCE>` depending on what the object holds
pub fn append_object_element(out: &mut BytesMut, object: &Object) -> Result<()> {
    let rep = object.raw()?;
    if rep.is_class() {
        append_raw_class(out, &*rep)
    } else {
        append_raw_instance(out, &*rep, true, true, &PropertyList::all())
    }
}

/// `<VALUE.OBJECT>` wrapping a class or an instance
pub fn append_value_object_element(out: &mut BytesMut, object: &Object) -> Result<()> {
    out.put_slice(b"<VALUE.OBJECT>\n");
    append_object_element(out, object)?;
    out.put_slice(b"</VALUE.OBJECT>\n");
    Ok(())
}

/// `<VALUE.NAMEDINSTANCE>`: instance name plus instance
pub fn append_value_named_instance_element(
    out: &mut BytesMut,
    instance: &Instance,
    include_qualifiers: bool,
    include_class_origin: bool,
    property_list: &PropertyList,
) -> Result<()> {
    out.put_slice(b"<VALUE.NAMEDINSTANCE>\n");
    append_instance_name_element(out, &instance.path()?)?;
    append_instance_element(
        out,
        instance,
        include_qualifiers,
        include_class_origin,
        property_list,
    )?;
    out.put_slice(b"</VALUE.NAMEDINSTANCE>\n");
    Ok(())
}

/// `<VALUE.INSTANCEWITHPATH>`: full instance path plus instance
pub fn append_value_instance_with_path_element(
    out: &mut BytesMut,
    instance: &Instance,
    include_qualifiers: bool,
    include_class_origin: bool,
    property_list: &PropertyList,
) -> Result<()> {
    out.put_slice(b"<VALUE.INSTANCEWITHPATH>\n");
    append_instance_path_element(out, &instance.path()?)?;
    append_instance_element(
        out,
        instance,
        include_qualifiers,
        include_class_origin,
        property_list,
    )?;
    out.put_slice(b"</VALUE.INSTANCEWITHPATH>\n");
    Ok(())
}

/// `<VALUE.OBJECTWITHPATH>`: class path and class, or instance path and
/// instance
pub fn append_value_object_with_path_element(
    out: &mut BytesMut,
    object: &Object,
    include_qualifiers: bool,
    include_class_origin: bool,
    property_list: &PropertyList,
) -> Result<()> {
    let rep = object.raw()?;
    out.put_slice(b"<VALUE.OBJECTWITHPATH>\n");
    if rep.is_class() {
        append_class_path_element(out, rep.path());
        append_raw_class(out, &*rep)?;
    } else {
        append_instance_path_element(out, rep.path())?;
        append_raw_instance(
            out,
            &*rep,
            include_qualifiers,
            include_class_origin,
            property_list,
        )?;
    }
    out.put_slice(b"</VALUE.OBJECTWITHPATH>\n");
    Ok(())
}

// ---------------------------------------------------------------------------
// Method call parameters and results
// ---------------------------------------------------------------------------

/// `PARAMTYPE` attribute of a typed parameter value, with the
/// `EmbeddedObject` attributes for object and instance types
fn append_param_type_attribute(out: &mut BytesMut, cim_type: CimType) {
    match cim_type {
        CimType::Object => out.put_slice(
            b" PARAMTYPE=\"string\" EmbeddedObject=\"object\" EMBEDDEDOBJECT=\"object\"",
        ),
        CimType::Instance => out.put_slice(
            b" PARAMTYPE=\"string\" EmbeddedObject=\"instance\" EMBEDDEDOBJECT=\"instance\"",
        ),
        other => {
            out.put_slice(b" PARAMTYPE=\"");
            push(out, other.as_str());
            out.put_u8(b'"');
        }
    }
}

/// `<PARAMVALUE>`; `is_typed` adds the `PARAMTYPE` attribute
pub fn append_param_value_element(
    out: &mut BytesMut,
    name: &str,
    value: &CimValue,
    is_typed: bool,
) -> Result<()> {
    out.put_slice(b"<PARAMVALUE NAME=\"");
    push(out, name);
    out.put_u8(b'"');
    if is_typed {
        append_param_type_attribute(out, value.cim_type());
    }
    out.put_slice(b">\n");
    append_value_element(out, value)?;
    out.put_slice(b"</PARAMVALUE>\n");
    Ok(())
}

/// `<RETURNVALUE>` of an extrinsic method
pub fn append_return_value_element(out: &mut BytesMut, value: &CimValue) -> Result<()> {
    out.put_slice(b"<RETURNVALUE");
    append_param_type_attribute(out, value.cim_type());
    out.put_slice(b">\n");
    append_value_element(out, value)?;
    out.put_slice(b"</RETURNVALUE>\n");
    Ok(())
}

/// `<ERROR>` with an optional description and embedded error instances
pub fn append_error_element(
    out: &mut BytesMut,
    code: StatusCode,
    description: &str,
    instances: &[Instance],
) -> Result<()> {
    out.put_slice(b"<ERROR CODE=\"");
    append_display(out, code.as_u32());
    out.put_u8(b'"');

    if !description.is_empty() {
        out.put_slice(b" DESCRIPTION=\"");
        append_special(out, description);
        out.put_u8(b'"');
    }

    if instances.is_empty() {
        out.put_slice(b"/>");
        return Ok(());
    }

    out.put_u8(b'>');
    for instance in instances {
        append_instance_element(out, instance, true, true, &PropertyList::all())?;
    }
    out.put_slice(b"</ERROR>");
    Ok(())
}

/// Render any writer into a `String`
pub fn to_xml_string(write: impl FnOnce(&mut BytesMut) -> Result<()>) -> Result<String> {
    let mut out = BytesMut::new();
    write(&mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
