//! XML Writer Tests - Compiled Objects on the Wire
//!
//! These tests serialize objects the compiler produced:
//! - Plain instances and classes with inherited properties
//! - Embedded objects and the synthesized qualifier
//! - Complete request and response messages
//! - Re-indenting generated documents

mod common;

use bytes::BytesMut;

use cim::{CimValue, Class, Instance, Object, Property, PropertyList, StatusCode};
use cim_xml::message::{
    append_class_iparameter, append_class_name_iparameter, format_simple_imethod_error_rsp_message,
    format_simple_imethod_req_message, format_simple_imethod_rsp_message,
};
use cim_xml::writer::{
    append_class_element, append_instance_element, append_property_element,
    append_value_named_instance_element, to_xml_string,
};
use cim_xml::{indented_print, ErrorResponse, HttpMethod, RequestContext, XmlEntryKind, XmlTokenizer};
use cimmof::Repository;

use common::*;

fn compiled_class(class: &str) -> Class {
    let mut c = compiler();
    c.compile_str("schema.mof", SCHEMA_MOF).unwrap();
    c.repository().get_class(&namespace(), &name(class)).unwrap()
}

/// Test: a one-property instance renders exactly
#[test]
fn test_instance_element() {
    init_logging();

    let instance = Instance::new(name("Foo"));
    instance
        .add_property(Property::new(name("Count"), 5u32).unwrap())
        .unwrap();

    let xml = to_xml_string(|out| {
        append_instance_element(out, &instance, true, true, &PropertyList::all())
    })
    .unwrap();
    assert_eq!(
        xml,
        "<INSTANCE CLASSNAME=\"Foo\" >\n\
         <PROPERTY NAME=\"Count\"  TYPE=\"uint32\">\n\
         <VALUE>5</VALUE>\n\
         </PROPERTY>\n\
         </INSTANCE>\n"
    );

    println!("\n=== Instance Element Test: PASSED ===");
}

/// Test: inherited properties carry their origin and propagated flag
#[test]
fn test_class_with_inherited_properties() {
    init_logging();

    let class = compiled_class("Test_Disk");
    let xml = to_xml_string(|out| append_class_element(out, &class)).unwrap();

    assert!(xml.starts_with("<CLASS NAME=\"Test_Disk\"  SUPERCLASS=\"Test_ManagedElement\" >\n"));
    assert!(xml.contains(
        "<PROPERTY NAME=\"Caption\"  CLASSORIGIN=\"Test_ManagedElement\" PROPAGATED=\"true\" TYPE=\"string\">\n"
    ));
    assert!(xml.contains("<PROPERTY NAME=\"Capacity\"  CLASSORIGIN=\"Test_Disk\" TYPE=\"uint64\">\n"));
    assert!(xml.contains("<PROPERTY.ARRAY NAME=\"Partitions\"  TYPE=\"string\" CLASSORIGIN=\"Test_Disk\">\n"));

    // Generated text is well formed and re-indents cleanly
    let pretty = indented_print(&xml, 2).unwrap();
    assert!(pretty.contains("\n  <QUALIFIER NAME=\"Version\""));
    let entries = XmlTokenizer::new(&xml)
        .collect::<cim_xml::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(entries.first().unwrap().kind, XmlEntryKind::StartTag);
    assert_eq!(entries.last().unwrap().kind, XmlEntryKind::EndTag);

    println!("\n=== Inherited Properties Test: PASSED ===");
}

/// Test: embedding leaves the stored property untouched
#[test]
fn test_embedded_objects() {
    init_logging();

    let class = compiled_class("Test_System");
    let holder = Instance::new(name("Test_Holder"));
    holder
        .add_property(Property::new(name("Definition"), Object::from(class)).unwrap())
        .unwrap();
    let inner = Instance::new(name("Test_Note"));
    inner
        .add_property(Property::new(name("Text"), "a < b").unwrap())
        .unwrap();
    holder
        .add_property(Property::new(name("Note"), inner).unwrap())
        .unwrap();

    let xml = to_xml_string(|out| {
        append_instance_element(out, &holder, true, false, &PropertyList::all())
    })
    .unwrap();

    assert!(xml.contains("<PROPERTY NAME=\"Definition\"  TYPE=\"string\">\n<QUALIFIER NAME=\"EmbeddedObject\""));
    assert!(xml.contains("&lt;CLASS NAME=&quot;Test_System&quot;"));
    assert!(xml.contains("EmbeddedObject=\"instance\""));
    assert!(xml.contains("a &amp;lt; b"));

    let definition = holder.property(&name("Definition")).unwrap().unwrap();
    assert_eq!(definition.qualifier_count().unwrap(), 0);

    println!("\n=== Embedded Objects Test: PASSED ===");
}

/// Test: a request carries the exact body length and a POST header
#[test]
fn test_request_message() {
    init_logging();

    let class = compiled_class("Test_System");
    let mut params = BytesMut::new();
    append_class_name_iparameter(&mut params, "ClassName", &name("Test_System"));
    append_class_iparameter(&mut params, "NewClass", &class).unwrap();

    let ctx = RequestContext {
        host: "localhost:5988",
        message_id: "1042",
        ..Default::default()
    };
    let out = format_simple_imethod_req_message(&ctx, &namespace(), &name("ModifyClass"), &params);
    let text = String::from_utf8(out.to_vec()).unwrap();

    let (header, body) = text.split_once("\r\n\r\n").unwrap();
    assert!(header.starts_with("POST /cimom HTTP/1.1\r\nHOST: localhost:5988\r\n"));
    assert!(header.contains(&format!("content-length: {:010}", body.len())));
    assert!(header.contains("CIMMethod: ModifyClass"));
    assert!(body.contains("<MESSAGE ID=\"1042\" PROTOCOLVERSION=\"1.0\">"));
    assert!(body.contains("<IPARAMVALUE NAME=\"NewClass\">\n<CLASS NAME=\"Test_System\""));

    let pretty = indented_print(body, 1).unwrap();
    assert!(pretty.starts_with("<?xml"));

    println!("\n=== Request Message Test: PASSED ===");
}

/// Test: responses split across chunks join into one document
#[test]
fn test_chunked_response() {
    init_logging();

    let mut c = compiler();
    c.compile_str("schema.mof", SCHEMA_MOF).unwrap();
    let instances = c.repository().instances(&namespace()).unwrap();

    let method = name("EnumerateInstances");
    let mut chunks = Vec::new();
    for (i, instance) in instances.iter().enumerate() {
        let class_name = instance.class_name().unwrap();
        let class = c.repository().get_class(&namespace(), &class_name).unwrap();
        instance.set_path(instance.build_path(&class).unwrap()).unwrap();

        let mut body = BytesMut::new();
        append_value_named_instance_element(&mut body, instance, false, false, &PropertyList::all())
            .unwrap();
        chunks.push(format_simple_imethod_rsp_message(
            &method,
            "77",
            HttpMethod::Post,
            "",
            b"",
            &body,
            i == 0,
            i + 1 == instances.len(),
        ));
    }

    let joined: Vec<u8> = chunks.iter().flat_map(|c| c.to_vec()).collect();
    let text = String::from_utf8(joined).unwrap();
    let (_, body) = text.split_once("\r\n\r\n").unwrap();
    assert_eq!(body.matches("<VALUE.NAMEDINSTANCE>").count(), 3);
    assert_eq!(body.matches("<IRETURNVALUE>").count(), 1);
    assert_eq!(body.matches("</IRETURNVALUE>").count(), 1);
    assert!(body.contains("<KEYVALUE VALUETYPE=\"string\">disk0</KEYVALUE>"));
    indented_print(body, 2).unwrap();

    println!("\n=== Chunked Response Test: PASSED ===");
}

/// Test: an error response embeds the status code
#[test]
fn test_error_response() {
    let error = ErrorResponse::new(StatusCode::NotFound, "Test_Missing");
    let out = format_simple_imethod_error_rsp_message(
        &name("GetClass"),
        "5",
        HttpMethod::Post,
        &error,
    )
    .unwrap();
    let text = String::from_utf8(out.to_vec()).unwrap();
    assert!(text.contains("<ERROR CODE=\"6\" DESCRIPTION=\"Test_Missing\"/>"));
}

/// Test: a null property writes no value element
#[test]
fn test_null_property() {
    let p = Property::new(name("Note"), CimValue::null(cim::CimType::String, false, 0)).unwrap();
    let xml = to_xml_string(|out| append_property_element(out, &p, true, true)).unwrap();
    assert_eq!(xml, "<PROPERTY NAME=\"Note\"  TYPE=\"string\">\n</PROPERTY>\n");
}
