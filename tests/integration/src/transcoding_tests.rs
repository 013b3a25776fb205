//! Transcoding Tests - Text Through the Writer and Back
//!
//! These tests check that character data survives generation:
//! - Escaped text tokenizes back to the original string
//! - UTF-16 and UTF-8 inputs produce identical output
//! - Truncated input is refused rather than guessed at

mod common;

use bytes::BytesMut;
use proptest::prelude::*;

use cim::{Instance, Property, PropertyList};
use cim_xml::generator::{
    append_special, append_special_utf16, encode_uri_characters, encode_uri_characters_utf16,
};
use cim_xml::utf::{decode_utf8, encode_utf8};
use cim_xml::writer::{append_instance_element, to_xml_string};
use cim_xml::{XmlEntryKind, XmlTokenizer};

use common::*;

/// Wrap escaped text in an element and read the content back
fn round_trip_content(text: &str) -> String {
    let mut out = BytesMut::new();
    out.extend_from_slice(b"<VALUE>");
    append_special(&mut out, text);
    out.extend_from_slice(b"</VALUE>");
    let document = String::from_utf8(out.to_vec()).unwrap();

    let entries = XmlTokenizer::new(&document)
        .collect::<cim_xml::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(entries.len(), 3, "{document}");
    assert_eq!(entries[1].kind, XmlEntryKind::Content);
    entries[1].text.clone()
}

/// Test: whitespace and markup characters come back unchanged
#[test]
fn test_escaped_content_survives_tokenizer() {
    init_logging();

    for text in [
        " leading",
        "trailing ",
        "two  spaces",
        "<tag> & \"quotes\" 'apos'",
        "tab\there\r\nline",
        "nul\0byte",
        "größe 🚀",
    ] {
        assert_eq!(round_trip_content(text), text);
    }

    println!("\n=== Escaped Content Test: PASSED ===");
}

/// Test: non-ASCII property values are written as UTF-8 and read back
#[test]
fn test_property_value_round_trip() {
    init_logging();

    let instance = Instance::new(name("Test_Label"));
    let label = "Überwachung <数据> 😀";
    instance
        .add_property(Property::new(name("Text"), label).unwrap())
        .unwrap();

    let xml = to_xml_string(|out| {
        append_instance_element(out, &instance, false, false, &PropertyList::all())
    })
    .unwrap();
    assert!(xml.contains("<VALUE>Überwachung &lt;数据&gt; 😀</VALUE>"));

    let content = XmlTokenizer::new(&xml)
        .map(|entry| entry.unwrap())
        .find(|entry| entry.kind == XmlEntryKind::Content)
        .unwrap();
    assert_eq!(content.text, label);

    println!("\n=== Property Value Round Trip Test: PASSED ===");
}

/// Test: a multi-byte sequence cut short is refused
#[test]
fn test_truncated_sequences() {
    let rocket = "🚀".as_bytes();
    for cut in 1..rocket.len() {
        assert!(decode_utf8(&rocket[..cut]).is_none(), "cut at {cut}");
    }

    let mut units: Vec<u16> = "ok🚀".encode_utf16().collect();
    units.pop();
    assert!(encode_utf8(&units).is_none());
}

proptest! {
    #[test]
    fn prop_escaped_text_round_trips(text in any::<String>()) {
        prop_assume!(!text.is_empty());
        prop_assert_eq!(round_trip_content(&text), text);
    }

    #[test]
    fn prop_escaping_has_no_raw_markup(text in any::<String>()) {
        let mut out = BytesMut::new();
        append_special(&mut out, &text);
        let escaped = String::from_utf8(out.to_vec()).unwrap();
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
        prop_assert!(escaped.split('&').skip(1).all(|tail| tail.contains(';')));
    }

    #[test]
    fn prop_utf16_and_utf8_escape_alike(text in any::<String>()) {
        let units: Vec<u16> = text.encode_utf16().collect();

        let mut from_utf8 = BytesMut::new();
        append_special(&mut from_utf8, &text);
        let mut from_utf16 = BytesMut::new();
        append_special_utf16(&mut from_utf16, &units);
        prop_assert_eq!(from_utf8, from_utf16);

        prop_assert_eq!(encode_uri_characters(&text), encode_uri_characters_utf16(&units));
    }

    #[test]
    fn prop_transcoding_matches_std(text in any::<String>()) {
        // Non-characters are replaced on decode
        prop_assume!(!text.contains(['\u{FFFE}', '\u{FFFF}']));
        let units: Vec<u16> = text.encode_utf16().collect();
        let bytes = encode_utf8(&units).unwrap();
        prop_assert_eq!(bytes.as_slice(), text.as_bytes());
        prop_assert_eq!(decode_utf8(text.as_bytes()).unwrap(), units);
    }
}
