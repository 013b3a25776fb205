//! Low-level XML text generation
//!
//! Escaping tables, typed scalar formatting and URI encoding. Everything
//! here appends to a caller-owned [`BytesMut`] and cannot fail.

use std::fmt::Display;

use bytes::{BufMut, BytesMut};

use crate::utf::{self, is_surrogate};

/// Encodings of the 7-bit characters that XML text cannot carry literally
const SPECIAL_CHARS: [&str; 128] = {
    let mut table = [""; 128];
    let refs = [
        "&#0;", "&#1;", "&#2;", "&#3;", "&#4;", "&#5;", "&#6;", "&#7;", "&#8;", "&#9;", "&#10;",
        "&#11;", "&#12;", "&#13;", "&#14;", "&#15;", "&#16;", "&#17;", "&#18;", "&#19;", "&#20;",
        "&#21;", "&#22;", "&#23;", "&#24;", "&#25;", "&#26;", "&#27;", "&#28;", "&#29;", "&#30;",
        "&#31;",
    ];
    let mut i = 0;
    while i < 32 {
        table[i] = refs[i];
        i += 1;
    }
    table[b'"' as usize] = "&quot;";
    table[b'&' as usize] = "&amp;";
    table[b'\'' as usize] = "&apos;";
    table[b'<' as usize] = "&lt;";
    table[b'>' as usize] = "&gt;";
    table[127] = "&#127;";
    table
};

/// Bytes that must be escaped in URIs and HTTP header values (RFC 2396)
const URI_ESCAPED: [bool; 128] = {
    let mut table = [false; 128];
    let mut i = 0;
    while i <= 0x20 {
        table[i] = true;
        i += 1;
    }
    let escaped = b"\"#$%&+,/:;<=>?@[\\]^`{|}";
    let mut j = 0;
    while j < escaped.len() {
        table[escaped[j] as usize] = true;
        j += 1;
    }
    table[127] = true;
    table
};

const SPACE_REF: &[u8] = b"&#32;";

#[inline]
fn special(c: u8) -> Option<&'static str> {
    match SPECIAL_CHARS.get(c as usize) {
        Some(s) if !s.is_empty() => Some(*s),
        _ => None,
    }
}

/// Append one 7-bit character, escaped if needed
pub fn append_special_char7(out: &mut BytesMut, c: u8) {
    match special(c) {
        Some(s) => out.put_slice(s.as_bytes()),
        None => out.put_u8(c),
    }
}

/// Append one UTF-16 code unit as UTF-8, escaped if 7-bit
pub fn append_special_char16(out: &mut BytesMut, c: u16) {
    if c < 128 {
        append_special_char7(out, c as u8);
    } else {
        append_char16(out, c);
    }
}

/// Append one UTF-16 code unit as UTF-8 without escaping
pub fn append_char16(out: &mut BytesMut, c: u16) {
    append_utf16_units(out, &[c]);
}

fn append_utf16_units(out: &mut BytesMut, units: &[u16]) {
    let mut buf = [0u8; 8];
    let result = utf::utf16_to_utf8(units, &mut buf);
    out.put_slice(&buf[..result.written]);
}

/// Append text as XML character data
///
/// A space that starts or ends the text, or that follows another literal
/// space, is written as `&#32;` so that consumers cannot collapse it.
pub fn append_special(out: &mut BytesMut, text: &str) {
    let mut prev_space = false;
    let mut chars = text.chars().peekable();

    if chars.peek() == Some(&' ') {
        out.put_slice(SPACE_REF);
        chars.next();
    }

    for c in chars {
        if c.is_ascii() {
            let b = c as u8;
            if let Some(s) = special(b) {
                out.put_slice(s.as_bytes());
                prev_space = false;
            } else if prev_space && b == b' ' {
                out.put_slice(SPACE_REF);
                prev_space = false;
            } else {
                out.put_u8(b);
                prev_space = b == b' ';
            }
        } else {
            let mut buf = [0u8; 4];
            out.put_slice(c.encode_utf8(&mut buf).as_bytes());
            prev_space = false;
        }
    }

    if prev_space {
        out.truncate(out.len() - 1);
        out.put_slice(SPACE_REF);
    }
}

/// Append UTF-16 text as XML character data, with the same space rule as
/// [`append_special`]
///
/// Surrogate pairs are transcoded together; a surrogate with nothing after
/// it is transcoded on its own.
pub fn append_special_utf16(out: &mut BytesMut, units: &[u16]) {
    let mut prev_space = false;
    let mut i = 0;

    if units.first() == Some(&u16::from(b' ')) {
        out.put_slice(SPACE_REF);
        i = 1;
    }

    while i < units.len() {
        let c = units[i];
        i += 1;
        if c < 128 {
            let b = c as u8;
            if let Some(s) = special(b) {
                out.put_slice(s.as_bytes());
                prev_space = false;
            } else if prev_space && b == b' ' {
                out.put_slice(SPACE_REF);
                prev_space = false;
            } else {
                out.put_u8(b);
                prev_space = b == b' ';
            }
        } else {
            if is_surrogate(c) && i < units.len() {
                append_utf16_units(out, &[c, units[i]]);
                i += 1;
            } else {
                append_char16(out, c);
            }
            prev_space = false;
        }
    }

    if prev_space {
        out.truncate(out.len() - 1);
        out.put_slice(SPACE_REF);
    }
}

/// Escape already-encoded UTF-8 bytes
///
/// Bytes at or above 0x80 belong to multi-byte sequences and pass through
/// untouched. No space protection is applied.
pub fn append_special_bytes(out: &mut BytesMut, bytes: &[u8]) {
    // Worst case every byte becomes a six-byte reference
    out.reserve(bytes.len() * 6);

    let is_normal = |b: &u8| *b >= 128 || special(*b).is_none();
    let mut rest = bytes;
    while rest.len() >= 8 && rest[..8].iter().all(is_normal) {
        rest = &rest[8..];
    }
    let clean = bytes.len() - rest.len();
    out.put_slice(&bytes[..clean]);

    for &b in rest {
        if b < 128 {
            append_special_char7(out, b);
        } else {
            out.put_u8(b);
        }
    }
}

pub fn append_bool(out: &mut BytesMut, value: bool) {
    out.put_slice(if value { b"TRUE" } else { b"FALSE" });
}

/// Append any integer (or other `Display` value) in its decimal form
pub fn append_display(out: &mut BytesMut, value: impl Display) {
    out.put_slice(value.to_string().as_bytes());
}

/// `%.7e` rendering of a real32
pub fn format_real32(value: f32) -> String {
    format_exponent(f64::from(value), 7)
}

/// `%.16e` rendering of a real64
pub fn format_real64(value: f64) -> String {
    format_exponent(value, 16)
}

pub fn append_real32(out: &mut BytesMut, value: f32) {
    out.put_slice(format_real32(value).as_bytes());
}

pub fn append_real64(out: &mut BytesMut, value: f64) {
    out.put_slice(format_real64(value).as_bytes());
}

/// C-style scientific notation: signed exponent of at least two digits
fn format_exponent(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    let text = format!("{value:.precision$e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
        }
        None => text,
    }
}

/// Percent-encode the UTF-8 form of `text` for use in an HTTP header
pub fn encode_uri_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &b in text.as_bytes() {
        if b > 127 || URI_ESCAPED[b as usize] {
            out.push_str(&format!("%{b:02X}"));
        } else {
            out.push(b as char);
        }
    }
    out
}

/// Percent-encode UTF-16 text, transcoding surrogate pairs together
pub fn encode_uri_characters_utf16(units: &[u16]) -> String {
    let mut utf8 = BytesMut::with_capacity(units.len() * 3);
    let mut i = 0;
    while i < units.len() {
        if is_surrogate(units[i]) && i + 1 < units.len() {
            append_utf16_units(&mut utf8, &units[i..i + 2]);
            i += 2;
        } else {
            append_char16(&mut utf8, units[i]);
            i += 1;
        }
    }
    let mut out = String::with_capacity(utf8.len());
    for &b in utf8.iter() {
        if b > 127 || URI_ESCAPED[b as usize] {
            out.push_str(&format!("%{b:02X}"));
        } else {
            out.push(b as char);
        }
    }
    out
}
