//! Object paths and key bindings
//!
//! Textual form:
//!
//! ```text
//! //host/namespace:ClassName.key1="value",key2=42,key3=TRUE
//! ```

use std::fmt;

use crate::error::{CimError, Result};
use crate::name::{CimName, NamespaceName};
use crate::types::CimType;
use crate::value::{CimValue, Scalar};

/// Lexical kind of a key value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Boolean,
    String,
    Numeric,
    Reference,
}

impl KeyType {
    /// Spelling used in `<KEYVALUE VALUETYPE="...">`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String | Self::Reference => "string",
            Self::Numeric => "numeric",
        }
    }

    /// Key kind for a CIM type
    pub fn for_type(ty: CimType) -> Self {
        match ty {
            CimType::Boolean => Self::Boolean,
            CimType::Reference => Self::Reference,
            t if t.is_numeric() => Self::Numeric,
            _ => Self::String,
        }
    }
}

/// A single `name=value` key binding
#[derive(Debug, Clone)]
pub struct KeyBinding {
    name: CimName,
    value: String,
    key_type: KeyType,
}

impl KeyBinding {
    pub fn new(name: CimName, value: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name,
            value: value.into(),
            key_type,
        }
    }

    /// Build a key binding from a typed value
    pub fn from_value(name: CimName, value: &CimValue) -> Result<Self> {
        let scalar = match value {
            CimValue::Scalar(s) => s,
            CimValue::Null { .. } => {
                return Err(CimError::type_mismatch(format!("key {name} has a null value")))
            }
            CimValue::Array { .. } => {
                return Err(CimError::type_mismatch(format!("key {name} is an array")))
            }
        };
        let key_type = KeyType::for_type(scalar.cim_type());
        if scalar.cim_type().is_embedded() {
            return Err(CimError::type_mismatch(format!(
                "key {name} has embedded object type"
            )));
        }
        let text = match scalar {
            Scalar::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            other => other.to_string(),
        };
        Ok(Self::new(name, text, key_type))
    }

    pub fn name(&self) -> &CimName {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    fn value_matches(&self, other: &KeyBinding) -> bool {
        match self.key_type {
            KeyType::Boolean => self.value.eq_ignore_ascii_case(&other.value),
            KeyType::Numeric => match (parse_integer(&self.value), parse_integer(&other.value)) {
                (Some(a), Some(b)) => a == b,
                _ => self.value == other.value,
            },
            KeyType::Reference => match (ObjectPath::parse(&self.value), ObjectPath::parse(&other.value)) {
                (Ok(a), Ok(b)) => a.identical(&b),
                _ => self.value == other.value,
            },
            KeyType::String => self.value == other.value,
        }
    }
}

impl PartialEq for KeyBinding {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.key_type == other.key_type && self.value_matches(other)
    }
}

fn parse_integer(s: &str) -> Option<i128> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i128::from_str_radix(hex, 16).ok();
    }
    s.parse().ok()
}

/// Identity of a class or instance
#[derive(Debug, Clone)]
pub struct ObjectPath {
    host: String,
    namespace: Option<NamespaceName>,
    class_name: CimName,
    key_bindings: Vec<KeyBinding>,
}

impl ObjectPath {
    /// Path naming a class (no host, namespace or keys)
    pub fn new(class_name: CimName) -> Self {
        Self {
            host: String::new(),
            namespace: None,
            class_name,
            key_bindings: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_namespace(mut self, namespace: NamespaceName) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn with_key_bindings(mut self, key_bindings: Vec<KeyBinding>) -> Self {
        self.set_key_bindings(key_bindings);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    pub fn namespace(&self) -> Option<&NamespaceName> {
        self.namespace.as_ref()
    }

    pub fn set_namespace(&mut self, namespace: Option<NamespaceName>) {
        self.namespace = namespace;
    }

    pub fn class_name(&self) -> &CimName {
        &self.class_name
    }

    pub fn set_class_name(&mut self, class_name: CimName) {
        self.class_name = class_name;
    }

    pub fn key_bindings(&self) -> &[KeyBinding] {
        &self.key_bindings
    }

    /// Replace the key bindings; they are kept sorted by name
    pub fn set_key_bindings(&mut self, mut key_bindings: Vec<KeyBinding>) {
        key_bindings.sort_by(|a, b| {
            a.name
                .as_str()
                .to_ascii_lowercase()
                .cmp(&b.name.as_str().to_ascii_lowercase())
        });
        self.key_bindings = key_bindings;
    }

    /// True when the path names an instance rather than a class
    pub fn is_instance_path(&self) -> bool {
        !self.key_bindings.is_empty()
    }

    /// Structural equality: host ignoring case, namespace, class name and keys
    pub fn identical(&self, other: &ObjectPath) -> bool {
        self.host.eq_ignore_ascii_case(&other.host)
            && self.namespace == other.namespace
            && self.class_name == other.class_name
            && self.key_bindings == other.key_bindings
    }

    /// Parse the textual form produced by `Display`
    pub fn parse(text: &str) -> Result<Self> {
        let mut rest = text;
        let mut host = String::new();

        if let Some(after) = rest.strip_prefix("//") {
            let slash = after
                .find('/')
                .ok_or_else(|| CimError::invalid_path(text, "missing namespace after host"))?;
            host = after[..slash].to_string();
            if host.is_empty() {
                return Err(CimError::invalid_path(text, "empty host"));
            }
            rest = &after[slash + 1..];
        }

        // A namespace colon must precede the first key separator or quote
        let limit = rest.find(['.', '"']).unwrap_or(rest.len());
        let mut namespace = None;
        if let Some(colon) = rest[..limit].find(':') {
            namespace = Some(NamespaceName::new(&rest[..colon]).map_err(|_| {
                CimError::invalid_path(text, "invalid namespace")
            })?);
            rest = &rest[colon + 1..];
        } else if !host.is_empty() {
            return Err(CimError::invalid_path(text, "host given without namespace"));
        }

        let (class_part, keys_part) = match rest.find('.') {
            Some(dot) => (&rest[..dot], Some(&rest[dot + 1..])),
            None => (rest, None),
        };
        let class_name =
            CimName::new(class_part).map_err(|_| CimError::invalid_path(text, "invalid class name"))?;

        let mut key_bindings = Vec::new();
        if let Some(keys) = keys_part {
            key_bindings = parse_key_bindings(text, keys)?;
        }

        let mut path = ObjectPath::new(class_name).with_host(host);
        path.namespace = namespace;
        path.set_key_bindings(key_bindings);
        Ok(path)
    }
}

fn parse_key_bindings(text: &str, keys: &str) -> Result<Vec<KeyBinding>> {
    let bytes = keys.as_bytes();
    let mut pos = 0;
    let mut out = Vec::new();

    loop {
        let eq = keys[pos..]
            .find('=')
            .map(|i| pos + i)
            .ok_or_else(|| CimError::invalid_path(text, "key binding without '='"))?;
        let name = CimName::new(&keys[pos..eq])
            .map_err(|_| CimError::invalid_path(text, "invalid key name"))?;
        pos = eq + 1;

        if bytes.get(pos) == Some(&b'"') {
            pos += 1;
            let mut value = String::new();
            let mut closed = false;
            let mut chars = keys[pos..].char_indices();
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        pos += i + 1;
                        closed = true;
                        break;
                    }
                    c => value.push(c),
                }
            }
            if !closed {
                return Err(CimError::invalid_path(text, "unterminated key value"));
            }
            let key_type = if looks_like_reference(&value) {
                KeyType::Reference
            } else {
                KeyType::String
            };
            out.push(KeyBinding::new(name, value, key_type));
        } else {
            let end = keys[pos..].find(',').map(|i| pos + i).unwrap_or(keys.len());
            let raw = &keys[pos..end];
            let key_type = if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
                KeyType::Boolean
            } else if parse_integer(raw).is_some() || raw.parse::<f64>().is_ok() {
                KeyType::Numeric
            } else {
                return Err(CimError::invalid_path(text, format!("invalid key value {raw:?}")));
            };
            out.push(KeyBinding::new(name, raw, key_type));
            pos = end;
        }

        match bytes.get(pos) {
            None => break,
            Some(b',') => pos += 1,
            Some(_) => return Err(CimError::invalid_path(text, "expected ',' between keys")),
        }
    }
    Ok(out)
}

fn looks_like_reference(value: &str) -> bool {
    value.contains('=')
        && value.contains('.')
        && ObjectPath::parse(value).map(|p| p.is_instance_path()).unwrap_or(false)
}

impl PartialEq for ObjectPath {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.host.is_empty() {
            write!(f, "//{}/", self.host)?;
        }
        match &self.namespace {
            Some(ns) => write!(f, "{ns}:")?,
            None if !self.host.is_empty() => f.write_str(":")?,
            None => {}
        }
        write!(f, "{}", self.class_name)?;

        for (i, kb) in self.key_bindings.iter().enumerate() {
            f.write_str(if i == 0 { "." } else { "," })?;
            write!(f, "{}=", kb.name)?;
            let quoted = matches!(kb.key_type, KeyType::String | KeyType::Reference);
            if quoted {
                f.write_str("\"")?;
            }
            for c in kb.value.chars() {
                match c {
                    '\\' => f.write_str("\\\\")?,
                    '"' => f.write_str("\\\"")?,
                    c => write!(f, "{c}")?,
                }
            }
            if quoted {
                f.write_str("\"")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> CimName {
        CimName::new(s).unwrap()
    }

    #[test]
    fn test_display_full_path() {
        let path = ObjectPath::new(name("CIM_Foo"))
            .with_host("server")
            .with_namespace(NamespaceName::new("root/cimv2").unwrap())
            .with_key_bindings(vec![
                KeyBinding::new(name("Name"), "a \"q\"", KeyType::String),
                KeyBinding::new(name("Id"), "42", KeyType::Numeric),
            ]);
        assert_eq!(
            path.to_string(),
            r#"//server/root/cimv2:CIM_Foo.Id=42,Name="a \"q\"""#
        );
    }

    #[test]
    fn test_parse_instance_path() {
        let path = ObjectPath::parse(r#"root/cimv2:CIM_Foo.Name="x,y",Id=7,On=TRUE"#).unwrap();
        assert_eq!(path.host(), "");
        assert_eq!(path.namespace().unwrap().as_str(), "root/cimv2");
        assert_eq!(path.class_name().as_str(), "CIM_Foo");
        let keys = path.key_bindings();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].name().as_str(), "Id");
        assert_eq!(keys[0].key_type(), KeyType::Numeric);
        assert_eq!(keys[1].name().as_str(), "Name");
        assert_eq!(keys[1].value(), "x,y");
        assert_eq!(keys[2].key_type(), KeyType::Boolean);
    }

    #[test]
    fn test_parse_host_and_class_only() {
        let path = ObjectPath::parse("//host:5988/root:CIM_Bar").unwrap();
        assert_eq!(path.host(), "host:5988");
        assert_eq!(path.namespace().unwrap().as_str(), "root");
        assert!(!path.is_instance_path());

        let bare = ObjectPath::parse("CIM_Bar").unwrap();
        assert!(bare.namespace().is_none());
    }

    #[test]
    fn test_nested_reference_key() {
        let inner = r#"root:CIM_A.Id=1"#;
        let outer = format!(r#"CIM_Assoc.Ref="{}""#, inner.replace('"', "\\\""));
        let path = ObjectPath::parse(&outer).unwrap();
        assert_eq!(path.key_bindings()[0].key_type(), KeyType::Reference);
        assert_eq!(path.key_bindings()[0].value(), inner);
    }

    #[test]
    fn test_identical_ignores_case_and_numeric_spelling() {
        let a = ObjectPath::parse("//HOST/root:CIM_Foo.Id=0x10").unwrap();
        let b = ObjectPath::parse("//host/ROOT:cim_foo.id=16").unwrap();
        assert!(a.identical(&b));
        let c = ObjectPath::parse("//host/root:CIM_Foo.Id=17").unwrap();
        assert!(!a.identical(&c));
    }

    #[test]
    fn test_parse_errors() {
        assert!(ObjectPath::parse("//host").is_err());
        assert!(ObjectPath::parse("CIM_Foo.Id").is_err());
        assert!(ObjectPath::parse(r#"CIM_Foo.Id="open"#).is_err());
        assert!(ObjectPath::parse("9Foo").is_err());
    }
}
