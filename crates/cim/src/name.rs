//! Validated CIM identifiers and namespace names

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{CimError, Result};

/// A legal CIM identifier
///
/// Comparison and hashing ignore ASCII case. Each name carries a small
/// precomputed tag used by name-indexed containers to reject most
/// mismatches without a string comparison.
#[derive(Clone)]
pub struct CimName {
    name: Arc<str>,
    tag: u32,
}

impl CimName {
    /// Validate and wrap an identifier
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::legal(name) {
            return Err(CimError::InvalidName(name.to_string()));
        }
        Ok(Self {
            tag: name_tag(name),
            name: Arc::from(name),
        })
    }

    /// Check identifier syntax: first character a letter, `_` or non-ASCII;
    /// remaining characters letters, digits, `_` or non-ASCII
    pub fn legal(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || !c.is_ascii() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Case-insensitive comparison against a plain string
    pub fn equal(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

/// Tag built from the lower-cased first and last bytes of a name
pub fn name_tag(name: &str) -> u32 {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            (u32::from(first.to_ascii_lowercase()) << 1) | u32::from(last.to_ascii_lowercase())
        }
        _ => 0,
    }
}

impl PartialEq for CimName {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for CimName {}

impl Hash for CimName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl PartialEq<str> for CimName {
    fn eq(&self, other: &str) -> bool {
        self.equal(other)
    }
}

impl PartialEq<&str> for CimName {
    fn eq(&self, other: &&str) -> bool {
        self.equal(other)
    }
}

impl fmt::Display for CimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for CimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CimName({:?})", &*self.name)
    }
}

impl TryFrom<&str> for CimName {
    type Error = CimError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for CimName {
    type Error = CimError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// A `/`-separated sequence of identifiers, e.g. `root/cimv2`
#[derive(Clone)]
pub struct NamespaceName {
    name: Arc<str>,
}

impl NamespaceName {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let raw = name.as_ref();
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        if trimmed.is_empty() || !trimmed.split('/').all(CimName::legal) {
            return Err(CimError::InvalidNamespaceName(raw.to_string()));
        }
        Ok(Self {
            name: Arc::from(trimmed),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Individual namespace components
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('/')
    }
}

impl PartialEq for NamespaceName {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for NamespaceName {}

impl Hash for NamespaceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespaceName({:?})", &*self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_legal_names() {
        assert!(CimName::new("CIM_ManagedElement").is_ok());
        assert!(CimName::new("_private").is_ok());
        assert!(CimName::new("Größe").is_ok());
        assert!(CimName::new("").is_err());
        assert!(CimName::new("1abc").is_err());
        assert!(CimName::new("has space").is_err());
        assert!(CimName::new("dash-name").is_err());
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = CimName::new("Count").unwrap();
        let b = CimName::new("COUNT").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tag(), b.tag());
        assert!(a == "count");
        assert_eq!(a.as_str(), "Count");

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_name_tag() {
        assert_eq!(name_tag("ab"), (u32::from(b'a') << 1) | u32::from(b'b'));
        assert_eq!(name_tag("AB"), name_tag("ab"));
        assert_eq!(name_tag(""), 0);
    }

    #[test]
    fn test_namespace_names() {
        let ns = NamespaceName::new("/root/cimv2").unwrap();
        assert_eq!(ns.as_str(), "root/cimv2");
        assert_eq!(ns.segments().collect::<Vec<_>>(), vec!["root", "cimv2"]);
        assert_eq!(ns, NamespaceName::new("ROOT/CIMV2").unwrap());
        assert!(NamespaceName::new("").is_err());
        assert!(NamespaceName::new("root//cimv2").is_err());
        assert!(NamespaceName::new("root/9x").is_err());
    }
}
