//! CIM data types

use std::fmt;
use std::str::FromStr;

use crate::error::CimError;

/// Intrinsic CIM data types
///
/// `Object` and `Instance` have no CIM-XML spelling of their own; they are
/// carried as strings with an `EmbeddedObject` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CimType {
    Boolean,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
    Uint64,
    Sint64,
    Real32,
    Real64,
    Char16,
    String,
    DateTime,
    Reference,
    Object,
    Instance,
}

impl CimType {
    /// Name as used in `TYPE="..."` attributes and MOF
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Uint8 => "uint8",
            Self::Sint8 => "sint8",
            Self::Uint16 => "uint16",
            Self::Sint16 => "sint16",
            Self::Uint32 => "uint32",
            Self::Sint32 => "sint32",
            Self::Uint64 => "uint64",
            Self::Sint64 => "sint64",
            Self::Real32 => "real32",
            Self::Real64 => "real64",
            Self::Char16 => "char16",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::Reference => "reference",
            Self::Object => "object",
            Self::Instance => "instance",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Uint8
                | Self::Sint8
                | Self::Uint16
                | Self::Sint16
                | Self::Uint32
                | Self::Sint32
                | Self::Uint64
                | Self::Sint64
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::Sint8 | Self::Sint16 | Self::Sint32 | Self::Sint64)
    }

    pub fn is_real(self) -> bool {
        matches!(self, Self::Real32 | Self::Real64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_real()
    }

    /// Types serialized as an embedded object
    pub fn is_embedded(self) -> bool {
        matches!(self, Self::Object | Self::Instance)
    }
}

impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CimType {
    type Err = CimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "boolean" => Self::Boolean,
            "uint8" => Self::Uint8,
            "sint8" => Self::Sint8,
            "uint16" => Self::Uint16,
            "sint16" => Self::Sint16,
            "uint32" => Self::Uint32,
            "sint32" => Self::Sint32,
            "uint64" => Self::Uint64,
            "sint64" => Self::Sint64,
            "real32" => Self::Real32,
            "real64" => Self::Real64,
            "char16" => Self::Char16,
            "string" => Self::String,
            "datetime" => Self::DateTime,
            "reference" => Self::Reference,
            "object" => Self::Object,
            "instance" => Self::Instance,
            _ => return Err(CimError::type_mismatch(format!("unknown CIM type {s:?}"))),
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("UINT32".parse::<CimType>().unwrap(), CimType::Uint32);
        assert_eq!("DateTime".parse::<CimType>().unwrap(), CimType::DateTime);
        assert!("int".parse::<CimType>().is_err());
    }

    #[test]
    fn test_classification() {
        assert!(CimType::Sint16.is_integer());
        assert!(CimType::Sint16.is_signed());
        assert!(!CimType::Uint16.is_signed());
        assert!(CimType::Real64.is_numeric());
        assert!(!CimType::Char16.is_numeric());
        assert!(CimType::Instance.is_embedded());
        assert_eq!(CimType::Uint32.to_string(), "uint32");
    }
}
