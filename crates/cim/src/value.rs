//! Typed CIM values
//!
//! A [`CimValue`] is a null marker, a scalar, or a homogeneous array. Its
//! type and array-ness are fixed at construction; a null value still
//! remembers both so that the declaring property keeps its shape.

use std::fmt;

use crate::datetime::CimDateTime;
use crate::error::{CimError, Result};
use crate::object::{Instance, Object};
use crate::path::ObjectPath;
use crate::types::CimType;

/// One element of a CIM value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Uint8(u8),
    Sint8(i8),
    Uint16(u16),
    Sint16(i16),
    Uint32(u32),
    Sint32(i32),
    Uint64(u64),
    Sint64(i64),
    Real32(f32),
    Real64(f64),
    /// A single UTF-16 code unit
    Char16(u16),
    String(String),
    DateTime(CimDateTime),
    Reference(ObjectPath),
    Object(Object),
    Instance(Instance),
}

impl Scalar {
    pub fn cim_type(&self) -> CimType {
        match self {
            Self::Boolean(_) => CimType::Boolean,
            Self::Uint8(_) => CimType::Uint8,
            Self::Sint8(_) => CimType::Sint8,
            Self::Uint16(_) => CimType::Uint16,
            Self::Sint16(_) => CimType::Sint16,
            Self::Uint32(_) => CimType::Uint32,
            Self::Sint32(_) => CimType::Sint32,
            Self::Uint64(_) => CimType::Uint64,
            Self::Sint64(_) => CimType::Sint64,
            Self::Real32(_) => CimType::Real32,
            Self::Real64(_) => CimType::Real64,
            Self::Char16(_) => CimType::Char16,
            Self::String(_) => CimType::String,
            Self::DateTime(_) => CimType::DateTime,
            Self::Reference(_) => CimType::Reference,
            Self::Object(_) => CimType::Object,
            Self::Instance(_) => CimType::Instance,
        }
    }

    /// Copy with embedded objects deep-cloned
    pub fn deep_clone(&self) -> Result<Self> {
        Ok(match self {
            Self::Object(o) => Self::Object(o.deep_clone()?),
            Self::Instance(i) => Self::Instance(i.deep_clone()?),
            other => other.clone(),
        })
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Uint8(v) => write!(f, "{v}"),
            Self::Sint8(v) => write!(f, "{v}"),
            Self::Uint16(v) => write!(f, "{v}"),
            Self::Sint16(v) => write!(f, "{v}"),
            Self::Uint32(v) => write!(f, "{v}"),
            Self::Sint32(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Sint64(v) => write!(f, "{v}"),
            Self::Real32(v) => write!(f, "{v}"),
            Self::Real64(v) => write!(f, "{v}"),
            Self::Char16(c) => {
                let c = char::from_u32(u32::from(*c)).unwrap_or(char::REPLACEMENT_CHARACTER);
                write!(f, "{c}")
            }
            Self::String(s) => f.write_str(s),
            Self::DateTime(d) => write!(f, "{d}"),
            Self::Reference(p) => write!(f, "{p}"),
            Self::Object(o) => match o.path() {
                Ok(p) => write!(f, "{p}"),
                Err(_) => f.write_str("<uninitialized>"),
            },
            Self::Instance(i) => match i.path() {
                Ok(p) => write!(f, "{p}"),
                Err(_) => f.write_str("<uninitialized>"),
            },
        }
    }
}

/// A typed CIM value
#[derive(Debug, Clone, PartialEq)]
pub enum CimValue {
    /// Explicit absence of a value; keeps the declared shape
    Null {
        cim_type: CimType,
        is_array: bool,
        array_size: u32,
    },
    Scalar(Scalar),
    Array {
        cim_type: CimType,
        elements: Vec<Scalar>,
    },
}

impl CimValue {
    /// Null value of the given shape
    pub fn null(cim_type: CimType, is_array: bool, array_size: u32) -> Self {
        Self::Null {
            cim_type,
            is_array,
            array_size,
        }
    }

    /// Build an array, checking every element against the element type
    pub fn array(cim_type: CimType, elements: Vec<Scalar>) -> Result<Self> {
        if let Some(bad) = elements.iter().find(|e| e.cim_type() != cim_type) {
            return Err(CimError::type_mismatch(format!(
                "{} element in {} array",
                bad.cim_type(),
                cim_type
            )));
        }
        Ok(Self::Array { cim_type, elements })
    }

    pub fn cim_type(&self) -> CimType {
        match self {
            Self::Null { cim_type, .. } | Self::Array { cim_type, .. } => *cim_type,
            Self::Scalar(s) => s.cim_type(),
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            Self::Null { is_array, .. } => *is_array,
            Self::Scalar(_) => false,
            Self::Array { .. } => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null { .. })
    }

    /// Number of elements; for a null array, its declared size
    pub fn array_size(&self) -> u32 {
        match self {
            Self::Null { array_size, .. } => *array_size,
            Self::Scalar(_) => 0,
            Self::Array { elements, .. } => elements.len() as u32,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&[Scalar]> {
        match self {
            Self::Array { elements, .. } => Some(elements),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Scalar(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Same type and array-ness
    pub fn type_compatible(&self, other: &CimValue) -> bool {
        self.cim_type() == other.cim_type() && self.is_array() == other.is_array()
    }

    /// Copy with embedded objects deep-cloned
    pub fn deep_clone(&self) -> Result<Self> {
        Ok(match self {
            Self::Scalar(s) => Self::Scalar(s.deep_clone()?),
            Self::Array { cim_type, elements } => Self::Array {
                cim_type: *cim_type,
                elements: elements.iter().map(Scalar::deep_clone).collect::<Result<_>>()?,
            },
            null => null.clone(),
        })
    }
}

impl fmt::Display for CimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null { .. } => f.write_str("NULL"),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Array { elements, .. } => {
                f.write_str("{")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<Scalar> for CimValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                fn from(v: $t) -> Self {
                    Scalar::$variant(v)
                }
            }

            impl From<$t> for CimValue {
                fn from(v: $t) -> Self {
                    CimValue::Scalar(Scalar::$variant(v))
                }
            }

            impl From<Vec<$t>> for CimValue {
                fn from(v: Vec<$t>) -> Self {
                    CimValue::Array {
                        cim_type: CimType::$variant,
                        elements: v.into_iter().map(Scalar::$variant).collect(),
                    }
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Boolean,
    u8 => Uint8,
    i8 => Sint8,
    u16 => Uint16,
    i16 => Sint16,
    u32 => Uint32,
    i32 => Sint32,
    u64 => Uint64,
    i64 => Sint64,
    f32 => Real32,
    f64 => Real64,
    String => String,
    CimDateTime => DateTime,
    ObjectPath => Reference,
    Object => Object,
    Instance => Instance,
}

impl From<&str> for CimValue {
    fn from(v: &str) -> Self {
        CimValue::Scalar(Scalar::String(v.to_string()))
    }
}

impl From<Vec<&str>> for CimValue {
    fn from(v: Vec<&str>) -> Self {
        CimValue::Array {
            cim_type: CimType::String,
            elements: v.into_iter().map(|s| Scalar::String(s.to_string())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let v = CimValue::from(5u32);
        assert_eq!(v.cim_type(), CimType::Uint32);
        assert!(!v.is_array());
        assert!(!v.is_null());

        let a = CimValue::from(vec![1u16, 2, 3]);
        assert!(a.is_array());
        assert_eq!(a.array_size(), 3);

        let n = CimValue::null(CimType::String, true, 4);
        assert!(n.is_null());
        assert!(n.is_array());
        assert_eq!(n.array_size(), 4);
        assert!(n.type_compatible(&CimValue::from(vec!["x"])));
    }

    #[test]
    fn test_array_rejects_mixed_elements() {
        let err = CimValue::array(CimType::Uint8, vec![Scalar::Uint8(1), Scalar::Sint8(2)]);
        assert!(matches!(err, Err(CimError::TypeMismatch(_))));
        assert!(CimValue::array(CimType::Uint8, vec![]).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(CimValue::from(true).to_string(), "TRUE");
        assert_eq!(CimValue::from(vec![1i32, -2]).to_string(), "{1, -2}");
        assert_eq!(CimValue::from(Scalar::Char16(0x41)).to_string(), "A");
        assert_eq!(CimValue::null(CimType::Uint8, false, 0).to_string(), "NULL");
    }
}
