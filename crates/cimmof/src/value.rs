//! Value factory
//!
//! Converts the literals of a MOF initializer into a [`CimValue`] of the
//! declared type, checking literal kinds and integer bounds.

use thiserror::Error;

use cim::{CimDateTime, CimType, CimValue, ObjectPath, Scalar};

/// A single literal as written in MOF
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer text in any radix, sign included
    Integer(String),
    Real(String),
    /// Adjacent string literals already concatenated
    String(String),
    Char(u16),
    Boolean(bool),
    /// Resolved alias or object handle
    Reference(ObjectPath),
}

impl Literal {
    fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::String(_) => "string",
            Self::Char(_) => "char",
            Self::Boolean(_) => "boolean",
            Self::Reference(_) => "reference",
        }
    }
}

/// Right-hand side of a default value, qualifier value or property
/// assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Null,
    Scalar(Literal),
    Array(Vec<Literal>),
}

impl Initializer {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

/// Shape requested from the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    /// Array with a fixed size, or 0 for variable length
    Array(u32),
}

/// Literal that cannot become a value of the requested type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {cim_type} value: {reason}")]
pub struct LiteralError {
    pub cim_type: CimType,
    pub reason: String,
}

impl LiteralError {
    fn new(cim_type: CimType, reason: impl Into<String>) -> Self {
        Self {
            cim_type,
            reason: reason.into(),
        }
    }
}

/// Build a value of `cim_type` and `shape` from `init`
///
/// A scalar initializer for an array shape yields a one-element array.
pub fn create_value(
    cim_type: CimType,
    shape: Shape,
    init: &Initializer,
) -> Result<CimValue, LiteralError> {
    match (shape, init) {
        (Shape::Scalar, Initializer::Null) => Ok(CimValue::null(cim_type, false, 0)),
        (Shape::Array(size), Initializer::Null) => Ok(CimValue::null(cim_type, true, size)),
        (Shape::Scalar, Initializer::Scalar(lit)) => Ok(CimValue::Scalar(to_scalar(cim_type, lit)?)),
        (Shape::Scalar, Initializer::Array(_)) => {
            Err(LiteralError::new(cim_type, "array initializer for a scalar"))
        }
        (Shape::Array(size), Initializer::Scalar(lit)) => {
            build_array(cim_type, size, std::slice::from_ref(lit))
        }
        (Shape::Array(size), Initializer::Array(lits)) => build_array(cim_type, size, lits),
    }
}

fn build_array(cim_type: CimType, size: u32, lits: &[Literal]) -> Result<CimValue, LiteralError> {
    if size > 0 && lits.len() > size as usize {
        return Err(LiteralError::new(
            cim_type,
            format!("{} elements for an array of size {size}", lits.len()),
        ));
    }
    let elements = lits
        .iter()
        .map(|lit| to_scalar(cim_type, lit))
        .collect::<Result<Vec<_>, _>>()?;
    CimValue::array(cim_type, elements).map_err(|e| LiteralError::new(cim_type, e.to_string()))
}

fn mismatch(cim_type: CimType, lit: &Literal) -> LiteralError {
    LiteralError::new(
        cim_type,
        format!("does not match parsed type {}", lit.kind()),
    )
}

fn to_scalar(cim_type: CimType, lit: &Literal) -> Result<Scalar, LiteralError> {
    let scalar = match (cim_type, lit) {
        (CimType::Boolean, Literal::Boolean(b)) => Scalar::Boolean(*b),
        (t, Literal::Integer(text)) if t.is_integer() => integer_scalar(t, text)?,
        (CimType::Real32, Literal::Integer(text) | Literal::Real(text)) => {
            Scalar::Real32(parse_real(cim_type, text)? as f32)
        }
        (CimType::Real64, Literal::Integer(text) | Literal::Real(text)) => {
            Scalar::Real64(parse_real(cim_type, text)?)
        }
        (CimType::Char16, Literal::Char(c)) => Scalar::Char16(*c),
        (CimType::Char16, Literal::String(s)) => {
            let mut units = s.encode_utf16();
            match (units.next(), units.next()) {
                (Some(c), None) => Scalar::Char16(c),
                _ => return Err(LiteralError::new(cim_type, format!("{s:?} is not one character"))),
            }
        }
        (CimType::String, Literal::String(s)) => Scalar::String(s.clone()),
        (CimType::DateTime, Literal::String(s)) => Scalar::DateTime(
            CimDateTime::new(s.as_str()).map_err(|e| LiteralError::new(cim_type, e.to_string()))?,
        ),
        (CimType::Reference, Literal::Reference(path)) => Scalar::Reference(path.clone()),
        (CimType::Reference, Literal::String(s)) => Scalar::Reference(
            ObjectPath::parse(s).map_err(|e| LiteralError::new(cim_type, e.to_string()))?,
        ),
        _ => return Err(mismatch(cim_type, lit)),
    };
    Ok(scalar)
}

/// Value of an integer literal: decimal, `0x` hex, leading-zero octal or
/// `b`-suffixed binary
pub fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits
        .strip_suffix('b')
        .or_else(|| digits.strip_suffix('B'))
    {
        u64::from_str_radix(bin, 2).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };

    let value = i128::from(magnitude);
    Some(if negative { -value } else { value })
}

fn integer_scalar(cim_type: CimType, text: &str) -> Result<Scalar, LiteralError> {
    let out_of_range = || LiteralError::new(cim_type, text.to_string());
    let v = parse_integer(text).ok_or_else(out_of_range)?;
    let scalar = match cim_type {
        CimType::Uint8 => Scalar::Uint8(u8::try_from(v).map_err(|_| out_of_range())?),
        CimType::Sint8 => Scalar::Sint8(i8::try_from(v).map_err(|_| out_of_range())?),
        CimType::Uint16 => Scalar::Uint16(u16::try_from(v).map_err(|_| out_of_range())?),
        CimType::Sint16 => Scalar::Sint16(i16::try_from(v).map_err(|_| out_of_range())?),
        CimType::Uint32 => Scalar::Uint32(u32::try_from(v).map_err(|_| out_of_range())?),
        CimType::Sint32 => Scalar::Sint32(i32::try_from(v).map_err(|_| out_of_range())?),
        CimType::Uint64 => Scalar::Uint64(u64::try_from(v).map_err(|_| out_of_range())?),
        CimType::Sint64 => Scalar::Sint64(i64::try_from(v).map_err(|_| out_of_range())?),
        _ => return Err(LiteralError::new(cim_type, "not an integer type")),
    };
    Ok(scalar)
}

fn parse_real(cim_type: CimType, text: &str) -> Result<f64, LiteralError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LiteralError::new(cim_type, text.to_string()))
}
