//! CIM datetime values
//!
//! Two 25-character forms exist:
//!
//! ```text
//! timestamp: yyyymmddhhmmss.mmmmmmsutc   (s is '+' or '-', utc is minutes)
//! interval:  ddddddddhhmmss.mmmmmm:000
//! ```
//!
//! Digit positions may hold `*` to mark an unspecified field.

use std::fmt;
use std::str::FromStr;

use crate::error::{CimError, Result};

const DATETIME_LEN: usize = 25;

/// A validated datetime string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CimDateTime {
    text: String,
}

impl CimDateTime {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !Self::valid(&text) {
            return Err(CimError::InvalidDateTime(text));
        }
        Ok(Self { text })
    }

    /// Zero-length interval
    pub fn zero_interval() -> Self {
        Self {
            text: "00000000000000.000000:000".to_string(),
        }
    }

    pub fn is_interval(&self) -> bool {
        self.text.as_bytes()[21] == b':'
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn valid(text: &str) -> bool {
        let b = text.as_bytes();
        if b.len() != DATETIME_LEN || b[14] != b'.' {
            return false;
        }
        let digit = |c: u8| c.is_ascii_digit() || c == b'*';
        let interval = match b[21] {
            b':' => true,
            b'+' | b'-' => false,
            _ => return false,
        };
        if !b[..14].iter().copied().all(digit) || !b[15..21].iter().copied().all(digit) {
            return false;
        }
        if interval {
            return &b[22..] == b"000";
        }
        if !b[22..].iter().all(u8::is_ascii_digit) {
            return false;
        }
        // Range checks only apply to fully specified fields
        let field = |range: std::ops::Range<usize>| -> Option<u32> {
            std::str::from_utf8(&b[range]).ok()?.parse().ok()
        };
        let in_range = |v: Option<u32>, lo: u32, hi: u32| v.map_or(true, |v| (lo..=hi).contains(&v));
        in_range(field(4..6), 1, 12)
            && in_range(field(6..8), 1, 31)
            && in_range(field(8..10), 0, 23)
            && in_range(field(10..12), 0, 59)
            && in_range(field(12..14), 0, 59)
    }
}

impl fmt::Display for CimDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for CimDateTime {
    type Err = CimError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
