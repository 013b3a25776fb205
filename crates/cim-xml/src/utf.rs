//! Bounded UTF-16 / UTF-8 transcoding
//!
//! Both directions work on caller-supplied buffers and never write past
//! the end of the destination. Failure is reported through the returned
//! [`Transcoded`] record rather than an error: the record says how far the
//! pass got, so callers can stop there.

/// First and last code units of the UTF-16 surrogate ranges
pub const FIRST_HIGH_SURROGATE: u16 = 0xD800;
pub const LAST_HIGH_SURROGATE: u16 = 0xDBFF;
pub const FIRST_LOW_SURROGATE: u16 = 0xDC00;
pub const LAST_LOW_SURROGATE: u16 = 0xDFFF;

pub const REPLACEMENT_CHARACTER: u32 = 0xFFFD;

const HALF_SHIFT: u32 = 10;
const HALF_BASE: u32 = 0x0001_0000;
const HALF_MASK: u32 = 0x3FF;
const MAX_BMP: u32 = 0xFFFF;
const MAX_SCALAR: u32 = 0x10_FFFF;

const FIRST_BYTE_MARK: [u8; 7] = [0x00, 0x00, 0xC0, 0xE0, 0xF0, 0xF8, 0xFC];

const OFFSETS_FROM_UTF8: [u32; 6] = [
    0x0000_0000,
    0x0000_3080,
    0x000E_2080,
    0x03C8_2080,
    0xFA08_2080,
    0x8208_2080,
];

/// Number of continuation bytes announced by a UTF-8 lead byte
const TRAILING_BYTES_FOR_UTF8: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0xC0;
    while i < 256 {
        table[i] = match i {
            0xC0..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF7 => 3,
            0xF8..=0xFB => 4,
            _ => 5,
        };
        i += 1;
    }
    table
};

/// How far a transcoding pass got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcoded {
    /// Source units consumed
    pub read: usize,
    /// Destination units produced
    pub written: usize,
    /// False when the pass stopped early on truncated input or a full
    /// destination
    pub complete: bool,
}

impl Transcoded {
    fn stopped(read: usize, written: usize) -> Self {
        Self {
            read,
            written,
            complete: false,
        }
    }
}

/// Count of continuation bytes implied by `lead`
pub fn utf8_trailing_bytes(lead: u8) -> usize {
    TRAILING_BYTES_FOR_UTF8[lead as usize] as usize
}

pub fn is_high_surrogate(unit: u16) -> bool {
    (FIRST_HIGH_SURROGATE..=LAST_HIGH_SURROGATE).contains(&unit)
}

pub fn is_surrogate(unit: u16) -> bool {
    (FIRST_HIGH_SURROGATE..=LAST_LOW_SURROGATE).contains(&unit)
}

/// Transcode UTF-16 code units into UTF-8
///
/// Surrogate pairs combine into one scalar. An unpaired surrogate other
/// than a trailing high surrogate is encoded as-is. A high surrogate that
/// ends the input stops the pass.
pub fn utf16_to_utf8(src: &[u16], dst: &mut [u8]) -> Transcoded {
    let mut read = 0;
    let mut written = 0;

    while read < src.len() {
        let start = read;
        let mut scalar = u32::from(src[read]);
        read += 1;

        if is_high_surrogate(src[start]) {
            match src.get(read) {
                Some(&low) if (FIRST_LOW_SURROGATE..=LAST_LOW_SURROGATE).contains(&low) => {
                    scalar = ((scalar - u32::from(FIRST_HIGH_SURROGATE)) << HALF_SHIFT)
                        + (u32::from(low) - u32::from(FIRST_LOW_SURROGATE))
                        + HALF_BASE;
                    read += 1;
                }
                Some(_) => {}
                None => return Transcoded::stopped(start, written),
            }
        }

        let count = match scalar {
            0..=0x7F => 1,
            0x80..=0x7FF => 2,
            0x800..=0xFFFF => 3,
            0x1_0000..=0x1F_FFFF => 4,
            _ => {
                scalar = REPLACEMENT_CHARACTER;
                3
            }
        };

        if written + count > dst.len() {
            return Transcoded::stopped(start, written);
        }
        encode_scalar(scalar, &mut dst[written..written + count]);
        written += count;
    }

    Transcoded {
        read,
        written,
        complete: true,
    }
}

fn encode_scalar(mut scalar: u32, out: &mut [u8]) {
    let count = out.len();
    for byte in out[1..].iter_mut().rev() {
        *byte = ((scalar | 0x80) & 0xBF) as u8;
        scalar >>= 6;
    }
    out[0] = (scalar as u8) | FIRST_BYTE_MARK[count];
}

/// Transcode UTF-8 bytes into UTF-16 code units
///
/// Surrogate code points and the non-characters U+FFFE/U+FFFF become
/// U+FFFD; scalars above the BMP become surrogate pairs. A lead byte whose
/// continuation run is cut short by the end of input stops the pass.
pub fn utf8_to_utf16(src: &[u8], dst: &mut [u16]) -> Transcoded {
    let mut read = 0;
    let mut written = 0;

    while read < src.len() {
        let more = utf8_trailing_bytes(src[read]);
        if read + more >= src.len() {
            return Transcoded::stopped(read, written);
        }

        let mut scalar: u32 = 0;
        for (i, &byte) in src[read..=read + more].iter().enumerate() {
            if i > 0 {
                scalar = scalar.wrapping_shl(6);
            }
            scalar = scalar.wrapping_add(u32::from(byte));
        }
        scalar = scalar.wrapping_sub(OFFSETS_FROM_UTF8[more]);

        if scalar <= MAX_BMP {
            if written >= dst.len() {
                return Transcoded::stopped(read, written);
            }
            let non_character = (scalar & 0xFFFE) == 0xFFFE;
            let surrogate = (u32::from(FIRST_HIGH_SURROGATE)..=u32::from(LAST_LOW_SURROGATE))
                .contains(&scalar);
            dst[written] = if surrogate || non_character {
                REPLACEMENT_CHARACTER as u16
            } else {
                scalar as u16
            };
            written += 1;
        } else if scalar > MAX_SCALAR {
            if written >= dst.len() {
                return Transcoded::stopped(read, written);
            }
            dst[written] = REPLACEMENT_CHARACTER as u16;
            written += 1;
        } else {
            if written + 2 > dst.len() {
                return Transcoded::stopped(read, written);
            }
            let offset = scalar - HALF_BASE;
            dst[written] = ((offset >> HALF_SHIFT) + u32::from(FIRST_HIGH_SURROGATE)) as u16;
            dst[written + 1] = ((offset & HALF_MASK) + u32::from(FIRST_LOW_SURROGATE)) as u16;
            written += 2;
        }
        read += more + 1;
    }

    Transcoded {
        read,
        written,
        complete: true,
    }
}

/// Check one complete UTF-8 sequence against the legal byte ranges
///
/// `seq` must hold exactly the lead byte and its continuation bytes; any
/// length outside 1..=4 is rejected.
pub fn is_valid_u8(seq: &[u8]) -> bool {
    let Some(&lead) = seq.first() else {
        return false;
    };
    if seq.len() > 4 {
        return false;
    }

    // Continuation bytes after the second must be 0x80..=0xBF
    for &byte in seq.iter().skip(2) {
        if !(0x80..=0xBF).contains(&byte) {
            return false;
        }
    }
    if let Some(&second) = seq.get(1) {
        if second > 0xBF {
            return false;
        }
        let in_range = match lead {
            0xE0 => second >= 0xA0,
            0xF0 => second >= 0x90,
            0xF4 => second <= 0x8F,
            _ => second >= 0x80,
        };
        if !in_range {
            return false;
        }
    }
    !((0x80..0xC2).contains(&lead) || lead > 0xF4)
}

/// Transcode a whole UTF-16 string, or `None` if it ends in a lone high
/// surrogate
pub fn encode_utf8(src: &[u16]) -> Option<Vec<u8>> {
    let mut out = vec![0u8; src.len() * 3];
    let result = utf16_to_utf8(src, &mut out);
    if !result.complete {
        return None;
    }
    out.truncate(result.written);
    Some(out)
}

/// Transcode a whole UTF-8 byte string, or `None` if it is truncated
pub fn decode_utf8(src: &[u8]) -> Option<Vec<u16>> {
    let mut out = vec![0u16; src.len() * 2];
    let result = utf8_to_utf16(src, &mut out);
    if !result.complete {
        return None;
    }
    out.truncate(result.written);
    Some(out)
}
