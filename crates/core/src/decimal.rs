//! High-precision decimal
//!
//! A 96-bit unsigned mantissa, a sign and a base-10 scale in `0..=28`.
//! The value is `(-1)^sign * mantissa / 10^scale`.
//!
//! ## Wire Format
//!
//! ```text
//! [lo: i32][mid: i32][hi: i32][flags: i32]
//! flags = scale << 16 | sign << 31
//! ```
//!
//! Equality is structural: `1.0` (mantissa 10, scale 1) and `1.00`
//! (mantissa 100, scale 2) are different values.

use crate::error::{CodecError, Result};
use std::fmt;

/// Largest supported scale
pub const MAX_SCALE: u32 = 28;

const MANTISSA_BITS: u32 = 96;
const SIGN_MASK: u32 = 0x8000_0000;
const SCALE_MASK: u32 = 0x00FF_0000;
const SCALE_SHIFT: u32 = 16;

/// Fixed-point decimal with a 96-bit mantissa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    mantissa: u128,
    scale: u32,
    negative: bool,
}

impl Decimal {
    /// Zero
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
        negative: false,
    };

    /// Create a decimal from a signed mantissa and scale.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the mantissa does not fit in 96 bits or
    /// the scale exceeds [`MAX_SCALE`].
    pub fn new(mantissa: i128, scale: u32) -> Result<Self> {
        let magnitude = mantissa.unsigned_abs();
        if magnitude >> MANTISSA_BITS != 0 {
            return Err(CodecError::invalid(format!(
                "decimal mantissa {} exceeds 96 bits",
                mantissa
            )));
        }
        if scale > MAX_SCALE {
            return Err(CodecError::invalid(format!(
                "decimal scale {} exceeds {}",
                scale, MAX_SCALE
            )));
        }
        Ok(Decimal {
            mantissa: magnitude,
            scale,
            negative: mantissa < 0 && magnitude != 0,
        })
    }

    /// Signed mantissa
    pub fn mantissa(&self) -> i128 {
        let m = self.mantissa as i128;
        if self.negative {
            -m
        } else {
            m
        }
    }

    /// Base-10 scale
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// True if the sign bit is set
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Split into the four wire words `lo, mid, hi, flags`.
    pub fn to_words(&self) -> [i32; 4] {
        let lo = (self.mantissa & 0xFFFF_FFFF) as u32;
        let mid = ((self.mantissa >> 32) & 0xFFFF_FFFF) as u32;
        let hi = ((self.mantissa >> 64) & 0xFFFF_FFFF) as u32;
        let mut flags = self.scale << SCALE_SHIFT;
        if self.negative {
            flags |= SIGN_MASK;
        }
        [lo as i32, mid as i32, hi as i32, flags as i32]
    }

    /// Rebuild from the four wire words.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if reserved flag bits are set or the scale is
    /// out of range.
    pub fn from_words(words: [i32; 4]) -> Result<Self> {
        let [lo, mid, hi, flags] = words.map(|w| w as u32);
        if flags & !(SIGN_MASK | SCALE_MASK) != 0 {
            return Err(CodecError::invalid(format!(
                "decimal flags {:#010x} have reserved bits set",
                flags
            )));
        }
        let scale = (flags & SCALE_MASK) >> SCALE_SHIFT;
        if scale > MAX_SCALE {
            return Err(CodecError::invalid(format!(
                "decimal scale {} exceeds {}",
                scale, MAX_SCALE
            )));
        }
        let mantissa = (lo as u128) | ((mid as u128) << 32) | ((hi as u128) << 64);
        Ok(Decimal {
            mantissa,
            scale,
            negative: flags & SIGN_MASK != 0 && mantissa != 0,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = self.scale as usize;
        let sign = if self.negative { "-" } else { "" };
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}
