//! Fixed-point decimal values.
//!
//! [`Decimal`] stores an `i128` mantissa and a base-10 scale. Values are kept
//! normalized (no trailing fractional zeros), so `1.50` and `1.5` are the same
//! value and derived equality and hashing agree with numeric comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::QuarryError;

/// Largest supported number of fractional digits.
pub const MAX_SCALE: u32 = 28;

/// A base-10 fixed-point number: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    /// Zero.
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    /// Creates a decimal from a mantissa and scale.
    ///
    /// Scales beyond [`MAX_SCALE`] are truncated toward zero.
    pub fn new(mantissa: i128, scale: u32) -> Self {
        let mut d = Decimal { mantissa, scale };
        while d.scale > MAX_SCALE {
            d.mantissa /= 10;
            d.scale -= 1;
        }
        d.normalize()
    }

    /// Returns the mantissa of the normalized value.
    pub fn mantissa(self) -> i128 {
        self.mantissa
    }

    /// Returns the number of fractional digits of the normalized value.
    pub fn scale(self) -> u32 {
        self.scale
    }

    /// Returns `true` if the value has no fractional part.
    pub fn is_integer(self) -> bool {
        self.scale == 0
    }

    /// Lossy conversion to `f64`.
    pub fn to_f64(self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    fn normalize(mut self) -> Self {
        if self.mantissa == 0 {
            return Decimal::ZERO;
        }
        while self.scale > 0 && self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.scale -= 1;
        }
        self
    }

    /// Mantissa rescaled to `scale`, if it fits.
    fn rescaled(self, scale: u32) -> Option<i128> {
        10i128
            .checked_pow(scale - self.scale)
            .and_then(|factor| self.mantissa.checked_mul(factor))
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::ZERO
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            // Only reachable near the i128 limits
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Decimal {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QuarryError::InvalidDecimal(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.len() as u32 > MAX_SCALE {
            return Err(invalid());
        }

        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = i128::from(c as u8 - b'0');
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or_else(invalid)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Ok(Decimal::new(mantissa, frac_part.len() as u32))
    }
}

impl TryFrom<f64> for Decimal {
    type Error = QuarryError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(QuarryError::InvalidDecimal(value.to_string()));
        }
        // `Display` for f64 prints the shortest round-tripping decimal form
        value.to_string().parse()
    }
}

impl Decimal {
    /// Rounds the shortest decimal form of `value` up (`up`) or down to at
    /// most [`MAX_SCALE`] fractional digits.
    ///
    /// `Err(true)` means the value lies above every representable decimal,
    /// `Err(false)` below. `value` must not be NaN.
    pub(crate) fn bound_from_f64(value: f64, up: bool) -> Result<Decimal, bool> {
        if value.is_infinite() {
            return Err(value > 0.0);
        }
        let text = value.to_string();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let kept = &frac_part[..frac_part.len().min(MAX_SCALE as usize)];

        let mut magnitude: i128 = 0;
        for b in int_part.bytes().chain(kept.bytes()) {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(b - b'0')))
                .ok_or(!negative)?;
        }
        // Truncation moved the value toward zero
        if kept.len() < frac_part.len() && up != negative {
            magnitude = magnitude.checked_add(1).ok_or(!negative)?;
        }
        let mantissa = if negative { -magnitude } else { magnitude };
        Ok(Decimal::new(mantissa, kept.len() as u32))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(i128::from(value), 0)
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Decimal::new(i128::from(value), 0)
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal::new(i128::from(value), 0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.mantissa < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}
