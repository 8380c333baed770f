//! Arbitrary-precision integers and decimals.
//!
//! Wire form of `varint` is big-endian two's complement of minimal length.
//! `decimal` is a 4-byte big-endian scale followed by a `varint` unscaled
//! value; the number is `unscaled * 10^-scale`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, ClientResult};

const DECIMAL_CHUNK: u32 = 1_000_000_000;

/// Largest number of digits [`Decimal::with_scale`] may append.
const MAX_RESCALE_DIGITS: i64 = 4096;

/// Plain rendering is used down to this adjusted exponent.
const MIN_PLAIN_EXPONENT: i64 = -6;

/// Arbitrary-precision signed integer.
///
/// Stored as sign and magnitude with 32-bit little-endian limbs. The
/// magnitude never has trailing zero limbs, and zero is never negative, so
/// structural equality is numeric equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Varint {
    negative: bool,
    magnitude: Vec<u32>,
}

impl Varint {
    /// Zero.
    pub const fn zero() -> Self {
        Self {
            negative: false,
            magnitude: Vec::new(),
        }
    }

    /// Decodes big-endian two's complement bytes. Empty input is zero.
    pub fn from_signed_bytes_be(bytes: &[u8]) -> Self {
        let negative = bytes.first().map_or(false, |b| b & 0x80 != 0);
        let mut raw = bytes.to_vec();
        if negative {
            negate_twos_complement(&mut raw);
        }

        let mut magnitude = Vec::with_capacity(raw.len() / 4 + 1);
        for chunk in raw.rchunks(4) {
            let limb = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
            magnitude.push(limb);
        }

        let mut value = Self {
            negative,
            magnitude,
        };
        value.normalize();
        value
    }

    /// Encodes as minimal big-endian two's complement.
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        if self.is_zero() {
            return vec![0];
        }

        let mut bytes: Vec<u8> = self
            .magnitude
            .iter()
            .rev()
            .flat_map(|limb| limb.to_be_bytes())
            .skip_while(|&b| b == 0)
            .collect();

        if self.negative {
            negate_twos_complement(&mut bytes);
            if bytes[0] & 0x80 == 0 {
                bytes.insert(0, 0xFF);
            }
            // Drop redundant sign bytes, e.g. -128 is 0x80 not 0xFF80.
            while bytes.len() > 1 && bytes[0] == 0xFF && bytes[1] & 0x80 != 0 {
                bytes.remove(0);
            }
        } else if bytes[0] & 0x80 != 0 {
            bytes.insert(0, 0);
        }
        bytes
    }

    /// Returns true if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// Number of decimal digits in the magnitude; 1 for zero.
    pub fn digit_count(&self) -> usize {
        let text = self.to_string();
        text.len() - usize::from(self.negative)
    }

    /// Returns true if the value is below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns the value if it fits in an `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        if self.magnitude.len() > 2 {
            return None;
        }
        let low = self.low_u64();
        if self.negative {
            if low <= 1u64 << 63 {
                Some((low as i64).wrapping_neg())
            } else {
                None
            }
        } else {
            i64::try_from(low).ok()
        }
    }

    /// Returns the low 64 bits of the two's complement representation.
    ///
    /// Values outside the `i64` range wrap.
    pub fn to_i64_wrapping(&self) -> i64 {
        let low = self.low_u64();
        if self.negative {
            low.wrapping_neg() as i64
        } else {
            low as i64
        }
    }

    /// Converts to the nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        let magnitude = self
            .magnitude
            .iter()
            .rev()
            .fold(0f64, |acc, &limb| acc * 4_294_967_296.0 + f64::from(limb));
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    fn low_u64(&self) -> u64 {
        let low = self.magnitude.first().copied().unwrap_or(0);
        let high = self.magnitude.get(1).copied().unwrap_or(0);
        (u64::from(high) << 32) | u64::from(low)
    }

    fn normalize(&mut self) {
        while self.magnitude.last() == Some(&0) {
            self.magnitude.pop();
        }
        if self.magnitude.is_empty() {
            self.negative = false;
        }
    }

    /// `self = self * factor + addend` on the magnitude.
    fn mul_add_small(&mut self, factor: u32, addend: u32) {
        let mut carry = u64::from(addend);
        for limb in &mut self.magnitude {
            let product = u64::from(*limb) * u64::from(factor) + carry;
            *limb = product as u32;
            carry = product >> 32;
        }
        if carry != 0 {
            self.magnitude.push(carry as u32);
        }
        self.normalize();
    }

    /// Divides the magnitude in place and returns the remainder.
    fn div_rem_small(&mut self, divisor: u32) -> u32 {
        let mut remainder = 0u64;
        for limb in self.magnitude.iter_mut().rev() {
            let current = (remainder << 32) | u64::from(*limb);
            *limb = (current / u64::from(divisor)) as u32;
            remainder = current % u64::from(divisor);
        }
        self.normalize();
        remainder as u32
    }

    fn magnitude_cmp(&self, other: &Self) -> Ordering {
        self.magnitude
            .len()
            .cmp(&other.magnitude.len())
            .then_with(|| self.magnitude.iter().rev().cmp(other.magnitude.iter().rev()))
    }
}

/// Two's complement negation in place: invert, then add one.
fn negate_twos_complement(bytes: &mut [u8]) {
    for b in bytes.iter_mut() {
        *b = !*b;
    }
    for b in bytes.iter_mut().rev() {
        let (sum, overflow) = b.overflowing_add(1);
        *b = sum;
        if !overflow {
            break;
        }
    }
}

impl From<i64> for Varint {
    fn from(v: i64) -> Self {
        let magnitude = v.unsigned_abs();
        let mut value = Self {
            negative: v < 0,
            magnitude: vec![magnitude as u32, (magnitude >> 32) as u32],
        };
        value.normalize();
        value
    }
}

impl Ord for Varint {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.magnitude_cmp(other),
            (true, true) => other.magnitude_cmp(self),
        }
    }
}

impl PartialOrd for Varint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Varint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut rest = self.clone();
        let mut chunks = Vec::new();
        while !rest.is_zero() {
            chunks.push(rest.div_rem_small(DECIMAL_CHUNK));
        }
        if self.negative {
            f.write_str("-")?;
        }
        let mut iter = chunks.iter().rev();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for chunk in iter {
            write!(f, "{:09}", chunk)?;
        }
        Ok(())
    }
}

impl FromStr for Varint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClientError::decode("varint", format!("invalid integer '{}'", s)));
        }

        let mut value = Varint::zero();
        for b in digits.bytes() {
            value.mul_add_small(10, u32::from(b - b'0'));
        }
        value.negative = negative;
        value.normalize();
        Ok(value)
    }
}

/// Arbitrary-precision decimal: `unscaled * 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: Varint,
    scale: i32,
}

impl Decimal {
    /// Creates a decimal from its unscaled value and scale.
    pub fn new(unscaled: Varint, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    /// Returns the unscaled value.
    pub fn unscaled(&self) -> &Varint {
        &self.unscaled
    }

    /// Returns the scale.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Decodes the wire form: 4-byte scale then the unscaled varint.
    pub fn from_wire(bytes: &[u8]) -> ClientResult<Self> {
        if bytes.len() < 5 {
            return Err(ClientError::decode(
                "decimal",
                format!("expected at least 5 bytes, got {}", bytes.len()),
            ));
        }
        let scale = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(Self::new(Varint::from_signed_bytes_be(&bytes[4..]), scale))
    }

    /// Encodes the wire form.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = self.scale.to_be_bytes().to_vec();
        out.extend(self.unscaled.to_signed_bytes_be());
        out
    }

    /// Returns an equal value with the given scale.
    ///
    /// Fails with `InvalidScale` if dropping digits would change the value,
    /// or if more than a few thousand digits would have to be appended.
    pub fn with_scale(&self, scale: i32) -> ClientResult<Self> {
        if scale == self.scale {
            return Ok(self.clone());
        }
        if self.unscaled.is_zero() {
            return Ok(Self::new(Varint::zero(), scale));
        }
        let invalid = || ClientError::InvalidScale {
            from: self.scale,
            scale,
        };

        let delta = i64::from(scale) - i64::from(self.scale);
        let negative = self.unscaled.negative;
        let mut unscaled = self.unscaled.clone();
        if delta > 0 {
            if delta > MAX_RESCALE_DIGITS {
                return Err(invalid());
            }
            let mut remaining = delta;
            while remaining > 0 {
                let step = remaining.min(9);
                unscaled.mul_add_small(10u32.pow(step as u32), 0);
                remaining -= step;
            }
        } else {
            // A non-zero value has fewer trailing zeros than digits.
            if -delta >= self.unscaled.digit_count() as i64 {
                return Err(invalid());
            }
            for _ in 0..-delta {
                if unscaled.div_rem_small(10) != 0 {
                    return Err(invalid());
                }
            }
        }
        unscaled.negative = negative;
        unscaled.normalize();
        Ok(Self::new(unscaled, scale))
    }

    /// Converts to the nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        // Parsing the plain rendering rounds correctly for any scale.
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Self::new(Varint::from(v), 0)
    }
}

/// Plain notation while the scale is non-negative and the adjusted
/// exponent is at least -6, scientific notation (`1.5E+3`, `1E-9`)
/// otherwise. Output length is bounded by the digit count.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = {
            let mut magnitude = self.unscaled.clone();
            magnitude.negative = false;
            magnitude.to_string()
        };
        if self.unscaled.is_negative() {
            f.write_str("-")?;
        }

        let adjusted = (digits.len() as i64 - 1) - i64::from(self.scale);
        if self.scale >= 0 && adjusted >= MIN_PLAIN_EXPONENT {
            let scale = self.scale as usize;
            if scale == 0 {
                return f.write_str(&digits);
            }
            return if digits.len() > scale {
                let (int_part, frac_part) = digits.split_at(digits.len() - scale);
                write!(f, "{}.{}", int_part, frac_part)
            } else {
                write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
            };
        }

        let (first, rest) = digits.split_at(1);
        f.write_str(first)?;
        if !rest.is_empty() {
            write!(f, ".{}", rest)?;
        }
        if adjusted >= 0 {
            write!(f, "E+{}", adjusted)
        } else {
            write!(f, "E{}", adjusted)
        }
    }
}

impl FromStr for Decimal {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::decode("decimal", format!("invalid decimal '{}'", s));
        let trimmed = s.trim();
        let (mantissa, exponent) = match trimmed.find(|c| c == 'e' || c == 'E') {
            Some(pos) => (
                &trimmed[..pos],
                trimmed[pos + 1..].parse::<i32>().map_err(|_| invalid())?,
            ),
            None => (trimmed, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (mantissa, ""),
        };
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let digits_only = matches!(int_part, "" | "-" | "+");
        if digits_only && frac_part.is_empty() {
            return Err(invalid());
        }
        let int_digits = if digits_only {
            format!("{}0", int_part)
        } else {
            int_part.to_string()
        };
        let unscaled: Varint = format!("{}{}", int_digits, frac_part)
            .parse()
            .map_err(|_| invalid())?;
        let frac_len = i32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let scale = frac_len.checked_sub(exponent).ok_or_else(invalid)?;
        Ok(Self::new(unscaled, scale))
    }
}
