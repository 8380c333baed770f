//! `duration` values and their variable-length integer encoding.
//!
//! A duration is three zig-zag encoded vints: months, days, nanoseconds.
//! A vint's first byte carries, in its leading one bits, the number of
//! extra bytes that follow.

use std::fmt;

use crate::error::{ClientError, ClientResult};

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000 * NANOS_PER_MICRO;
const NANOS_PER_SECOND: i64 = 1_000 * NANOS_PER_MILLI;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

/// A duration of months, days and nanoseconds.
///
/// The three components always share a sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CqlDuration {
    months: i32,
    days: i32,
    nanoseconds: i64,
}

impl CqlDuration {
    /// Creates a duration, rejecting mixed signs.
    pub fn new(months: i32, days: i32, nanoseconds: i64) -> ClientResult<Self> {
        let all_non_negative = months >= 0 && days >= 0 && nanoseconds >= 0;
        let all_non_positive = months <= 0 && days <= 0 && nanoseconds <= 0;
        if !(all_non_negative || all_non_positive) {
            return Err(ClientError::decode(
                "duration",
                format!(
                    "components must share a sign: {} months, {} days, {} ns",
                    months, days, nanoseconds
                ),
            ));
        }
        Ok(Self {
            months,
            days,
            nanoseconds,
        })
    }

    /// Months component.
    pub fn months(&self) -> i32 {
        self.months
    }

    /// Days component.
    pub fn days(&self) -> i32 {
        self.days
    }

    /// Nanoseconds component.
    pub fn nanoseconds(&self) -> i64 {
        self.nanoseconds
    }

    /// Decodes the wire form.
    pub fn from_wire(bytes: &[u8]) -> ClientResult<Self> {
        let mut pos = 0;
        let mut next = |what: &str| {
            read_unsigned_vint(bytes, &mut pos)
                .map(zigzag_decode)
                .ok_or_else(|| ClientError::decode("duration", format!("truncated {}", what)))
        };
        let months = next("months")?;
        let days = next("days")?;
        let nanoseconds = next("nanoseconds")?;
        if pos != bytes.len() {
            return Err(ClientError::decode(
                "duration",
                format!("{} trailing bytes", bytes.len() - pos),
            ));
        }

        let months = i32::try_from(months)
            .map_err(|_| ClientError::decode("duration", "months out of range"))?;
        let days =
            i32::try_from(days).map_err(|_| ClientError::decode("duration", "days out of range"))?;
        Self::new(months, days, nanoseconds)
    }

    /// Encodes the wire form.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        write_unsigned_vint(zigzag_encode(i64::from(self.months)), &mut out);
        write_unsigned_vint(zigzag_encode(i64::from(self.days)), &mut out);
        write_unsigned_vint(zigzag_encode(self.nanoseconds), &mut out);
        out
    }

    fn is_negative(&self) -> bool {
        self.months < 0 || self.days < 0 || self.nanoseconds < 0
    }
}

impl fmt::Display for CqlDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::default() {
            return f.write_str("0s");
        }
        if self.is_negative() {
            f.write_str("-")?;
        }

        let months = self.months.unsigned_abs();
        let units = [
            (u64::from(months / 12), "y"),
            (u64::from(months % 12), "mo"),
            (u64::from(self.days.unsigned_abs()), "d"),
        ];
        for (amount, unit) in units {
            if amount != 0 {
                write!(f, "{}{}", amount, unit)?;
            }
        }

        let mut nanos = self.nanoseconds.unsigned_abs();
        for (size, unit) in [
            (NANOS_PER_HOUR, "h"),
            (NANOS_PER_MINUTE, "m"),
            (NANOS_PER_SECOND, "s"),
            (NANOS_PER_MILLI, "ms"),
            (NANOS_PER_MICRO, "us"),
            (1, "ns"),
        ] {
            let size = size as u64;
            let amount = nanos / size;
            nanos %= size;
            if amount != 0 {
                write!(f, "{}{}", amount, unit)?;
            }
        }
        Ok(())
    }
}

fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Reads one unsigned vint, advancing `pos`. `None` if truncated.
pub(crate) fn read_unsigned_vint(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let first = *bytes.get(*pos)?;
    *pos += 1;
    let extra = first.leading_ones();
    let mut value = u64::from(first) & (0xFF_u64 >> extra);
    for _ in 0..extra {
        let b = *bytes.get(*pos)?;
        *pos += 1;
        value = (value << 8) | u64::from(b);
    }
    Some(value)
}

/// Appends one unsigned vint.
pub(crate) fn write_unsigned_vint(value: u64, out: &mut Vec<u8>) {
    let magnitude = (value | 1).leading_zeros();
    let size = ((639 - magnitude * 9) >> 6) as usize;
    let extra = size as u32 - 1;
    let start = out.len();
    for i in 0..size {
        let shift = 8 * (size - 1 - i);
        let byte = if shift >= 64 { 0 } else { (value >> shift) as u8 };
        out.push(byte);
    }
    out[start] |= !(0xFF_u32 >> extra) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vint_sizes() {
        for (value, size) in [
            (0u64, 1usize),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (u64::from(u32::MAX), 5),
            (u64::MAX, 9),
        ] {
            let mut out = Vec::new();
            write_unsigned_vint(value, &mut out);
            assert_eq!(out.len(), size, "value {}", value);
            let mut pos = 0;
            assert_eq!(read_unsigned_vint(&out, &mut pos), Some(value));
            assert_eq!(pos, size);
        }
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_decode(zigzag_encode(i64::MIN)), i64::MIN);
        assert_eq!(zigzag_decode(zigzag_encode(i64::MAX)), i64::MAX);
    }

    #[test]
    fn test_duration_wire() {
        let d = CqlDuration::new(14, 3, 5 * NANOS_PER_HOUR + 7).unwrap();
        let decoded = CqlDuration::from_wire(&d.to_wire()).unwrap();
        assert_eq!(decoded, d);
        assert_eq!(decoded.months(), 14);
    }

    #[test]
    fn test_duration_known_bytes() {
        // 1 month, 2 days, 3 ns
        let d = CqlDuration::from_wire(&[0x02, 0x04, 0x06]).unwrap();
        assert_eq!(d, CqlDuration::new(1, 2, 3).unwrap());
    }

    #[test]
    fn test_duration_malformed() {
        assert!(CqlDuration::from_wire(&[0x02, 0x04]).is_err());
        assert!(CqlDuration::from_wire(&[0x02, 0x04, 0x06, 0x00]).is_err());
        assert!(CqlDuration::from_wire(&[0x80]).is_err());
        // mixed signs: +1 month, -1 day
        assert!(CqlDuration::from_wire(&[0x02, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_duration_display() {
        let d = CqlDuration::new(14, 3, NANOS_PER_HOUR + 2 * NANOS_PER_MILLI).unwrap();
        assert_eq!(d.to_string(), "1y2mo3d1h2ms");
        let neg = CqlDuration::new(0, -1, -30 * NANOS_PER_SECOND).unwrap();
        assert_eq!(neg.to_string(), "-1d30s");
        assert_eq!(CqlDuration::default().to_string(), "0s");
    }
}
