//! Typed accessors over one column value.
//!
//! A [`Cell`] pairs the raw bytes of a column with its declared type. The
//! declared type, never the requested client type, selects the decode
//! path. Null is checked before any conversion: numeric accessors return
//! zero or `false`, object accessors return `None`.

use std::net::IpAddr;

use bytes::Bytes;
use tracing::trace;
use uuid::Uuid;

use super::decode::{
    decode_boolean, decode_date, decode_decimal, decode_double, decode_float, decode_i64,
    decode_inet, decode_int, decode_smallint, decode_text, decode_time, decode_timestamp,
    decode_tinyint, decode_uuid, decode_value, decode_varint,
};
use super::duration::CqlDuration;
use super::numeric::{Decimal, Varint};
use super::temporal::{SqlDate, SqlTime, SqlTimestamp};
use super::value::{TupleValue, UdtValue, Value, ValueMap, ValueSet};
use crate::error::{ClientError, ClientResult};
use crate::types::{ColumnType, TypeKind};

/// One column of one row: name, declared type and raw bytes.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    name: &'a str,
    ty: &'a ColumnType,
    raw: Option<&'a [u8]>,
}

impl<'a> Cell<'a> {
    /// Creates a cell. `None` bytes are null.
    pub fn new(name: &'a str, ty: &'a ColumnType, raw: Option<&'a [u8]>) -> Self {
        Self { name, ty, raw }
    }

    /// Column name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Declared type.
    pub fn column_type(&self) -> &'a ColumnType {
        self.ty
    }

    /// Returns true if the value is absent.
    pub fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// Raw bytes, if present.
    pub fn raw(&self) -> Option<&'a [u8]> {
        self.raw
    }

    fn mismatch(&self, requested: &'static str) -> ClientError {
        ClientError::TypeMismatch {
            column: self.name.to_string(),
            declared: self.ty.to_string(),
            requested,
        }
    }

    /// Decodes the value in its general form.
    ///
    /// Total over every declared type; a custom type reads as null.
    pub fn object(&self) -> ClientResult<Value> {
        decode_value(self.ty, self.raw)
    }

    /// Reads a `boolean`. Null is `false`.
    pub fn boolean(&self) -> ClientResult<bool> {
        let Some(bytes) = self.raw else {
            return Ok(false);
        };
        match self.ty.kind() {
            TypeKind::Boolean => decode_boolean(bytes),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Reads a `tinyint`. Null is zero.
    pub fn byte(&self) -> ClientResult<i8> {
        let Some(bytes) = self.raw else {
            return Ok(0);
        };
        match self.ty.kind() {
            TypeKind::TinyInt => decode_tinyint(bytes),
            _ => Err(self.mismatch("i8")),
        }
    }

    /// Reads a `smallint`, widening `tinyint`. Null is zero.
    pub fn short(&self) -> ClientResult<i16> {
        let Some(bytes) = self.raw else {
            return Ok(0);
        };
        match self.ty.kind() {
            TypeKind::SmallInt => decode_smallint(bytes),
            TypeKind::TinyInt => decode_tinyint(bytes).map(i16::from),
            _ => Err(self.mismatch("i16")),
        }
    }

    /// Reads a 32-bit integer leniently.
    ///
    /// Any range or format failure reads as zero instead of an error, so a
    /// malformed value never aborts row iteration. Text columns are parsed.
    /// Only a type with no integer reading at all is an error.
    pub fn int_lenient(&self) -> ClientResult<i32> {
        let Some(bytes) = self.raw else {
            return Ok(0);
        };
        let parsed = match self.ty.kind() {
            TypeKind::Int => decode_int(bytes),
            TypeKind::SmallInt => decode_smallint(bytes).map(i32::from),
            TypeKind::TinyInt => decode_tinyint(bytes).map(i32::from),
            TypeKind::Varint => decode_varint(bytes).and_then(|v| {
                v.to_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| ClientError::decode("varint", "out of int range"))
            }),
            kind if kind.is_text() => decode_text(kind, bytes).and_then(|s| {
                s.trim()
                    .parse::<i32>()
                    .map_err(|e| ClientError::decode(kind.name(), e.to_string()))
            }),
            _ => return Err(self.mismatch("i32")),
        };
        Ok(parsed.unwrap_or_else(|e| {
            trace!(column = self.name, error = %e, "int read failed, returning 0");
            0
        }))
    }

    /// Reads a 64-bit integer.
    ///
    /// `int` columns are sign-extended, `varint` columns are narrowed to
    /// their low 64 bits, and every other type is decoded as exactly eight
    /// bytes. Null is zero.
    pub fn wide_integer(&self) -> ClientResult<i64> {
        let Some(bytes) = self.raw else {
            return Ok(0);
        };
        match self.ty.kind() {
            TypeKind::Int => decode_int(bytes).map(i64::from),
            TypeKind::Varint => decode_varint(bytes).map(|v| v.to_i64_wrapping()),
            kind => decode_i64(kind.name(), bytes),
        }
    }

    /// Reads a `float`. Null is zero.
    pub fn float(&self) -> ClientResult<f32> {
        let Some(bytes) = self.raw else {
            return Ok(0.0);
        };
        match self.ty.kind() {
            TypeKind::Float => decode_float(bytes),
            _ => Err(self.mismatch("f32")),
        }
    }

    /// Reads a 64-bit float.
    ///
    /// `float` columns are decoded at single precision and widened; every
    /// other type is decoded as an eight-byte double. Null is zero.
    pub fn wide_float(&self) -> ClientResult<f64> {
        let Some(bytes) = self.raw else {
            return Ok(0.0);
        };
        match self.ty.kind() {
            TypeKind::Float => decode_float(bytes).map(f64::from),
            kind => decode_double(kind.name(), bytes),
        }
    }

    /// Reads a `decimal`, optionally rescaled exactly.
    pub fn decimal(&self, scale: Option<i32>) -> ClientResult<Option<Decimal>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        let decimal = match self.ty.kind() {
            TypeKind::Decimal => decode_decimal(bytes)?,
            TypeKind::Varint => Decimal::new(decode_varint(bytes)?, 0),
            _ => return Err(self.mismatch("Decimal")),
        };
        match scale {
            Some(scale) => decimal.with_scale(scale).map(Some),
            None => Ok(Some(decimal)),
        }
    }

    /// Reads a `varint`.
    pub fn varint(&self) -> ClientResult<Option<Varint>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Varint => decode_varint(bytes).map(Some),
            _ => Err(self.mismatch("Varint")),
        }
    }

    /// Renders the value as text.
    ///
    /// Uses the type's own text form first. If that fails, falls back to the
    /// `Display` form of [`object`](Self::object), which reads a custom type
    /// as null.
    pub fn text(&self) -> ClientResult<Option<String>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.natural_text(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                trace!(column = self.name, error = %e, "text rendering falls back to object form");
                match self.object()? {
                    Value::Null => Ok(None),
                    value => Ok(Some(value.to_string())),
                }
            }
        }
    }

    fn natural_text(&self, bytes: &[u8]) -> ClientResult<String> {
        let kind = self.ty.kind();
        if kind.is_text() {
            return decode_text(kind, bytes);
        }
        if kind == TypeKind::Custom || kind.is_collection() || kind.is_structure() {
            return Err(ClientError::decode(kind.name(), "no text form"));
        }
        decode_value(self.ty, Some(bytes)).map(|v| v.to_string())
    }

    /// Returns the raw bytes of a `blob` or custom column.
    pub fn bytes(&self) -> ClientResult<Option<Bytes>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Blob | TypeKind::Custom => Ok(Some(Bytes::copy_from_slice(bytes))),
            _ => Err(self.mismatch("Bytes")),
        }
    }

    /// Reads a `uuid` or `timeuuid`.
    pub fn uuid(&self) -> ClientResult<Option<Uuid>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            kind @ (TypeKind::Uuid | TypeKind::TimeUuid) => decode_uuid(kind.name(), bytes).map(Some),
            _ => Err(self.mismatch("Uuid")),
        }
    }

    /// Reads an `inet`.
    pub fn inet(&self) -> ClientResult<Option<IpAddr>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Inet => decode_inet(bytes).map(Some),
            _ => Err(self.mismatch("IpAddr")),
        }
    }

    /// Reads a `date`.
    pub fn date(&self) -> ClientResult<Option<SqlDate>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Date => decode_date(bytes).map(Some),
            _ => Err(self.mismatch("SqlDate")),
        }
    }

    /// Reads a `time` at millisecond precision.
    pub fn time(&self) -> ClientResult<Option<SqlTime>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Time => decode_time(bytes).map(Some),
            _ => Err(self.mismatch("SqlTime")),
        }
    }

    /// Reads a `timestamp`.
    pub fn timestamp(&self) -> ClientResult<Option<SqlTimestamp>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Timestamp => decode_timestamp(bytes).map(Some),
            _ => Err(self.mismatch("SqlTimestamp")),
        }
    }

    /// Reads a `duration`.
    pub fn duration(&self) -> ClientResult<Option<CqlDuration>> {
        let Some(bytes) = self.raw else {
            return Ok(None);
        };
        match self.ty.kind() {
            TypeKind::Duration => CqlDuration::from_wire(bytes).map(Some),
            _ => Err(self.mismatch("CqlDuration")),
        }
    }

    /// Reads a `list`. Null is `None`; an empty list is `Some(vec![])`.
    pub fn list(&self) -> ClientResult<Option<Vec<Value>>> {
        match self.collection("Vec<Value>", TypeKind::List)? {
            Some(Value::List(items)) => Ok(Some(items)),
            _ => Ok(None),
        }
    }

    /// Reads a `set`.
    pub fn set(&self) -> ClientResult<Option<ValueSet>> {
        match self.collection("ValueSet", TypeKind::Set)? {
            Some(Value::Set(items)) => Ok(Some(items)),
            _ => Ok(None),
        }
    }

    /// Reads a `map`.
    pub fn map(&self) -> ClientResult<Option<ValueMap>> {
        match self.collection("ValueMap", TypeKind::Map)? {
            Some(Value::Map(entries)) => Ok(Some(entries)),
            _ => Ok(None),
        }
    }

    /// Reads a user-defined type value.
    pub fn udt(&self) -> ClientResult<Option<UdtValue>> {
        match self.collection("UdtValue", TypeKind::Udt)? {
            Some(Value::Udt(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    /// Reads a tuple value.
    pub fn tuple(&self) -> ClientResult<Option<TupleValue>> {
        match self.collection("TupleValue", TypeKind::Tuple)? {
            Some(Value::Tuple(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    fn collection(&self, requested: &'static str, kind: TypeKind) -> ClientResult<Option<Value>> {
        if self.ty.kind() != kind {
            return Err(self.mismatch(requested));
        }
        if self.raw.is_none() {
            return Ok(None);
        }
        self.object().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode::encode_value;

    fn encoded(ty: &ColumnType, value: Value) -> Vec<u8> {
        encode_value(ty, &value).unwrap().unwrap().to_vec()
    }

    #[test]
    fn test_wide_integer_sign_extends_int() {
        let ty = ColumnType::Int;
        for v in [0, -1, i32::MAX, i32::MIN] {
            let bytes = v.to_be_bytes();
            let cell = Cell::new("n", &ty, Some(&bytes));
            assert_eq!(cell.wide_integer().unwrap(), i64::from(v));
        }
    }

    #[test]
    fn test_wide_integer_paths() {
        let varint = ColumnType::Varint;
        let big: Varint = "-12345678901".parse().unwrap();
        let bytes = big.to_signed_bytes_be();
        assert_eq!(
            Cell::new("v", &varint, Some(&bytes)).wide_integer().unwrap(),
            -12_345_678_901
        );

        let ts = ColumnType::Timestamp;
        let bytes = 1_234i64.to_be_bytes();
        assert_eq!(Cell::new("t", &ts, Some(&bytes)).wide_integer().unwrap(), 1_234);

        // Declared type selects the width; 4 bytes are not a bigint.
        let bigint = ColumnType::BigInt;
        let short = 5i32.to_be_bytes();
        assert!(Cell::new("b", &bigint, Some(&short)).wide_integer().unwrap_err().is_decode());
    }

    #[test]
    fn test_wide_float_widens_float() {
        let ty = ColumnType::Float;
        let bytes = 1.23456f32.to_be_bytes();
        let value = Cell::new("f", &ty, Some(&bytes)).wide_float().unwrap();
        assert_eq!(value, f64::from(1.23456f32));
        assert_ne!(value, 1.23456f64);

        let double = ColumnType::Double;
        let bytes = 2.5f64.to_be_bytes();
        assert_eq!(Cell::new("d", &double, Some(&bytes)).wide_float().unwrap(), 2.5);
    }

    #[test]
    fn test_int_lenient() {
        let text = ColumnType::Text;
        assert_eq!(Cell::new("s", &text, Some(b" 42 ")).int_lenient().unwrap(), 42);
        assert_eq!(Cell::new("s", &text, Some(b"forty")).int_lenient().unwrap(), 0);
        assert_eq!(Cell::new("s", &text, Some(b"99999999999")).int_lenient().unwrap(), 0);

        let int = ColumnType::Int;
        assert_eq!(Cell::new("i", &int, Some(&[0, 1])).int_lenient().unwrap(), 0);
        assert_eq!(Cell::new("i", &int, None).int_lenient().unwrap(), 0);

        let varint = ColumnType::Varint;
        let huge: Varint = "1000000000000000000000000000000".parse().unwrap();
        let huge = huge.to_signed_bytes_be();
        assert_eq!(Cell::new("v", &varint, Some(&huge)).int_lenient().unwrap(), 0);

        let uuid = ColumnType::Uuid;
        assert!(matches!(
            Cell::new("u", &uuid, Some(&[0; 16])).int_lenient(),
            Err(ClientError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_null_checked_before_conversion() {
        for ty in [ColumnType::Time, ColumnType::Date, ColumnType::Timestamp] {
            let cell = Cell::new("t", &ty, None);
            assert!(cell.is_null());
            assert_eq!(cell.time().ok().flatten(), None);
            assert_eq!(cell.date().ok().flatten(), None);
            assert_eq!(cell.timestamp().ok().flatten(), None);
            assert_eq!(cell.wide_integer().unwrap(), 0);
        }
    }

    #[test]
    fn test_time_floors() {
        let ty = ColumnType::Time;
        let bytes = 1_999_999i64.to_be_bytes();
        let time = Cell::new("t", &ty, Some(&bytes)).time().unwrap().unwrap();
        assert_eq!(time.millis(), 1);
    }

    #[test]
    fn test_text_paths() {
        let int = ColumnType::Int;
        let bytes = 7i32.to_be_bytes();
        assert_eq!(Cell::new("i", &int, Some(&bytes)).text().unwrap().as_deref(), Some("7"));

        let list = ColumnType::list(ColumnType::Text);
        let bytes = encoded(
            &list,
            Value::List(vec![Value::Text("a".into()), Value::Text("b".into())]),
        );
        assert_eq!(
            Cell::new("l", &list, Some(&bytes)).text().unwrap().as_deref(),
            Some("[a, b]")
        );

        let custom = ColumnType::Custom("x.Y".into());
        assert_eq!(Cell::new("c", &custom, Some(b"raw")).text().unwrap(), None);
    }

    #[test]
    fn test_decimal_rescale() {
        let ty = ColumnType::Decimal;
        let bytes = encoded(&ty, Value::Decimal("2.50".parse().unwrap()));
        let cell = Cell::new("d", &ty, Some(&bytes));
        assert_eq!(cell.decimal(Some(1)).unwrap().unwrap().to_string(), "2.5");
        assert!(matches!(
            cell.decimal(Some(0)),
            Err(ClientError::InvalidScale { .. })
        ));
    }

    #[test]
    fn test_collection_accessors() {
        let ty = ColumnType::set(ColumnType::Int);
        let cell = Cell::new("s", &ty, Some(&[]));
        assert!(cell.set().unwrap().unwrap().is_empty());
        assert!(matches!(cell.list(), Err(ClientError::TypeMismatch { .. })));
        assert_eq!(Cell::new("s", &ty, None).set().unwrap(), None);
    }

    #[test]
    fn test_type_mismatch_message() {
        let ty = ColumnType::Text;
        let err = Cell::new("name", &ty, Some(b"x")).boolean().unwrap_err();
        assert_eq!(err.to_string(), "cannot read text column 'name' as bool");
    }
}
