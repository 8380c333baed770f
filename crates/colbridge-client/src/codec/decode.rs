//! Wire decoding: one routine per type kind.
//!
//! Fixed-width types validate their exact width. Collections are an `i32`
//! element count followed by `[i32 length][bytes]` items (a negative length
//! is a null item); maps carry two items per entry. User-defined types and
//! tuples are a bare sequence of `[i32 length][bytes]` fields.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::Bytes;
use tracing::trace;
use uuid::Uuid;

use super::duration::CqlDuration;
use super::numeric::{Decimal, Varint};
use super::temporal::{SqlDate, SqlTime, SqlTimestamp};
use super::value::{TupleValue, UdtValue, Value, ValueMap, ValueSet};
use crate::error::{ClientError, ClientResult};
use crate::types::{ColumnType, TypeKind};

/// Copies exactly `N` bytes, failing on any other length.
pub fn fixed<const N: usize>(type_name: &str, bytes: &[u8]) -> ClientResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| ClientError::width(type_name, N, bytes.len()))
}

/// Decodes a `boolean`.
pub fn decode_boolean(bytes: &[u8]) -> ClientResult<bool> {
    Ok(fixed::<1>("boolean", bytes)?[0] != 0)
}

/// Decodes a `tinyint`.
pub fn decode_tinyint(bytes: &[u8]) -> ClientResult<i8> {
    Ok(i8::from_be_bytes(fixed("tinyint", bytes)?))
}

/// Decodes a `smallint`.
pub fn decode_smallint(bytes: &[u8]) -> ClientResult<i16> {
    Ok(i16::from_be_bytes(fixed("smallint", bytes)?))
}

/// Decodes an `int`.
pub fn decode_int(bytes: &[u8]) -> ClientResult<i32> {
    Ok(i32::from_be_bytes(fixed("int", bytes)?))
}

/// Decodes any 8-byte integer (`bigint`, `counter`, `timestamp`, `time`).
pub fn decode_i64(type_name: &str, bytes: &[u8]) -> ClientResult<i64> {
    Ok(i64::from_be_bytes(fixed(type_name, bytes)?))
}

/// Decodes a `float`.
pub fn decode_float(bytes: &[u8]) -> ClientResult<f32> {
    Ok(f32::from_be_bytes(fixed("float", bytes)?))
}

/// Decodes 8 bytes as a `double`.
pub fn decode_double(type_name: &str, bytes: &[u8]) -> ClientResult<f64> {
    Ok(f64::from_be_bytes(fixed(type_name, bytes)?))
}

/// Decodes a `uuid` or `timeuuid`.
pub fn decode_uuid(type_name: &str, bytes: &[u8]) -> ClientResult<Uuid> {
    Ok(Uuid::from_bytes(fixed(type_name, bytes)?))
}

/// Decodes an `inet`: 4 bytes for IPv4, 16 for IPv6.
pub fn decode_inet(bytes: &[u8]) -> ClientResult<IpAddr> {
    match bytes.len() {
        4 => Ok(IpAddr::V4(Ipv4Addr::from(fixed::<4>("inet", bytes)?))),
        16 => Ok(IpAddr::V6(Ipv6Addr::from(fixed::<16>("inet", bytes)?))),
        n => Err(ClientError::decode(
            "inet",
            format!("expected 4 or 16 bytes, got {}", n),
        )),
    }
}

/// Decodes a `date`.
pub fn decode_date(bytes: &[u8]) -> ClientResult<SqlDate> {
    SqlDate::from_wire(u32::from_be_bytes(fixed("date", bytes)?))
}

/// Decodes a `time`, flooring nanoseconds to milliseconds.
pub fn decode_time(bytes: &[u8]) -> ClientResult<SqlTime> {
    SqlTime::from_nanos(decode_i64("time", bytes)?)
}

/// Decodes a `timestamp`.
pub fn decode_timestamp(bytes: &[u8]) -> ClientResult<SqlTimestamp> {
    Ok(SqlTimestamp::from_millis(decode_i64("timestamp", bytes)?))
}

/// Decodes `ascii`, `text` or `varchar`.
pub fn decode_text(kind: TypeKind, bytes: &[u8]) -> ClientResult<String> {
    if kind == TypeKind::Ascii && !bytes.is_ascii() {
        return Err(ClientError::decode("ascii", "non-ASCII byte"));
    }
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ClientError::decode(kind.name(), format!("invalid UTF-8: {}", e)))
}

/// Decodes a `varint`.
pub fn decode_varint(bytes: &[u8]) -> ClientResult<Varint> {
    if bytes.is_empty() {
        return Err(ClientError::decode("varint", "empty value"));
    }
    Ok(Varint::from_signed_bytes_be(bytes))
}

/// Decodes a `decimal`.
pub fn decode_decimal(bytes: &[u8]) -> ClientResult<Decimal> {
    Decimal::from_wire(bytes)
}

/// Renders the bytes of a custom-typed collection element as text.
///
/// Non-printable characters become spaces, runs of whitespace collapse to
/// one space, and the result is trimmed.
pub fn clean_custom_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(decoded.len());
    let mut pending_space = false;
    for c in decoded.chars() {
        if c.is_control() || c.is_whitespace() || c == char::REPLACEMENT_CHARACTER {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Decodes a column value. `None` bytes are null.
///
/// A top-level custom type has no registered codec and reads as null.
pub fn decode_value(ty: &ColumnType, bytes: Option<&[u8]>) -> ClientResult<Value> {
    match (ty, bytes) {
        (_, None) => Ok(Value::Null),
        (ColumnType::Custom(class), Some(_)) => {
            trace!(class = %class, "custom type without codec reads as null");
            Ok(Value::Null)
        }
        (ty, Some(bytes)) => decode_present(ty, bytes),
    }
}

/// Decodes one element of a collection, tuple or user-defined type.
///
/// Unlike [`decode_value`], a custom element type decodes as cleaned text.
pub fn decode_element(ty: &ColumnType, bytes: Option<&[u8]>) -> ClientResult<Value> {
    match (ty, bytes) {
        (_, None) => Ok(Value::Null),
        (ColumnType::Custom(_), Some(bytes)) => Ok(Value::Text(clean_custom_text(bytes))),
        (ty, Some(bytes)) => decode_present(ty, bytes),
    }
}

fn decode_present(ty: &ColumnType, bytes: &[u8]) -> ClientResult<Value> {
    let value = match ty {
        ColumnType::Custom(_) => Value::Bytes(Bytes::copy_from_slice(bytes)),
        ColumnType::Ascii | ColumnType::Text | ColumnType::Varchar => {
            Value::Text(decode_text(ty.kind(), bytes)?)
        }
        ColumnType::BigInt | ColumnType::Counter => {
            Value::BigInt(decode_i64(ty.kind().name(), bytes)?)
        }
        ColumnType::Blob => Value::Bytes(Bytes::copy_from_slice(bytes)),
        ColumnType::Boolean => Value::Boolean(decode_boolean(bytes)?),
        ColumnType::Decimal => Value::Decimal(decode_decimal(bytes)?),
        ColumnType::Double => Value::Double(decode_double("double", bytes)?),
        ColumnType::Float => Value::Float(decode_float(bytes)?),
        ColumnType::Int => Value::Int(decode_int(bytes)?),
        ColumnType::Timestamp => Value::Timestamp(decode_timestamp(bytes)?),
        ColumnType::Uuid | ColumnType::TimeUuid => {
            Value::Uuid(decode_uuid(ty.kind().name(), bytes)?)
        }
        ColumnType::Varint => Value::Varint(decode_varint(bytes)?),
        ColumnType::Inet => Value::Inet(decode_inet(bytes)?),
        ColumnType::Date => Value::Date(decode_date(bytes)?),
        ColumnType::Time => Value::Time(decode_time(bytes)?),
        ColumnType::SmallInt => Value::SmallInt(decode_smallint(bytes)?),
        ColumnType::TinyInt => Value::TinyInt(decode_tinyint(bytes)?),
        ColumnType::Duration => Value::Duration(CqlDuration::from_wire(bytes)?),
        ColumnType::List(element) => Value::List(decode_elements(ty, element, bytes)?),
        ColumnType::Set(element) => {
            Value::Set(decode_elements(ty, element, bytes)?.into_iter().collect::<ValueSet>())
        }
        ColumnType::Map(key, value) => Value::Map(decode_map(ty, key, value, bytes)?),
        ColumnType::Udt(def) => {
            let fields = read_fields(ty, bytes)?;
            if fields.len() > def.fields.len() {
                return Err(ClientError::decode(
                    ty.to_string(),
                    format!(
                        "{} fields for a type with {}",
                        fields.len(),
                        def.fields.len()
                    ),
                ));
            }
            Value::Udt(UdtValue::new(def.clone(), fields))
        }
        ColumnType::Tuple(types) => {
            let elements = read_fields(ty, bytes)?;
            if elements.len() > types.len() {
                return Err(ClientError::decode(
                    ty.to_string(),
                    format!("{} elements for a tuple of {}", elements.len(), types.len()),
                ));
            }
            Value::Tuple(TupleValue::new(types.clone(), elements))
        }
    };
    Ok(value)
}

fn decode_elements(ty: &ColumnType, element: &ColumnType, bytes: &[u8]) -> ClientResult<Vec<Value>> {
    read_items(ty, bytes, 1)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            decode_element(element, item).map_err(|e| ClientError::element(ty.to_string(), i, e))
        })
        .collect()
}

fn decode_map(
    ty: &ColumnType,
    key_ty: &ColumnType,
    value_ty: &ColumnType,
    bytes: &[u8],
) -> ClientResult<ValueMap> {
    let items = read_items(ty, bytes, 2)?;
    let mut map = ValueMap::new();
    for (i, pair) in items.chunks_exact(2).enumerate() {
        let key = decode_element(key_ty, pair[0])
            .map_err(|e| ClientError::element(ty.to_string(), 2 * i, e))?;
        let value = decode_element(value_ty, pair[1])
            .map_err(|e| ClientError::element(ty.to_string(), 2 * i + 1, e))?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Reads a collection body. Zero-length input is an empty collection.
fn read_items<'a>(
    ty: &ColumnType,
    bytes: &'a [u8],
    per_entry: usize,
) -> ClientResult<Vec<Option<&'a [u8]>>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = Reader::new(ty, bytes);
    let count = reader.read_i32()?;
    let count = usize::try_from(count)
        .map_err(|_| ClientError::decode(ty.to_string(), format!("negative size {}", count)))?;
    let total = count.checked_mul(per_entry).ok_or_else(|| {
        ClientError::decode(ty.to_string(), format!("size {} too large", count))
    })?;
    // Every item needs at least its 4-byte length prefix.
    if total > reader.remaining() / 4 {
        return Err(ClientError::decode(
            ty.to_string(),
            format!("size {} exceeds the {} bytes available", count, bytes.len()),
        ));
    }
    let mut items = Vec::with_capacity(total);
    for _ in 0..total {
        items.push(reader.read_item()?);
    }
    reader.finish()?;
    Ok(items)
}

/// Reads user-defined type fields or tuple elements until input runs out.
fn read_fields(ty: &ColumnType, bytes: &[u8]) -> ClientResult<Vec<Option<Bytes>>> {
    let mut reader = Reader::new(ty, bytes);
    let mut fields = Vec::new();
    while reader.remaining() > 0 {
        fields.push(reader.read_item()?.map(Bytes::copy_from_slice));
    }
    Ok(fields)
}

struct Reader<'t, 'a> {
    ty: &'t ColumnType,
    bytes: &'a [u8],
    pos: usize,
}

impl<'t, 'a> Reader<'t, 'a> {
    fn new(ty: &'t ColumnType, bytes: &'a [u8]) -> Self {
        Self { ty, bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn truncated(&self) -> ClientError {
        ClientError::decode(
            self.ty.to_string(),
            format!("truncated at byte {} of {}", self.pos, self.bytes.len()),
        )
    }

    fn take(&mut self, len: usize) -> ClientResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.truncated());
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_i32(&mut self) -> ClientResult<i32> {
        let raw = self.take(4)?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_item(&mut self) -> ClientResult<Option<&'a [u8]>> {
        let len = self.read_i32()?;
        match usize::try_from(len) {
            Ok(len) => self.take(len).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn finish(&self) -> ClientResult<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(ClientError::decode(
                self.ty.to_string(),
                format!("{} trailing bytes", self.remaining()),
            ))
        }
    }
}
