//! Wire encoding, the inverse of [`decode`](super::decode).
//!
//! Used by row-source implementations and tests to build pages. A
//! [`Value::Bytes`] is written verbatim for any column type.

use bytes::{BufMut, Bytes, BytesMut};

use super::value::Value;
use crate::error::{ClientError, ClientResult};
use crate::types::ColumnType;

/// Encodes a value for a column of type `ty`. [`Value::Null`] encodes as
/// `None`.
pub fn encode_value(ty: &ColumnType, value: &Value) -> ClientResult<Option<Bytes>> {
    if value.is_null() {
        return Ok(None);
    }
    let mut buf = BytesMut::new();
    encode_into(ty, value, &mut buf)?;
    Ok(Some(buf.freeze()))
}

fn mismatch(ty: &ColumnType, value: &Value) -> ClientError {
    ClientError::Encode {
        type_name: ty.to_string(),
        value_kind: value.kind_name(),
    }
}

fn encode_into(ty: &ColumnType, value: &Value, buf: &mut BytesMut) -> ClientResult<()> {
    match (ty, value) {
        (_, Value::Bytes(raw)) => buf.put_slice(raw),
        (ColumnType::Custom(_), Value::Text(s))
        | (ColumnType::Ascii | ColumnType::Text | ColumnType::Varchar, Value::Text(s)) => {
            buf.put_slice(s.as_bytes())
        }
        (ColumnType::Boolean, Value::Boolean(v)) => buf.put_u8(u8::from(*v)),
        (ColumnType::TinyInt, Value::TinyInt(v)) => buf.put_i8(*v),
        (ColumnType::SmallInt, Value::SmallInt(v)) => buf.put_i16(*v),
        (ColumnType::Int, Value::Int(v)) => buf.put_i32(*v),
        (ColumnType::BigInt | ColumnType::Counter, Value::BigInt(v)) => buf.put_i64(*v),
        (ColumnType::Float, Value::Float(v)) => buf.put_f32(*v),
        (ColumnType::Double, Value::Double(v)) => buf.put_f64(*v),
        (ColumnType::Decimal, Value::Decimal(v)) => buf.put_slice(&v.to_wire()),
        (ColumnType::Varint, Value::Varint(v)) => buf.put_slice(&v.to_signed_bytes_be()),
        (ColumnType::Uuid | ColumnType::TimeUuid, Value::Uuid(v)) => buf.put_slice(v.as_bytes()),
        (ColumnType::Inet, Value::Inet(addr)) => match addr {
            std::net::IpAddr::V4(v4) => buf.put_slice(&v4.octets()),
            std::net::IpAddr::V6(v6) => buf.put_slice(&v6.octets()),
        },
        (ColumnType::Date, Value::Date(v)) => buf.put_u32(v.to_wire()),
        (ColumnType::Time, Value::Time(v)) => buf.put_i64(v.nanos()),
        (ColumnType::Timestamp, Value::Timestamp(v)) => buf.put_i64(v.millis()),
        (ColumnType::Duration, Value::Duration(v)) => buf.put_slice(&v.to_wire()),
        (ColumnType::List(element), Value::List(items)) => {
            put_count(buf, items.len())?;
            for item in items {
                put_item(buf, element, item)?;
            }
        }
        (ColumnType::Set(element), Value::Set(items)) => {
            put_count(buf, items.len())?;
            for item in items.iter() {
                put_item(buf, element, item)?;
            }
        }
        (ColumnType::Map(key_ty, value_ty), Value::Map(map)) => {
            put_count(buf, map.len())?;
            for (k, v) in map.iter() {
                put_item(buf, key_ty, k)?;
                put_item(buf, value_ty, v)?;
            }
        }
        (ColumnType::Udt(_), Value::Udt(udt)) => put_raw_items(buf, udt.encoded_fields())?,
        (ColumnType::Tuple(_), Value::Tuple(tuple)) => {
            put_raw_items(buf, tuple.encoded_elements())?
        }
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn put_count(buf: &mut BytesMut, len: usize) -> ClientResult<()> {
    let len = i32::try_from(len)
        .map_err(|_| ClientError::Internal(format!("collection of {} items is too large", len)))?;
    buf.put_i32(len);
    Ok(())
}

fn put_item(buf: &mut BytesMut, ty: &ColumnType, value: &Value) -> ClientResult<()> {
    match encode_value(ty, value)? {
        Some(bytes) => {
            put_count(buf, bytes.len())?;
            buf.put_slice(&bytes);
        }
        None => buf.put_i32(-1),
    }
    Ok(())
}

fn put_raw_items(buf: &mut BytesMut, items: &[Option<Bytes>]) -> ClientResult<()> {
    for item in items {
        match item {
            Some(bytes) => {
                put_count(buf, bytes.len())?;
                buf.put_slice(bytes);
            }
            None => buf.put_i32(-1),
        }
    }
    Ok(())
}
