//! Materialized client values.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use super::decode::decode_element;
use super::duration::CqlDuration;
use super::numeric::{Decimal, Varint};
use super::temporal::{SqlDate, SqlTime, SqlTimestamp};
use crate::error::{ClientError, ClientResult};
use crate::types::{ColumnType, UdtType};

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// `boolean`.
    Boolean(bool),
    /// `tinyint`.
    TinyInt(i8),
    /// `smallint`.
    SmallInt(i16),
    /// `int`.
    Int(i32),
    /// `bigint` and `counter`.
    BigInt(i64),
    /// `float`.
    Float(f32),
    /// `double`.
    Double(f64),
    /// `decimal`.
    Decimal(Decimal),
    /// `varint`.
    Varint(Varint),
    /// `ascii`, `text` and `varchar`.
    Text(String),
    /// `blob`.
    Bytes(Bytes),
    /// `uuid` and `timeuuid`.
    Uuid(Uuid),
    /// `inet`.
    Inet(IpAddr),
    /// `date`.
    Date(SqlDate),
    /// `time`.
    Time(SqlTime),
    /// `timestamp`.
    Timestamp(SqlTimestamp),
    /// `duration`.
    Duration(CqlDuration),
    /// `list`.
    List(Vec<Value>),
    /// `set`.
    Set(ValueSet),
    /// `map`.
    Map(ValueMap),
    /// User-defined type value.
    Udt(UdtValue),
    /// Tuple value.
    Tuple(TupleValue),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::TinyInt(_) => "tinyint",
            Self::SmallInt(_) => "smallint",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Varint(_) => "varint",
            Self::Text(_) => "text",
            Self::Bytes(_) => "blob",
            Self::Uuid(_) => "uuid",
            Self::Inet(_) => "inet",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Udt(_) => "udt",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Returns the string, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer for any integral variant that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::TinyInt(v) => Some(i64::from(*v)),
            Self::SmallInt(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::BigInt(v) => Some(*v),
            Self::Varint(v) => v.to_i64(),
            _ => None,
        }
    }

    /// Writes the value in CQL literal form: text quoted, everything else
    /// as by `Display`.
    fn fmt_literal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::TinyInt(v) => write!(f, "{}", v),
            Self::SmallInt(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::BigInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Varint(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Bytes(v) => {
                f.write_str("0x")?;
                for b in v.iter() {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Self::Uuid(v) => write!(f, "{}", v),
            Self::Inet(v) => write!(f, "{}", v),
            Self::Date(v) => write!(f, "{}", v),
            Self::Time(v) => write!(f, "{}", v),
            Self::Timestamp(v) => write!(f, "{}", v),
            Self::Duration(v) => write!(f, "{}", v),
            Self::List(items) => fmt_seq(f, items.iter()),
            Self::Set(set) => fmt_seq(f, set.iter()),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Self::Udt(v) => write!(f, "{}", v),
            Self::Tuple(v) => write!(f, "{}", v),
        }
    }
}

fn fmt_seq<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a Value>) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

// =============================================================================
// Hash index
// =============================================================================

/// Positions of stored values, bucketed by [`value_hash`].
///
/// A bucket only narrows the search; membership is still decided by `==`.
#[derive(Clone, Default)]
struct ValueIndex {
    buckets: HashMap<u64, Vec<usize>>,
}

impl ValueIndex {
    fn find(&self, hash: u64, mut matches: impl FnMut(usize) -> bool) -> Option<usize> {
        self.buckets
            .get(&hash)?
            .iter()
            .copied()
            .find(|&position| matches(position))
    }

    fn push(&mut self, hash: u64, position: usize) {
        self.buckets.entry(hash).or_default().push(position);
    }
}

/// Hashes a value consistently with its `PartialEq`: values that compare
/// equal hash equal.
fn value_hash(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_into(value, &mut hasher);
    hasher.finish()
}

fn hash_into<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Boolean(v) => v.hash(state),
        Value::TinyInt(v) => v.hash(state),
        Value::SmallInt(v) => v.hash(state),
        Value::Int(v) => v.hash(state),
        Value::BigInt(v) => v.hash(state),
        Value::Float(v) => float_bits(f64::from(*v)).hash(state),
        Value::Double(v) => float_bits(*v).hash(state),
        Value::Decimal(v) => v.hash(state),
        Value::Varint(v) => v.hash(state),
        Value::Text(v) => v.hash(state),
        Value::Bytes(v) => v.hash(state),
        Value::Uuid(v) => v.hash(state),
        Value::Inet(v) => v.hash(state),
        Value::Date(v) => v.hash(state),
        Value::Time(v) => v.hash(state),
        Value::Timestamp(v) => v.hash(state),
        Value::Duration(v) => v.hash(state),
        Value::List(items) => {
            items.len().hash(state);
            items.iter().for_each(|item| hash_into(item, state));
        }
        Value::Set(set) => {
            set.len().hash(state);
            set.iter().for_each(|item| hash_into(item, state));
        }
        Value::Map(map) => {
            map.len().hash(state);
            for (k, v) in map.iter() {
                hash_into(k, state);
                hash_into(v, state);
            }
        }
        Value::Udt(v) => v.encoded_fields().hash(state),
        Value::Tuple(v) => v.encoded_elements().hash(state),
    }
}

/// `0.0` and `-0.0` compare equal, so they must share a hash.
fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Insertion-ordered set of unique values.
#[derive(Clone, Default)]
pub struct ValueSet {
    items: Vec<Value>,
    index: ValueIndex,
}

impl ValueSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value unless an equal one is present. Returns true if added.
    pub fn insert(&mut self, value: Value) -> bool {
        let hash = value_hash(&value);
        if self.position(hash, &value).is_some() {
            return false;
        }
        self.index.push(hash, self.items.len());
        self.items.push(value);
        true
    }

    /// Returns true if an equal value is present.
    pub fn contains(&self, value: &Value) -> bool {
        self.position(value_hash(value), value).is_some()
    }

    fn position(&self, hash: u64, value: &Value) -> Option<usize> {
        self.index.find(hash, |i| self.items[i] == *value)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the set, returning values in insertion order.
    pub fn into_vec(self) -> Vec<Value> {
        self.items
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.items).finish()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// Insertion-ordered map with unique keys.
///
/// Re-inserting a key replaces its value and keeps its position.
#[derive(Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
    index: ValueIndex,
}

impl ValueMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the previous value for the key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let hash = value_hash(&key);
        match self.position(hash, &key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.push(hash, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a key.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(value_hash(key), key)
            .map(|i| &self.entries[i].1)
    }

    fn position(&self, hash: u64, key: &Value) -> Option<usize> {
        self.index.find(hash, |i| self.entries[i].0 == *key)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A user-defined type value in its wire form.
///
/// Fields stay encoded until read.
#[derive(Debug, Clone, PartialEq)]
pub struct UdtValue {
    ty: Arc<UdtType>,
    fields: Vec<Option<Bytes>>,
}

impl UdtValue {
    /// Wraps encoded fields. Missing trailing fields read as null.
    pub fn new(ty: Arc<UdtType>, fields: Vec<Option<Bytes>>) -> Self {
        Self { ty, fields }
    }

    /// The type definition.
    pub fn udt_type(&self) -> &UdtType {
        &self.ty
    }

    /// Encoded field by position.
    pub fn raw(&self, index: usize) -> Option<&Bytes> {
        self.fields.get(index).and_then(Option::as_ref)
    }

    /// Decodes a field by name.
    pub fn get(&self, name: &str) -> ClientResult<Value> {
        let index = self
            .ty
            .fields
            .iter()
            .position(|(field, _)| field.eq_ignore_ascii_case(name))
            .ok_or_else(|| ClientError::NoSuchColumn(name.to_string()))?;
        self.get_index(index)
    }

    /// Decodes a field by 0-based position.
    pub fn get_index(&self, index: usize) -> ClientResult<Value> {
        let (_, ty) = self
            .ty
            .fields
            .get(index)
            .ok_or_else(|| ClientError::index_out_of_range(index + 1, self.ty.fields.len()))?;
        decode_element(ty, self.raw(index).map(|b| b.as_ref()))
    }

    pub(crate) fn encoded_fields(&self) -> &[Option<Bytes>] {
        &self.fields
    }
}

impl fmt::Display for UdtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, _)) in self.ty.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:", name)?;
            match self.get_index(i) {
                Ok(value) => value.fmt_literal(f)?,
                Err(_) => f.write_str("?")?,
            }
        }
        f.write_str("}")
    }
}

/// A tuple value in its wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleValue {
    types: Vec<ColumnType>,
    elements: Vec<Option<Bytes>>,
}

impl TupleValue {
    /// Wraps encoded elements.
    pub fn new(types: Vec<ColumnType>, elements: Vec<Option<Bytes>>) -> Self {
        Self { types, elements }
    }

    /// Component types.
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true for a tuple with no components.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Decodes a component by 0-based position.
    pub fn get(&self, index: usize) -> ClientResult<Value> {
        let ty = self
            .types
            .get(index)
            .ok_or_else(|| ClientError::index_out_of_range(index + 1, self.types.len()))?;
        let raw = self.elements.get(index).and_then(Option::as_ref);
        decode_element(ty, raw.map(|b| b.as_ref()))
    }

    pub(crate) fn encoded_elements(&self) -> &[Option<Bytes>] {
        &self.elements
    }
}

impl fmt::Display for TupleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for i in 0..self.types.len() {
            if i > 0 {
                f.write_str(",")?;
            }
            match self.get(i) {
                Ok(value) => value.fmt_literal(f)?,
                Err(_) => f.write_str("?")?,
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_first_occurrence_order() {
        let set: ValueSet = [Value::Int(3), Value::Int(1), Value::Int(3), Value::Int(2)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.into_vec(),
            vec![Value::Int(3), Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_map_replace_keeps_position() {
        let mut map = ValueMap::new();
        map.insert(Value::Text("a".into()), Value::Int(1));
        map.insert(Value::Text("b".into()), Value::Int(2));
        let previous = map.insert(Value::Text("a".into()), Value::Int(9));
        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(Value::Map(map).to_string(), "{a=9, b=2}");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bytes(Bytes::from_static(&[0xCA, 0xFE])).to_string(), "0xcafe");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Text("x".into())]).to_string(),
            "[1, x]"
        );
    }

    #[test]
    fn test_tuple_display_and_get() {
        let tuple = TupleValue::new(
            vec![ColumnType::Int, ColumnType::Text],
            vec![
                Some(Bytes::from_static(&[0, 0, 0, 7])),
                Some(Bytes::from_static(b"it's")),
            ],
        );
        assert_eq!(tuple.to_string(), "(7,'it''s')");
        assert_eq!(tuple.get(0).unwrap(), Value::Int(7));
        assert!(matches!(
            tuple.get(2),
            Err(ClientError::ColumnIndexOutOfRange { index: 3, count: 2 })
        ));
    }

    #[test]
    fn test_udt_missing_trailing_field_is_null() {
        let ty = Arc::new(UdtType::new(
            "shop",
            "address",
            vec![("street".into(), ColumnType::Text), ("zip".into(), ColumnType::Int)],
        ));
        let udt = UdtValue::new(ty, vec![Some(Bytes::from_static(b"Main St"))]);
        assert_eq!(udt.get("street").unwrap(), Value::Text("Main St".into()));
        assert_eq!(udt.get("zip").unwrap(), Value::Null);
        assert!(matches!(udt.get("city"), Err(ClientError::NoSuchColumn(_))));
        assert_eq!(udt.to_string(), "{street:'Main St',zip:null}");
    }


    #[test]
    fn test_large_set_and_map_stay_ordered() {
        let n = 200_000;
        let set: ValueSet = (0..n)
            .chain(0..n)
            .map(|i| Value::Int(n - i))
            .collect();
        assert_eq!(set.len(), n as usize);
        assert_eq!(set.iter().next(), Some(&Value::Int(n)));
        assert!(set.contains(&Value::Int(1)));
        assert!(!set.contains(&Value::BigInt(1)));

        let mut map: ValueMap = (0..n)
            .map(|i| (Value::Text(i.to_string()), Value::Int(i)))
            .collect();
        assert_eq!(map.insert(Value::Text("7".into()), Value::Null), Some(Value::Int(7)));
        assert_eq!(map.len(), n as usize);
        assert_eq!(map.keys().nth(7), Some(&Value::Text("7".into())));
        assert_eq!(map.get(&Value::Text("7".into())), Some(&Value::Null));
        assert_eq!(map.get(&Value::Text("x".into())), None);
    }

    #[test]
    fn test_set_float_equality() {
        let set: ValueSet = [
            Value::Double(0.0),
            Value::Double(-0.0),
            Value::Double(f64::NAN),
            Value::Double(f64::NAN),
        ]
        .into_iter()
        .collect();
        // NaN never equals itself, so both are kept.
        assert_eq!(set.len(), 3);
        assert!(set.contains(&Value::Double(-0.0)));
    }
    #[test]
    fn test_as_i64() {
        assert_eq!(Value::SmallInt(-3).as_i64(), Some(-3));
        assert_eq!(Value::Text("3".into()).as_i64(), None);
    }
}
