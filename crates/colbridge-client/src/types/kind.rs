//! Wire type kinds, client value kinds and SQL type codes.

use std::fmt;

/// Wire-level type identifier.
///
/// The discriminant is the protocol id. Ids are dense from 0 to 21, then
/// the collection (32-34) and structure (48-49) ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum TypeKind {
    /// Server-side custom type, identified by class name.
    Custom = 0,
    /// US-ASCII string.
    Ascii = 1,
    /// 64-bit signed integer.
    BigInt = 2,
    /// Arbitrary bytes.
    Blob = 3,
    /// Boolean.
    Boolean = 4,
    /// 64-bit counter.
    Counter = 5,
    /// Arbitrary-precision decimal.
    Decimal = 6,
    /// 64-bit IEEE-754 float.
    Double = 7,
    /// 32-bit IEEE-754 float.
    Float = 8,
    /// 32-bit signed integer.
    Int = 9,
    /// UTF-8 string.
    Text = 10,
    /// Milliseconds since the Unix epoch.
    Timestamp = 11,
    /// Type 1 or type 4 UUID.
    Uuid = 12,
    /// UTF-8 string.
    Varchar = 13,
    /// Arbitrary-precision integer.
    Varint = 14,
    /// Type 1 UUID.
    TimeUuid = 15,
    /// IPv4 or IPv6 address.
    Inet = 16,
    /// Days since the epoch, offset by `2^31`.
    Date = 17,
    /// Nanoseconds since midnight.
    Time = 18,
    /// 16-bit signed integer.
    SmallInt = 19,
    /// 8-bit signed integer.
    TinyInt = 20,
    /// Months, days and nanoseconds.
    Duration = 21,
    /// Ordered list.
    List = 32,
    /// Ordered map.
    Map = 33,
    /// Ordered set.
    Set = 34,
    /// User-defined type.
    Udt = 48,
    /// Tuple.
    Tuple = 49,
}

impl TypeKind {
    /// All kinds, in protocol id order.
    pub const ALL: [TypeKind; 27] = [
        Self::Custom,
        Self::Ascii,
        Self::BigInt,
        Self::Blob,
        Self::Boolean,
        Self::Counter,
        Self::Decimal,
        Self::Double,
        Self::Float,
        Self::Int,
        Self::Text,
        Self::Timestamp,
        Self::Uuid,
        Self::Varchar,
        Self::Varint,
        Self::TimeUuid,
        Self::Inet,
        Self::Date,
        Self::Time,
        Self::SmallInt,
        Self::TinyInt,
        Self::Duration,
        Self::List,
        Self::Map,
        Self::Set,
        Self::Udt,
        Self::Tuple,
    ];

    /// Returns the protocol id.
    #[inline]
    pub const fn protocol_id(self) -> i32 {
        self as i32
    }

    /// Returns the lowercase type name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Ascii => "ascii",
            Self::BigInt => "bigint",
            Self::Blob => "blob",
            Self::Boolean => "boolean",
            Self::Counter => "counter",
            Self::Decimal => "decimal",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
            Self::Varchar => "varchar",
            Self::Varint => "varint",
            Self::TimeUuid => "timeuuid",
            Self::Inet => "inet",
            Self::Date => "date",
            Self::Time => "time",
            Self::SmallInt => "smallint",
            Self::TinyInt => "tinyint",
            Self::Duration => "duration",
            Self::List => "list",
            Self::Map => "map",
            Self::Set => "set",
            Self::Udt => "udt",
            Self::Tuple => "tuple",
        }
    }

    /// Returns true for list, set and map.
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }

    /// Returns true for user-defined types and tuples.
    pub const fn is_structure(self) -> bool {
        matches!(self, Self::Udt | Self::Tuple)
    }

    /// Returns true for the three string kinds.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Ascii | Self::Text | Self::Varchar)
    }

    /// Returns the exact encoded width of fixed-width kinds.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::TinyInt => Some(1),
            Self::SmallInt => Some(2),
            Self::Int | Self::Float | Self::Date => Some(4),
            Self::BigInt
            | Self::Counter
            | Self::Double
            | Self::Timestamp
            | Self::Time => Some(8),
            Self::Uuid | Self::TimeUuid => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of value types visible to tabular clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClientKind {
    /// Raw bytes.
    Bytes,
    /// `bool`.
    Boolean,
    /// `i8`.
    Byte,
    /// `i16`.
    Short,
    /// `i32`.
    Int,
    /// `i64`.
    Long,
    /// `f32`.
    Float,
    /// `f64`.
    Double,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Arbitrary-precision integer.
    BigInteger,
    /// `String`.
    String,
    /// UUID.
    Uuid,
    /// IP address.
    InetAddress,
    /// Calendar date.
    Date,
    /// Millisecond-precision time of day.
    Time,
    /// Milliseconds since the epoch.
    Timestamp,
    /// Months, days and nanoseconds.
    Duration,
    /// Ordered list.
    List,
    /// Ordered unique set.
    Set,
    /// Ordered map.
    Map,
    /// User-defined type value.
    Udt,
    /// Tuple value.
    Tuple,
}

impl ClientKind {
    /// Returns the Rust type name a client receives for this kind.
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Bytes => "bytes::Bytes",
            Self::Boolean => "bool",
            Self::Byte => "i8",
            Self::Short => "i16",
            Self::Int => "i32",
            Self::Long => "i64",
            Self::Float => "f32",
            Self::Double => "f64",
            Self::Decimal => "colbridge_client::Decimal",
            Self::BigInteger => "colbridge_client::Varint",
            Self::String => "String",
            Self::Uuid => "uuid::Uuid",
            Self::InetAddress => "std::net::IpAddr",
            Self::Date => "colbridge_client::SqlDate",
            Self::Time => "colbridge_client::SqlTime",
            Self::Timestamp => "colbridge_client::SqlTimestamp",
            Self::Duration => "colbridge_client::CqlDuration",
            Self::List => "Vec<colbridge_client::Value>",
            Self::Set => "colbridge_client::ValueSet",
            Self::Map => "colbridge_client::ValueMap",
            Self::Udt => "colbridge_client::UdtValue",
            Self::Tuple => "colbridge_client::TupleValue",
        }
    }
}

/// SQL type codes reported by result metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SqlType {
    /// `BIT`.
    Bit = -7,
    /// `TINYINT`.
    TinyInt = -6,
    /// `BIGINT`.
    BigInt = -5,
    /// `LONGVARBINARY`.
    LongVarBinary = -4,
    /// `BINARY`.
    Binary = -2,
    /// `CHAR`.
    Char = 1,
    /// `DECIMAL`.
    Decimal = 3,
    /// `INTEGER`.
    Integer = 4,
    /// `SMALLINT`.
    SmallInt = 5,
    /// `FLOAT`.
    Float = 6,
    /// `DOUBLE`.
    Double = 8,
    /// `VARCHAR`.
    Varchar = 12,
    /// `BOOLEAN`.
    Boolean = 16,
    /// `DATE`.
    Date = 91,
    /// `TIME`.
    Time = 92,
    /// `TIMESTAMP`.
    Timestamp = 93,
    /// `OTHER`.
    Other = 1111,
}

impl SqlType {
    /// Returns the numeric code.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_ids() {
        assert_eq!(TypeKind::Custom.protocol_id(), 0);
        assert_eq!(TypeKind::Duration.protocol_id(), 21);
        assert_eq!(TypeKind::List.protocol_id(), 32);
        assert_eq!(TypeKind::Map.protocol_id(), 33);
        assert_eq!(TypeKind::Set.protocol_id(), 34);
        assert_eq!(TypeKind::Tuple.protocol_id(), 49);
    }

    #[test]
    fn test_all_sorted_by_id() {
        for pair in TypeKind::ALL.windows(2) {
            assert!(pair[0].protocol_id() < pair[1].protocol_id());
        }
    }

    #[test]
    fn test_fixed_width() {
        assert_eq!(TypeKind::Int.fixed_width(), Some(4));
        assert_eq!(TypeKind::Time.fixed_width(), Some(8));
        assert_eq!(TypeKind::TimeUuid.fixed_width(), Some(16));
        assert_eq!(TypeKind::Varint.fixed_width(), None);
        assert_eq!(TypeKind::Inet.fixed_width(), None);
    }

    #[test]
    fn test_classification() {
        assert!(TypeKind::Set.is_collection());
        assert!(!TypeKind::Tuple.is_collection());
        assert!(TypeKind::Udt.is_structure());
        assert!(TypeKind::Ascii.is_text());
        assert_eq!(SqlType::Other.code(), 1111);
        assert_eq!(SqlType::BigInt.code(), -5);
    }
}
