//! Declared column types.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::kind::TypeKind;
use crate::error::{ClientError, ClientResult};

/// Definition of a user-defined type: its qualified name and ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdtType {
    /// Keyspace the type is defined in.
    pub keyspace: String,
    /// Type name.
    pub name: String,
    /// Field names and types, in declaration order.
    pub fields: Vec<(String, ColumnType)>,
}

impl UdtType {
    /// Creates a user-defined type definition.
    pub fn new(
        keyspace: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<(String, ColumnType)>,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            fields,
        }
    }

    /// Returns the type of the named field.
    pub fn field(&self, name: &str) -> Option<&ColumnType> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, ty)| ty)
    }
}

/// A declared column type, including nested type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Custom type, carrying the server-side class name.
    Custom(String),
    /// `ascii`.
    Ascii,
    /// `bigint`.
    BigInt,
    /// `blob`.
    Blob,
    /// `boolean`.
    Boolean,
    /// `counter`.
    Counter,
    /// `decimal`.
    Decimal,
    /// `double`.
    Double,
    /// `float`.
    Float,
    /// `int`.
    Int,
    /// `text`.
    Text,
    /// `timestamp`.
    Timestamp,
    /// `uuid`.
    Uuid,
    /// `varchar`.
    Varchar,
    /// `varint`.
    Varint,
    /// `timeuuid`.
    TimeUuid,
    /// `inet`.
    Inet,
    /// `date`.
    Date,
    /// `time`.
    Time,
    /// `smallint`.
    SmallInt,
    /// `tinyint`.
    TinyInt,
    /// `duration`.
    Duration,
    /// `list<T>`.
    List(Box<ColumnType>),
    /// `set<T>`.
    Set(Box<ColumnType>),
    /// `map<K, V>`.
    Map(Box<ColumnType>, Box<ColumnType>),
    /// User-defined type.
    Udt(Arc<UdtType>),
    /// `tuple<A, B, ...>`.
    Tuple(Vec<ColumnType>),
}

impl ColumnType {
    /// Shorthand for `list<element>`.
    pub fn list(element: ColumnType) -> Self {
        Self::List(Box::new(element))
    }

    /// Shorthand for `set<element>`.
    pub fn set(element: ColumnType) -> Self {
        Self::Set(Box::new(element))
    }

    /// Shorthand for `map<key, value>`.
    pub fn map(key: ColumnType, value: ColumnType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Shorthand for a user-defined type.
    pub fn udt(definition: UdtType) -> Self {
        Self::Udt(Arc::new(definition))
    }

    /// Returns the wire-level kind.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Custom(_) => TypeKind::Custom,
            Self::Ascii => TypeKind::Ascii,
            Self::BigInt => TypeKind::BigInt,
            Self::Blob => TypeKind::Blob,
            Self::Boolean => TypeKind::Boolean,
            Self::Counter => TypeKind::Counter,
            Self::Decimal => TypeKind::Decimal,
            Self::Double => TypeKind::Double,
            Self::Float => TypeKind::Float,
            Self::Int => TypeKind::Int,
            Self::Text => TypeKind::Text,
            Self::Timestamp => TypeKind::Timestamp,
            Self::Uuid => TypeKind::Uuid,
            Self::Varchar => TypeKind::Varchar,
            Self::Varint => TypeKind::Varint,
            Self::TimeUuid => TypeKind::TimeUuid,
            Self::Inet => TypeKind::Inet,
            Self::Date => TypeKind::Date,
            Self::Time => TypeKind::Time,
            Self::SmallInt => TypeKind::SmallInt,
            Self::TinyInt => TypeKind::TinyInt,
            Self::Duration => TypeKind::Duration,
            Self::List(_) => TypeKind::List,
            Self::Set(_) => TypeKind::Set,
            Self::Map(_, _) => TypeKind::Map,
            Self::Udt(_) => TypeKind::Udt,
            Self::Tuple(_) => TypeKind::Tuple,
        }
    }

    /// Returns the scalar type for a fieldless kind.
    ///
    /// Returns `None` for custom, collection and structure kinds, which
    /// need arguments.
    pub fn scalar(kind: TypeKind) -> Option<Self> {
        let ty = match kind {
            TypeKind::Ascii => Self::Ascii,
            TypeKind::BigInt => Self::BigInt,
            TypeKind::Blob => Self::Blob,
            TypeKind::Boolean => Self::Boolean,
            TypeKind::Counter => Self::Counter,
            TypeKind::Decimal => Self::Decimal,
            TypeKind::Double => Self::Double,
            TypeKind::Float => Self::Float,
            TypeKind::Int => Self::Int,
            TypeKind::Text => Self::Text,
            TypeKind::Timestamp => Self::Timestamp,
            TypeKind::Uuid => Self::Uuid,
            TypeKind::Varchar => Self::Varchar,
            TypeKind::Varint => Self::Varint,
            TypeKind::TimeUuid => Self::TimeUuid,
            TypeKind::Inet => Self::Inet,
            TypeKind::Date => Self::Date,
            TypeKind::Time => Self::Time,
            TypeKind::SmallInt => Self::SmallInt,
            TypeKind::TinyInt => Self::TinyInt,
            TypeKind::Duration => Self::Duration,
            TypeKind::Custom
            | TypeKind::List
            | TypeKind::Map
            | TypeKind::Set
            | TypeKind::Udt
            | TypeKind::Tuple => return None,
        };
        Some(ty)
    }

    /// Returns the nested type arguments, in declaration order.
    ///
    /// Empty for scalars. Fields of a user-defined type are not type
    /// arguments.
    pub fn type_arguments(&self) -> Vec<&ColumnType> {
        match self {
            Self::List(element) | Self::Set(element) => vec![element.as_ref()],
            Self::Map(key, value) => vec![key.as_ref(), value.as_ref()],
            Self::Tuple(elements) => elements.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true for list, set and map.
    pub fn is_collection(&self) -> bool {
        self.kind().is_collection()
    }

    /// Returns true for user-defined types and tuples.
    pub fn is_structure(&self) -> bool {
        self.kind().is_structure()
    }

    /// Parses a type name such as `map<text, frozen<list<int>>>`.
    pub fn parse(input: &str) -> ClientResult<Self> {
        let mut parser = Parser { input, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(ClientError::UnknownType(input.to_string()));
        }
        Ok(ty)
    }
}

impl FromStr for ColumnType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(class) => write!(f, "'{}'", class),
            Self::List(element) => write!(f, "list<{}>", element),
            Self::Set(element) => write!(f, "set<{}>", element),
            Self::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Self::Udt(udt) => write!(f, "{}.{}", udt.keyspace, udt.name),
            Self::Tuple(elements) => {
                f.write_str("tuple<")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str(">")
            }
            scalar => f.write_str(scalar.kind().name()),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn unknown(&self) -> ClientError {
        ClientError::UnknownType(self.input.to_string())
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> ClientResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unknown())
        }
    }

    fn ident(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn parse_type(&mut self) -> ClientResult<ColumnType> {
        if self.eat('\'') {
            let rest = self.rest();
            let end = rest.find('\'').ok_or_else(|| self.unknown())?;
            self.pos += end + 1;
            return Ok(ColumnType::Custom(rest[..end].to_string()));
        }

        let name = self.ident().to_ascii_lowercase();
        match name.as_str() {
            "frozen" => {
                self.expect('<')?;
                let inner = self.parse_type()?;
                self.expect('>')?;
                Ok(inner)
            }
            "list" | "set" => {
                self.expect('<')?;
                let element = self.parse_type()?;
                self.expect('>')?;
                Ok(if name == "list" {
                    ColumnType::list(element)
                } else {
                    ColumnType::set(element)
                })
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                Ok(ColumnType::map(key, value))
            }
            "tuple" => {
                self.expect('<')?;
                let mut elements = vec![self.parse_type()?];
                while self.eat(',') {
                    elements.push(self.parse_type()?);
                }
                self.expect('>')?;
                Ok(ColumnType::Tuple(elements))
            }
            _ => TypeKind::ALL
                .iter()
                .find(|kind| kind.name() == name)
                .and_then(|kind| ColumnType::scalar(*kind))
                .ok_or_else(|| ClientError::UnknownType(name.clone())),
        }
    }
}
