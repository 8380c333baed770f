//! Static type descriptor registry.
//!
//! Every wire type has exactly one [`TypeDescriptor`]. The registry indexes
//! the descriptor table three ways (protocol id, type name, client kind) and
//! is built once per process; lookups take no locks.

use std::collections::HashMap;
use std::sync::OnceLock;

use colbridge_common::UNBOUNDED_PRECISION;

use super::column::ColumnType;
use super::kind::{ClientKind, SqlType, TypeKind};
use crate::error::{ClientError, ClientResult};

/// Client mapping and display rules for one wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Wire kind; its discriminant is the protocol id.
    pub kind: TypeKind,
    /// Value kind handed to clients.
    pub client_kind: ClientKind,
    /// SQL type code reported by metadata.
    pub sql_type: SqlType,
    /// Default display precision; `0` when not applicable.
    pub precision: i32,
    /// Whether values carry a sign.
    pub signed: bool,
    /// Whether comparisons are case-sensitive.
    pub case_sensitive: bool,
    /// Whether values represent money.
    pub currency: bool,
    /// Whether this descriptor answers lookups by client kind when several
    /// wire types share one.
    pub canonical: bool,
}

impl TypeDescriptor {
    /// Returns the protocol id.
    #[inline]
    pub fn protocol_id(&self) -> i32 {
        self.kind.protocol_id()
    }

    /// Returns the type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Returns true for list, set and map.
    #[inline]
    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }
}

const fn desc(
    kind: TypeKind,
    client_kind: ClientKind,
    sql_type: SqlType,
    precision: i32,
    signed: bool,
) -> TypeDescriptor {
    TypeDescriptor {
        kind,
        client_kind,
        sql_type,
        precision,
        signed,
        case_sensitive: false,
        currency: false,
        canonical: false,
    }
}

const fn text(kind: TypeKind, canonical: bool) -> TypeDescriptor {
    TypeDescriptor {
        case_sensitive: true,
        canonical,
        ..desc(kind, ClientKind::String, SqlType::Varchar, UNBOUNDED_PRECISION, false)
    }
}

const fn canonical(descriptor: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor {
        canonical: true,
        ..descriptor
    }
}

use ClientKind as C;
use SqlType as S;
use TypeKind as K;

static DESCRIPTORS: [TypeDescriptor; 27] = [
    desc(K::Custom, C::Bytes, S::Other, 0, false),
    text(K::Ascii, false),
    canonical(desc(K::BigInt, C::Long, S::BigInt, 20, true)),
    canonical(desc(K::Blob, C::Bytes, S::Binary, UNBOUNDED_PRECISION, false)),
    desc(K::Boolean, C::Boolean, S::Boolean, 5, false),
    desc(K::Counter, C::Long, S::BigInt, 20, true),
    TypeDescriptor {
        currency: true,
        ..desc(K::Decimal, C::Decimal, S::Decimal, UNBOUNDED_PRECISION, true)
    },
    desc(K::Double, C::Double, S::Double, 300, true),
    desc(K::Float, C::Float, S::Float, 40, true),
    desc(K::Int, C::Int, S::Integer, 11, true),
    text(K::Text, false),
    desc(K::Timestamp, C::Timestamp, S::Timestamp, 31, false),
    canonical(desc(K::Uuid, C::Uuid, S::Char, 36, false)),
    text(K::Varchar, true),
    desc(K::Varint, C::BigInteger, S::Decimal, UNBOUNDED_PRECISION, true),
    desc(K::TimeUuid, C::Uuid, S::Char, 36, false),
    desc(K::Inet, C::InetAddress, S::Other, 39, false),
    desc(K::Date, C::Date, S::Date, 10, false),
    desc(K::Time, C::Time, S::Time, 15, false),
    desc(K::SmallInt, C::Short, S::SmallInt, 6, true),
    desc(K::TinyInt, C::Byte, S::TinyInt, 4, true),
    desc(K::Duration, C::Duration, S::Other, 0, false),
    desc(K::List, C::List, S::Other, 0, false),
    desc(K::Map, C::Map, S::Other, 0, false),
    desc(K::Set, C::Set, S::Other, 0, false),
    desc(K::Udt, C::Udt, S::Other, 0, false),
    desc(K::Tuple, C::Tuple, S::Other, 0, false),
];

/// Immutable lookup tables over the descriptor table.
#[derive(Debug)]
pub struct TypeRegistry {
    descriptors: &'static [TypeDescriptor],
    by_id: Vec<Option<usize>>,
    by_name: HashMap<&'static str, usize>,
    by_client_kind: HashMap<ClientKind, usize>,
}

impl TypeRegistry {
    /// Builds the lookup tables.
    ///
    /// # Panics
    ///
    /// Panics if two descriptors share a protocol id or a name, or if a
    /// client kind has no unique canonical descriptor.
    pub fn new() -> Self {
        let descriptors: &'static [TypeDescriptor] = &DESCRIPTORS;
        let max_id = descriptors
            .iter()
            .map(TypeDescriptor::protocol_id)
            .max()
            .unwrap_or(0);
        let mut by_id = vec![None; max_id as usize + 1];
        let mut by_name = HashMap::with_capacity(descriptors.len());
        let mut by_client_kind = HashMap::new();
        let mut kind_counts: HashMap<ClientKind, usize> = HashMap::new();

        for (i, d) in descriptors.iter().enumerate() {
            let slot = &mut by_id[d.protocol_id() as usize];
            assert!(slot.is_none(), "duplicate protocol id {}", d.protocol_id());
            *slot = Some(i);

            let previous = by_name.insert(d.name(), i);
            assert!(previous.is_none(), "duplicate type name {}", d.name());

            *kind_counts.entry(d.client_kind).or_insert(0) += 1;
        }

        for (kind, count) in kind_counts {
            let candidates: Vec<usize> = descriptors
                .iter()
                .enumerate()
                .filter(|(_, d)| d.client_kind == kind && (count == 1 || d.canonical))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(candidates.len(), 1, "ambiguous client kind {:?}", kind);
            by_client_kind.insert(kind, candidates[0]);
        }

        Self {
            descriptors,
            by_id,
            by_name,
            by_client_kind,
        }
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static TypeRegistry {
        static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(TypeRegistry::new)
    }

    /// Looks up a descriptor by protocol id.
    pub fn describe(&self, protocol_id: i32) -> ClientResult<&TypeDescriptor> {
        usize::try_from(protocol_id)
            .ok()
            .and_then(|id| self.by_id.get(id).copied().flatten())
            .map(|i| &self.descriptors[i])
            .ok_or_else(|| ClientError::UnknownType(format!("protocol id {}", protocol_id)))
    }

    /// Looks up a descriptor by type name, case-insensitively.
    pub fn describe_name(&self, name: &str) -> ClientResult<&TypeDescriptor> {
        self.by_name
            .get(name.trim().to_ascii_lowercase().as_str())
            .map(|&i| &self.descriptors[i])
            .ok_or_else(|| ClientError::UnknownType(name.to_string()))
    }

    /// Returns the canonical descriptor for a client kind.
    pub fn describe_client_kind(&self, kind: ClientKind) -> Option<&TypeDescriptor> {
        self.by_client_kind.get(&kind).map(|&i| &self.descriptors[i])
    }

    /// Returns the descriptor of a declared column type.
    pub fn describe_type(&self, ty: &ColumnType) -> &TypeDescriptor {
        // Every TypeKind has an entry; checked by the registry tests.
        &self.descriptors[self.by_id[ty.kind().protocol_id() as usize].unwrap_or(0)]
    }

    /// Iterates all descriptors in protocol id order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.iter()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false; the registry is never empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_registered() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.len(), TypeKind::ALL.len());
        for kind in TypeKind::ALL {
            let d = registry.describe(kind.protocol_id()).unwrap();
            assert_eq!(d.kind, kind);
        }
    }

    #[test]
    fn test_indices_agree() {
        let registry = TypeRegistry::new();
        for d in registry.iter() {
            let by_id = registry.describe(d.protocol_id()).unwrap();
            let by_name = registry.describe_name(d.name()).unwrap();
            assert_eq!(by_id, d);
            assert_eq!(by_name, d);

            let by_kind = registry.describe_client_kind(d.client_kind).unwrap();
            assert_eq!(by_kind.client_kind, d.client_kind);
            if d.canonical {
                assert_eq!(by_kind, d);
            }
        }
    }

    #[test]
    fn test_canonical_client_kinds() {
        let registry = TypeRegistry::new();
        let name = |k| registry.describe_client_kind(k).unwrap().name();
        assert_eq!(name(ClientKind::String), "varchar");
        assert_eq!(name(ClientKind::Bytes), "blob");
        assert_eq!(name(ClientKind::Long), "bigint");
        assert_eq!(name(ClientKind::Uuid), "uuid");
        assert_eq!(name(ClientKind::Short), "smallint");
    }

    #[test]
    fn test_unknown_ids() {
        let registry = TypeRegistry::global();
        assert!(matches!(registry.describe(-1), Err(ClientError::UnknownType(_))));
        assert!(registry.describe(22).is_err());
        assert!(registry.describe(31).is_err());
        assert!(registry.describe(50).is_err());
        assert!(registry.describe(i32::MAX).is_err());
    }

    #[test]
    fn test_unknown_name() {
        let registry = TypeRegistry::global();
        assert!(matches!(
            registry.describe_name("widget"),
            Err(ClientError::UnknownType(name)) if name == "widget"
        ));
        assert_eq!(registry.describe_name(" VarInt ").unwrap().kind, TypeKind::Varint);
    }

    #[test]
    fn test_flags() {
        let registry = TypeRegistry::global();
        let get = |k: TypeKind| registry.describe(k.protocol_id()).unwrap();

        assert!(get(TypeKind::Decimal).currency);
        assert!(!get(TypeKind::Double).currency);
        assert!(get(TypeKind::Text).case_sensitive);
        assert!(!get(TypeKind::Uuid).case_sensitive);
        assert!(get(TypeKind::Int).signed);
        assert!(!get(TypeKind::Timestamp).signed);
        assert!(get(TypeKind::Map).is_collection());
        assert_eq!(get(TypeKind::Int).precision, 11);
        assert_eq!(get(TypeKind::Decimal).precision, UNBOUNDED_PRECISION);
        assert_eq!(get(TypeKind::List).precision, 0);
    }

    #[test]
    fn test_describe_type() {
        let registry = TypeRegistry::global();
        let ty = ColumnType::set(ColumnType::Int);
        assert_eq!(registry.describe_type(&ty).kind, TypeKind::Set);
        assert_eq!(
            registry.describe_type(&ColumnType::Custom("x".into())).kind,
            TypeKind::Custom
        );
    }
}
