//! Result set metadata.
//!
//! Answers schema-shape questions from column definitions alone: it never
//! reads row data and never touches the cursor's null flag.

use std::sync::Arc;

use colbridge_common::MAX_COLUMN_WIDTH;

use super::row::{ColumnDefinitions, ColumnSpec};
use crate::error::{ClientError, ClientResult};
use crate::types::{ClientKind, TypeDescriptor, TypeKind, TypeRegistry};

/// Nullability reported for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Nullability {
    /// Column never holds null.
    NoNulls = 0,
    /// Column may hold null.
    Nullable = 1,
    /// Unknown.
    Unknown = 2,
}

/// Column metadata of a result.
#[derive(Debug, Clone)]
pub struct ResultMetadata {
    columns: Arc<ColumnDefinitions>,
    catalog: String,
    registry: &'static TypeRegistry,
}

impl ResultMetadata {
    /// Creates metadata over column definitions.
    pub fn new(columns: Arc<ColumnDefinitions>, catalog: Option<String>) -> Self {
        Self {
            columns,
            catalog: catalog.unwrap_or_default(),
            registry: TypeRegistry::global(),
        }
    }

    fn spec(&self, column: usize) -> ClientResult<&ColumnSpec> {
        column
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .ok_or_else(|| ClientError::index_out_of_range(column, self.columns.len()))
    }

    fn descriptor(&self, column: usize) -> ClientResult<&'static TypeDescriptor> {
        let spec = self.spec(column)?;
        Ok(self.registry.describe_type(&spec.column_type))
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column name.
    pub fn column_name(&self, column: usize) -> ClientResult<&str> {
        Ok(&self.spec(column)?.name)
    }

    /// Column label; the same as the name.
    pub fn column_label(&self, column: usize) -> ClientResult<&str> {
        self.column_name(column)
    }

    /// Declared type name, e.g. `map<text, int>`.
    pub fn column_type_name(&self, column: usize) -> ClientResult<String> {
        Ok(self.spec(column)?.column_type.to_string())
    }

    /// SQL type code.
    pub fn column_type(&self, column: usize) -> ClientResult<i32> {
        Ok(self.descriptor(column)?.sql_type.code())
    }

    /// Wire kind of the column.
    pub fn type_kind(&self, column: usize) -> ClientResult<TypeKind> {
        Ok(self.spec(column)?.column_type.kind())
    }

    /// Client value kind.
    pub fn client_kind(&self, column: usize) -> ClientResult<ClientKind> {
        Ok(self.descriptor(column)?.client_kind)
    }

    /// Rust type name of values read with the general accessor.
    pub fn column_class_name(&self, column: usize) -> ClientResult<&'static str> {
        Ok(self.descriptor(column)?.client_kind.class_name())
    }

    /// Whether values carry a sign.
    pub fn is_signed(&self, column: usize) -> ClientResult<bool> {
        Ok(self.descriptor(column)?.signed)
    }

    /// Whether comparisons are case-sensitive.
    pub fn is_case_sensitive(&self, column: usize) -> ClientResult<bool> {
        Ok(self.descriptor(column)?.case_sensitive)
    }

    /// Whether values represent money.
    pub fn is_currency(&self, column: usize) -> ClientResult<bool> {
        Ok(self.descriptor(column)?.currency)
    }

    /// Registry precision of the column type.
    pub fn precision(&self, column: usize) -> ClientResult<i32> {
        Ok(self.descriptor(column)?.precision)
    }

    /// Always 0.
    pub fn scale(&self, column: usize) -> ClientResult<i32> {
        self.spec(column).map(|_| 0)
    }

    /// Display width: the precision capped at [`MAX_COLUMN_WIDTH`], except
    /// `decimal` which always reports the cap.
    pub fn display_size(&self, column: usize) -> ClientResult<i32> {
        let descriptor = self.descriptor(column)?;
        Ok(match descriptor.kind {
            TypeKind::Decimal => MAX_COLUMN_WIDTH,
            _ => descriptor.precision.min(MAX_COLUMN_WIDTH),
        })
    }

    /// Always [`Nullability::Nullable`]: an absent value is null.
    pub fn is_nullable(&self, column: usize) -> ClientResult<Nullability> {
        self.spec(column).map(|_| Nullability::Nullable)
    }

    /// Always false.
    pub fn is_auto_increment(&self, column: usize) -> ClientResult<bool> {
        self.spec(column).map(|_| false)
    }

    /// Always false.
    pub fn is_searchable(&self, column: usize) -> ClientResult<bool> {
        self.spec(column).map(|_| false)
    }

    /// True only for column 0, which never exists.
    pub fn is_read_only(&self, column: usize) -> bool {
        column == 0
    }

    /// True for every 1-based column position.
    pub fn is_writable(&self, column: usize) -> bool {
        column > 0
    }

    /// Same as [`is_writable`](Self::is_writable).
    pub fn is_definitely_writable(&self, column: usize) -> bool {
        column > 0
    }

    /// Source table name.
    pub fn table_name(&self, column: usize) -> ClientResult<&str> {
        Ok(&self.spec(column)?.table)
    }

    /// Source keyspace.
    pub fn schema_name(&self, column: usize) -> ClientResult<&str> {
        Ok(&self.spec(column)?.keyspace)
    }

    /// Catalog name given by the cursor options.
    pub fn catalog_name(&self, column: usize) -> ClientResult<&str> {
        self.spec(column)?;
        Ok(&self.catalog)
    }
}
