//! Column definitions and rows.

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::{Cell, Value};
use crate::error::{ClientError, ClientResult};
use crate::types::ColumnType;

/// Declaration of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Keyspace of the source table.
    pub keyspace: String,
    /// Source table.
    pub table: String,
    /// Column name.
    pub name: String,
    /// Declared type.
    pub column_type: ColumnType,
}

impl ColumnSpec {
    /// Creates a column declaration.
    pub fn new(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            name: name.into(),
            column_type,
        }
    }

    /// Returns true if `name` refers to this column.
    ///
    /// A double-quoted name matches exactly; any other name matches
    /// ignoring ASCII case.
    pub fn matches(&self, name: &str) -> bool {
        match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
            Some(quoted) => self.name == quoted,
            None => self.name.eq_ignore_ascii_case(name),
        }
    }
}

/// A column addressed by 1-based index or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef<'a> {
    /// 1-based position. Anything below 1 is out of range.
    Index(i64),
    /// Column name.
    Name(&'a str),
}

impl From<usize> for ColumnRef<'_> {
    fn from(index: usize) -> Self {
        Self::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<i32> for ColumnRef<'_> {
    fn from(index: i32) -> Self {
        Self::Index(i64::from(index))
    }
}

impl From<i64> for ColumnRef<'_> {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

/// Ordered column declarations shared by every row of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDefinitions {
    specs: Vec<ColumnSpec>,
}

impl ColumnDefinitions {
    /// Creates definitions from column declarations.
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        Self { specs }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Column by 0-based position.
    pub fn get(&self, index: usize) -> Option<&ColumnSpec> {
        self.specs.get(index)
    }

    /// Iterates columns in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ColumnSpec> {
        self.specs.iter()
    }

    /// 0-based position of the first column matching `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.matches(name))
    }

    /// Resolves a column reference to a 0-based position.
    pub fn resolve(&self, column: ColumnRef<'_>) -> ClientResult<usize> {
        match column {
            ColumnRef::Index(index) => usize::try_from(index)
                .ok()
                .filter(|i| (1..=self.len()).contains(i))
                .map(|i| i - 1)
                .ok_or(ClientError::ColumnIndexOutOfRange {
                    index,
                    count: self.len(),
                }),
            ColumnRef::Name(name) => self
                .index_of(name)
                .ok_or_else(|| ClientError::NoSuchColumn(name.to_string())),
        }
    }
}

impl FromIterator<ColumnSpec> for ColumnDefinitions {
    fn from_iter<I: IntoIterator<Item = ColumnSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One row: encoded values aligned with its column definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<ColumnDefinitions>,
    values: Vec<Option<Bytes>>,
}

impl Row {
    /// Creates a row, checking that every column has a value slot.
    pub fn new(columns: Arc<ColumnDefinitions>, values: Vec<Option<Bytes>>) -> ClientResult<Self> {
        if values.len() != columns.len() {
            return Err(ClientError::Internal(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Column definitions.
    pub fn columns(&self) -> &Arc<ColumnDefinitions> {
        &self.columns
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for a row without columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if the value at a 0-based position is absent.
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).map_or(true, Option::is_none)
    }

    /// Cell at a 0-based position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; resolve references with
    /// [`ColumnDefinitions::resolve`] first.
    pub fn cell(&self, index: usize) -> Cell<'_> {
        let spec = &self.columns.specs[index];
        Cell::new(
            &spec.name,
            &spec.column_type,
            self.values[index].as_deref(),
        )
    }

    /// Decodes a column in its general form.
    pub fn get_object<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Value> {
        let index = self.columns.resolve(column.into())?;
        self.cell(index).object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Arc<ColumnDefinitions> {
        Arc::new(
            [
                ColumnSpec::new("ks", "t", "id", ColumnType::Int),
                ColumnSpec::new("ks", "t", "Name", ColumnType::Text),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_resolve_index() {
        let defs = defs();
        assert_eq!(defs.resolve(ColumnRef::Index(1)).unwrap(), 0);
        assert_eq!(defs.resolve(2usize.into()).unwrap(), 1);
        assert!(matches!(
            defs.resolve(ColumnRef::Index(0)),
            Err(ClientError::ColumnIndexOutOfRange { index: 0, count: 2 })
        ));
        assert!(matches!(
            defs.resolve(3usize.into()),
            Err(ClientError::ColumnIndexOutOfRange { index: 3, count: 2 })
        ));
        assert!(matches!(
            defs.resolve(ColumnRef::from(-1)),
            Err(ClientError::ColumnIndexOutOfRange { index: -1, count: 2 })
        ));
        let err = defs.resolve(ColumnRef::from(i64::MIN)).unwrap_err();
        assert!(err.to_string().contains(&i64::MIN.to_string()));
    }

    #[test]
    fn test_resolve_name() {
        let defs = defs();
        assert_eq!(defs.resolve("ID".into()).unwrap(), 0);
        assert_eq!(defs.resolve("name".into()).unwrap(), 1);
        assert_eq!(defs.resolve("\"Name\"".into()).unwrap(), 1);
        assert!(matches!(
            defs.resolve("\"name\"".into()),
            Err(ClientError::NoSuchColumn(_))
        ));
    }

    #[test]
    fn test_row_width_checked() {
        assert!(Row::new(defs(), vec![None]).is_err());
        let row = Row::new(defs(), vec![Some(Bytes::from_static(&[0, 0, 0, 3])), None]).unwrap();
        assert_eq!(row.get_object(1).unwrap(), Value::Int(3));
        assert_eq!(row.get_object("name").unwrap(), Value::Null);
        assert!(row.is_null(1));
        assert!(!row.is_null(0));
    }
}
