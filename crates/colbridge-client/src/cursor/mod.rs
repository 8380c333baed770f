//! Forward-only row cursor.
//!
//! A [`RowCursor`] walks one or more concatenated row sources exactly once:
//!
//! ```text
//! before-first --next()--> on(1) --next()--> ... on(n) --next()--> after-last
//! ```
//!
//! After-last is terminal. Every accessor resolves its column against the
//! current row and records whether the value was null; [`RowCursor::was_null`]
//! reports that flag for the most recent access only.

mod metadata;
mod row;
mod source;

pub use metadata::{Nullability, ResultMetadata};
pub use row::{ColumnDefinitions, ColumnRef, ColumnSpec, Row};
pub use source::{ConcatSource, LazySource, QueryOutput, ResultPage, RowSource};

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use colbridge_common::{CursorOptions, CursorType, FetchDirection, AFTER_LAST_ROW};
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;
use uuid::Uuid;

use crate::codec::{
    Cell, CqlDuration, Decimal, SqlDate, SqlTime, SqlTimestamp, TupleValue, UdtValue, Value,
    ValueMap, ValueSet, Varint,
};
use crate::error::{ClientError, ClientResult};

/// Cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// No row read yet.
    BeforeFirst,
    /// On the given 1-based row.
    On(u64),
    /// Past the last row. Terminal.
    AfterLast,
}

/// Forward-only cursor over the rows of one query.
#[derive(Debug)]
pub struct RowCursor {
    /// Remaining rows; dropped once exhausted or closed.
    source: Option<ConcatSource>,
    /// Definitions of the first source, for metadata.
    columns: Arc<ColumnDefinitions>,
    position: Position,
    current: Option<Row>,
    /// One row pulled early by `is_last`.
    lookahead: Option<Row>,
    last_null: AtomicBool,
    options: CursorOptions,
    closed: bool,
}

impl RowCursor {
    /// Creates a cursor over a query's output.
    pub fn new(output: QueryOutput, options: CursorOptions) -> Self {
        let source = ConcatSource::from(output);
        Self {
            columns: Arc::clone(source.columns()),
            source: Some(source),
            position: Position::BeforeFirst,
            current: None,
            lookahead: None,
            last_null: AtomicBool::new(false),
            options,
            closed: false,
        }
    }

    /// Creates a cursor over a single source with default options.
    pub fn from_source(source: impl RowSource + 'static) -> Self {
        Self::new(QueryOutput::Single(Box::new(source)), CursorOptions::default())
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.closed {
            Err(ClientError::CursorClosed)
        } else {
            Ok(())
        }
    }

    fn pull(&mut self) -> ClientResult<Option<Row>> {
        if let Some(row) = self.lookahead.take() {
            return Ok(Some(row));
        }
        match self.source.as_mut() {
            Some(source) => source.next_row(),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Advances to the next row.
    ///
    /// Returns false once no rows remain, and on every later call.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> ClientResult<bool> {
        self.ensure_open()?;
        let position = match self.position {
            Position::AfterLast => return Ok(false),
            Position::BeforeFirst => 0,
            Position::On(n) => n,
        };

        match self.pull()? {
            Some(row) => {
                self.current = Some(row);
                self.position = Position::On(position + 1);
                Ok(true)
            }
            None => {
                trace!(rows = position, "cursor exhausted");
                self.current = None;
                self.source = None;
                self.position = Position::AfterLast;
                Ok(false)
            }
        }
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Current row number: 0 before the first row, [`AFTER_LAST_ROW`] after
    /// the last.
    pub fn row(&self) -> u64 {
        match self.position {
            Position::BeforeFirst => 0,
            Position::On(n) => n,
            Position::AfterLast => AFTER_LAST_ROW,
        }
    }

    /// Returns true before the first call to [`next`](Self::next).
    pub fn is_before_first(&self) -> bool {
        self.position == Position::BeforeFirst
    }

    /// Returns true once the cursor has moved past the last row.
    pub fn is_after_last(&self) -> bool {
        self.position == Position::AfterLast
    }

    /// Returns true on the first row.
    pub fn is_first(&self) -> bool {
        self.position == Position::On(1)
    }

    /// Returns true on the last row. May pull the next row early.
    pub fn is_last(&mut self) -> ClientResult<bool> {
        self.ensure_open()?;
        if !matches!(self.position, Position::On(_)) {
            return Ok(false);
        }
        if self.lookahead.is_none() {
            self.lookahead = match self.source.as_mut() {
                Some(source) => source.next_row()?,
                None => None,
            };
        }
        Ok(self.lookahead.is_none())
    }

    /// Not supported on a forward-only cursor.
    pub fn absolute(&mut self, _row: i64) -> ClientResult<bool> {
        Err(ClientError::FeatureNotSupported("absolute"))
    }

    /// Not supported on a forward-only cursor.
    pub fn relative(&mut self, _rows: i64) -> ClientResult<bool> {
        Err(ClientError::FeatureNotSupported("relative"))
    }

    /// Not supported on a forward-only cursor.
    pub fn previous(&mut self) -> ClientResult<bool> {
        Err(ClientError::FeatureNotSupported("previous"))
    }

    /// Not supported on a forward-only cursor.
    pub fn first(&mut self) -> ClientResult<bool> {
        Err(ClientError::FeatureNotSupported("first"))
    }

    /// Not supported on a forward-only cursor.
    pub fn last(&mut self) -> ClientResult<bool> {
        Err(ClientError::FeatureNotSupported("last"))
    }

    /// Not supported on a forward-only cursor.
    pub fn before_first(&mut self) -> ClientResult<()> {
        Err(ClientError::FeatureNotSupported("before_first"))
    }

    /// Not supported on a forward-only cursor.
    pub fn after_last(&mut self) -> ClientResult<()> {
        Err(ClientError::FeatureNotSupported("after_last"))
    }

    /// Closes the cursor and releases its sources.
    pub fn close(&mut self) {
        self.closed = true;
        self.source = None;
        self.current = None;
        self.lookahead = None;
    }

    /// Returns true once closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Fetch direction hint.
    pub fn fetch_direction(&self) -> FetchDirection {
        self.options.fetch_direction
    }

    /// Sets the fetch direction. A forward-only cursor accepts only
    /// [`FetchDirection::Forward`].
    pub fn set_fetch_direction(&mut self, direction: FetchDirection) -> ClientResult<()> {
        self.ensure_open()?;
        if self.options.cursor_type == CursorType::ForwardOnly
            && direction != FetchDirection::Forward
        {
            return Err(ClientError::InvalidFetchDirection(direction.code()));
        }
        self.options.fetch_direction = direction;
        Ok(())
    }

    /// Fetch size hint.
    pub fn fetch_size(&self) -> i32 {
        self.options.fetch_size
    }

    /// Sets the fetch size hint.
    pub fn set_fetch_size(&mut self, size: i32) -> ClientResult<()> {
        self.ensure_open()?;
        if size < 0 {
            return Err(ClientError::InvalidFetchSize(size));
        }
        self.options.fetch_size = size;
        Ok(())
    }

    /// Cursor type; always forward only.
    pub fn cursor_type(&self) -> CursorType {
        self.options.cursor_type
    }

    /// Column metadata, independent of position.
    pub fn metadata(&self) -> ResultMetadata {
        ResultMetadata::new(Arc::clone(&self.columns), self.options.catalog.clone())
    }

    // =========================================================================
    // Column Access
    // =========================================================================

    /// Resolves a column on the current row and records its null flag.
    fn cell<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Cell<'_>> {
        self.ensure_open()?;
        let row = self.current.as_ref().ok_or(ClientError::NoCurrentRow)?;
        let index = row.columns().resolve(column.into())?;
        let cell = row.cell(index);
        self.last_null.store(cell.is_null(), Ordering::Relaxed);
        Ok(cell)
    }

    /// Returns true if the most recently read column was null.
    pub fn was_null(&self) -> bool {
        self.last_null.load(Ordering::Relaxed)
    }

    /// 1-based position of a named column.
    ///
    /// A lookup, not a column access: [`was_null`](Self::was_null) is left
    /// unchanged whether or not the cursor is on a row.
    pub fn find_column(&self, name: &str) -> ClientResult<usize> {
        self.ensure_open()?;
        let columns = match &self.current {
            Some(row) => row.columns(),
            None => &self.columns,
        };
        columns.resolve(ColumnRef::Name(name)).map(|i| i + 1)
    }

    /// Reads a column through a [`FromCell`] conversion.
    pub fn get<'c, T: FromCell>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<T> {
        T::from_cell(&self.cell(column)?)
    }

    /// General accessor: the value in its natural client form.
    pub fn get_object<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Value> {
        self.cell(column)?.object()
    }

    /// Text form of the value; `None` for null.
    pub fn get_string<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<String>> {
        self.cell(column)?.text()
    }

    /// `boolean`; null reads as false.
    pub fn get_boolean<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<bool> {
        self.cell(column)?.boolean()
    }

    /// `tinyint`; null reads as 0.
    pub fn get_byte<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<i8> {
        self.cell(column)?.byte()
    }

    /// `smallint`; null reads as 0.
    pub fn get_short<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<i16> {
        self.cell(column)?.short()
    }

    /// 32-bit integer, read leniently: malformed values read as 0.
    pub fn get_int<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<i32> {
        self.cell(column)?.int_lenient()
    }

    /// 64-bit integer; see [`Cell::wide_integer`].
    pub fn get_long<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<i64> {
        self.cell(column)?.wide_integer()
    }

    /// `float`; null reads as 0.
    pub fn get_float<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<f32> {
        self.cell(column)?.float()
    }

    /// 64-bit float; see [`Cell::wide_float`].
    pub fn get_double<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<f64> {
        self.cell(column)?.wide_float()
    }

    /// `decimal` at its stored scale.
    pub fn get_decimal<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<Decimal>> {
        self.cell(column)?.decimal(None)
    }

    /// `decimal` rescaled exactly to `scale`.
    pub fn get_decimal_with_scale<'c>(
        &self,
        column: impl Into<ColumnRef<'c>>,
        scale: i32,
    ) -> ClientResult<Option<Decimal>> {
        self.cell(column)?.decimal(Some(scale))
    }

    /// `varint`.
    pub fn get_varint<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<Varint>> {
        self.cell(column)?.varint()
    }

    /// Raw bytes of a `blob` column.
    pub fn get_bytes<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<Bytes>> {
        self.cell(column)?.bytes()
    }

    /// A `blob` column as a byte stream.
    pub fn get_binary_stream<'c>(
        &self,
        column: impl Into<ColumnRef<'c>>,
    ) -> ClientResult<Option<Reader<Bytes>>> {
        Ok(self.get_bytes(column)?.map(Buf::reader))
    }

    /// `uuid` or `timeuuid`.
    pub fn get_uuid<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<Uuid>> {
        self.cell(column)?.uuid()
    }

    /// `inet`.
    pub fn get_inet<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<IpAddr>> {
        self.cell(column)?.inet()
    }

    /// `date`.
    pub fn get_date<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<SqlDate>> {
        self.cell(column)?.date()
    }

    /// `time`, at millisecond precision.
    pub fn get_time<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<SqlTime>> {
        self.cell(column)?.time()
    }

    /// `timestamp`.
    pub fn get_timestamp<'c>(
        &self,
        column: impl Into<ColumnRef<'c>>,
    ) -> ClientResult<Option<SqlTimestamp>> {
        self.cell(column)?.timestamp()
    }

    /// `duration`.
    pub fn get_duration<'c>(
        &self,
        column: impl Into<ColumnRef<'c>>,
    ) -> ClientResult<Option<CqlDuration>> {
        self.cell(column)?.duration()
    }

    /// `list`.
    pub fn get_list<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<Vec<Value>>> {
        self.cell(column)?.list()
    }

    /// `set`.
    pub fn get_set<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<ValueSet>> {
        self.cell(column)?.set()
    }

    /// `map`.
    pub fn get_map<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<ValueMap>> {
        self.cell(column)?.map()
    }

    /// User-defined type value.
    pub fn get_udt<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<UdtValue>> {
        self.cell(column)?.udt()
    }

    /// Tuple value.
    pub fn get_tuple<'c>(&self, column: impl Into<ColumnRef<'c>>) -> ClientResult<Option<TupleValue>> {
        self.cell(column)?.tuple()
    }
}

/// Conversion from a column cell, for [`RowCursor::get`].
pub trait FromCell: Sized {
    /// Reads the cell.
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self>;
}

impl FromCell for bool {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.boolean()
    }
}

impl FromCell for i8 {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.byte()
    }
}

impl FromCell for i16 {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.short()
    }
}

impl FromCell for i32 {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.int_lenient()
    }
}

impl FromCell for i64 {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.wide_integer()
    }
}

impl FromCell for f32 {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.float()
    }
}

impl FromCell for f64 {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.wide_float()
    }
}

impl FromCell for Value {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.object()
    }
}

impl FromCell for Option<String> {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.text()
    }
}

impl FromCell for Option<Uuid> {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.uuid()
    }
}

impl FromCell for Option<Decimal> {
    fn from_cell(cell: &Cell<'_>) -> ClientResult<Self> {
        cell.decimal(None)
    }
}

/// A cursor shared between threads.
///
/// Every call holds the cursor lock, so accessors never overlap an advance.
#[derive(Debug, Clone)]
pub struct SharedCursor {
    inner: Arc<Mutex<RowCursor>>,
}

impl SharedCursor {
    /// Wraps a cursor.
    pub fn new(cursor: RowCursor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cursor)),
        }
    }

    /// Advances to the next row.
    pub fn advance(&self) -> ClientResult<bool> {
        self.inner.lock().next()
    }

    /// Locks the cursor for accessor calls.
    pub fn lock(&self) -> MutexGuard<'_, RowCursor> {
        self.inner.lock()
    }

    /// Closes the cursor.
    pub fn close(&self) {
        self.inner.lock().close();
    }
}
