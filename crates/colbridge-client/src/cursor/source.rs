//! Row sources: pull-based sequences of rows sharing one set of column
//! definitions.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::row::{ColumnDefinitions, Row};
use crate::error::ClientResult;

/// A forward-only sequence of rows.
///
/// `next_row` may block on I/O. Once it returns `Ok(None)` the source is
/// exhausted.
pub trait RowSource: Send {
    /// Column definitions of every row in this source.
    fn columns(&self) -> &Arc<ColumnDefinitions>;

    /// Pulls the next row.
    fn next_row(&mut self) -> ClientResult<Option<Row>>;
}

impl fmt::Debug for dyn RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSource")
            .field("columns", &self.columns().len())
            .finish()
    }
}

/// A fully received page of encoded rows.
#[derive(Debug, Clone)]
pub struct ResultPage {
    columns: Arc<ColumnDefinitions>,
    rows: VecDeque<Vec<Option<Bytes>>>,
}

impl ResultPage {
    /// Creates a page.
    pub fn new(columns: Arc<ColumnDefinitions>, rows: Vec<Vec<Option<Bytes>>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    /// Rows not yet pulled.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for ResultPage {
    fn columns(&self) -> &Arc<ColumnDefinitions> {
        &self.columns
    }

    fn next_row(&mut self) -> ClientResult<Option<Row>> {
        self.rows
            .pop_front()
            .map(|values| Row::new(Arc::clone(&self.columns), values))
            .transpose()
    }
}

/// Adapts an iterator of encoded rows, such as a paging network reader.
pub struct LazySource<I> {
    columns: Arc<ColumnDefinitions>,
    rows: I,
}

impl<I> LazySource<I>
where
    I: Iterator<Item = ClientResult<Vec<Option<Bytes>>>> + Send,
{
    /// Wraps an iterator.
    pub fn new(columns: Arc<ColumnDefinitions>, rows: I) -> Self {
        Self { columns, rows }
    }
}

impl<I> RowSource for LazySource<I>
where
    I: Iterator<Item = ClientResult<Vec<Option<Bytes>>>> + Send,
{
    fn columns(&self) -> &Arc<ColumnDefinitions> {
        &self.columns
    }

    fn next_row(&mut self) -> ClientResult<Option<Row>> {
        match self.rows.next() {
            Some(values) => Row::new(Arc::clone(&self.columns), values?).map(Some),
            None => Ok(None),
        }
    }
}

/// What a cluster session returns for one query.
#[derive(Debug)]
pub enum QueryOutput {
    /// One row sequence.
    Single(Box<dyn RowSource>),
    /// One sequence per statement of a batch, read back to back.
    Multi(Vec<Box<dyn RowSource>>),
}

impl QueryOutput {
    /// Number of underlying sources.
    pub fn source_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(sources) => sources.len(),
        }
    }
}

/// Several row sources read as one sequence.
///
/// Sources are drained front to back and dropped once exhausted. The
/// column definitions are those of the first source.
pub struct ConcatSource {
    columns: Arc<ColumnDefinitions>,
    sources: VecDeque<Box<dyn RowSource>>,
}

impl ConcatSource {
    /// Concatenates sources in order.
    pub fn new(sources: Vec<Box<dyn RowSource>>) -> Self {
        let columns = sources
            .first()
            .map(|s| Arc::clone(s.columns()))
            .unwrap_or_default();
        if sources.len() > 1 {
            debug!(sources = sources.len(), "concatenating row sources");
        }
        Self {
            columns,
            sources: sources.into(),
        }
    }

    /// Sources not yet exhausted.
    pub fn pending_sources(&self) -> usize {
        self.sources.len()
    }
}

impl From<QueryOutput> for ConcatSource {
    fn from(output: QueryOutput) -> Self {
        match output {
            QueryOutput::Single(source) => Self::new(vec![source]),
            QueryOutput::Multi(sources) => Self::new(sources),
        }
    }
}

impl RowSource for ConcatSource {
    fn columns(&self) -> &Arc<ColumnDefinitions> {
        &self.columns
    }

    fn next_row(&mut self) -> ClientResult<Option<Row>> {
        while let Some(source) = self.sources.front_mut() {
            if let Some(row) = source.next_row()? {
                return Ok(Some(row));
            }
            self.sources.pop_front();
        }
        Ok(None)
    }
}

impl fmt::Debug for ConcatSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcatSource")
            .field("columns", &self.columns.len())
            .field("pending_sources", &self.sources.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::row::ColumnSpec;
    use crate::types::ColumnType;

    fn defs() -> Arc<ColumnDefinitions> {
        Arc::new(ColumnDefinitions::new(vec![ColumnSpec::new(
            "ks",
            "t",
            "n",
            ColumnType::Int,
        )]))
    }

    fn page(values: &[i32]) -> Box<dyn RowSource> {
        let rows = values
            .iter()
            .map(|v| vec![Some(Bytes::copy_from_slice(&v.to_be_bytes()))])
            .collect();
        Box::new(ResultPage::new(defs(), rows))
    }

    fn drain(source: &mut dyn RowSource) -> Vec<i32> {
        let mut out = Vec::new();
        while let Some(row) = source.next_row().unwrap() {
            out.push(row.cell(0).int_lenient().unwrap());
        }
        out
    }

    #[test]
    fn test_page_drains_in_order() {
        let mut page = page(&[1, 2, 3]);
        assert_eq!(drain(page.as_mut()), vec![1, 2, 3]);
        assert!(page.next_row().unwrap().is_none());
    }

    #[test]
    fn test_concat_skips_empty_sources() {
        let mut concat = ConcatSource::new(vec![page(&[]), page(&[1]), page(&[]), page(&[2, 3])]);
        assert_eq!(drain(&mut concat), vec![1, 2, 3]);
        assert_eq!(concat.pending_sources(), 0);
    }

    #[test]
    fn test_concat_of_nothing() {
        let mut concat = ConcatSource::from(QueryOutput::Multi(Vec::new()));
        assert!(concat.columns().is_empty());
        assert!(concat.next_row().unwrap().is_none());
    }

    #[test]
    fn test_lazy_source_propagates_errors() {
        let rows = vec![
            Ok(vec![Some(Bytes::from_static(&[0, 0, 0, 1]))]),
            Err(crate::error::ClientError::QueryFailed("page 2 timed out".into())),
        ];
        let mut source = LazySource::new(defs(), rows.into_iter());
        assert!(source.next_row().unwrap().is_some());
        assert!(source.next_row().is_err());
    }
}
