//! # colbridge-test
//!
//! Integration test support for colbridge.
//!
//! This crate contains:
//! - A scripted in-memory cluster that counts builds, connects and closes
//! - Result page builders that encode [`Value`]s with the client codec
//! - Tracing setup for test runs

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

use bytes::Bytes;
use colbridge_client::codec::encode_value;
use colbridge_client::cursor::{ColumnDefinitions, ColumnSpec, QueryOutput, ResultPage, RowSource};
use colbridge_client::{
    ClientError, ClientResult, Cluster, ClusterBuilder, ClusterSession, ColumnType, Value,
};
use colbridge_common::SessionConfig;
use parking_lot::RwLock;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test subscriber filtered by `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("colbridge_client=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

// =========================================================================
// Result pages
// =========================================================================

/// Builds a single result page from typed values.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    keyspace: String,
    table: String,
    specs: Vec<ColumnSpec>,
    rows: Vec<Vec<Option<Bytes>>>,
}

impl PageBuilder {
    /// Creates a builder for `keyspace.table`.
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            specs: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        let spec = ColumnSpec::new(self.keyspace.clone(), self.table.clone(), name, ty);
        self.specs.push(spec);
        self
    }

    /// Appends a row, encoding each value as its column type.
    pub fn row(mut self, values: &[Value]) -> ClientResult<Self> {
        if values.len() != self.specs.len() {
            return Err(ClientError::Internal(format!(
                "row has {} values for {} columns",
                values.len(),
                self.specs.len()
            )));
        }
        let encoded = self
            .specs
            .iter()
            .zip(values)
            .map(|(spec, value)| encode_value(&spec.column_type, value))
            .collect::<ClientResult<Vec<_>>>()?;
        self.rows.push(encoded);
        Ok(self)
    }

    /// Appends a row of raw cells, bypassing the codec.
    #[must_use]
    pub fn raw_row(mut self, cells: Vec<Option<Bytes>>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Column definitions of the page.
    pub fn columns(&self) -> Arc<ColumnDefinitions> {
        Arc::new(self.specs.iter().cloned().collect())
    }

    /// Finishes the page.
    pub fn build(self) -> ResultPage {
        let columns = self.columns();
        ResultPage::new(columns, self.rows)
    }
}

/// Splits `rows` integer rows into `sources` pages of one `id int` column.
///
/// Empty pages are interleaved when `with_empty` is set. Row ids run from 0.
pub fn int_pages(sources: usize, rows_per_source: usize, with_empty: bool) -> QueryOutput {
    let columns = Arc::new(ColumnDefinitions::new(vec![ColumnSpec::new(
        "test",
        "numbers",
        "id",
        ColumnType::Int,
    )]));
    let mut next = 0_i32;
    let mut pages: Vec<Box<dyn RowSource>> = Vec::with_capacity(sources * 2);
    for _ in 0..sources {
        if with_empty {
            pages.push(Box::new(ResultPage::new(Arc::clone(&columns), Vec::new())));
        }
        let rows = (0..rows_per_source)
            .map(|_| {
                let cell = Bytes::copy_from_slice(&next.to_be_bytes());
                next += 1;
                vec![Some(cell)]
            })
            .collect();
        pages.push(Box::new(ResultPage::new(Arc::clone(&columns), rows)));
    }
    QueryOutput::Multi(pages)
}

// =========================================================================
// Scripted cluster
// =========================================================================

/// Lifecycle counters shared by a scripted builder and everything it builds.
#[derive(Debug, Default)]
pub struct ClusterCounters {
    /// Clusters built.
    pub builds: AtomicU64,
    /// Sessions connected.
    pub connects: AtomicU64,
    /// Queries executed.
    pub queries: AtomicU64,
    /// Sessions closed.
    pub session_closes: AtomicU64,
    /// Clusters closed.
    pub cluster_closes: AtomicU64,
}

impl ClusterCounters {
    /// Reads one counter.
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::SeqCst)
    }

    /// Clusters built so far.
    pub fn builds(&self) -> u64 {
        Self::get(&self.builds)
    }

    /// Sessions closed so far.
    pub fn session_closes(&self) -> u64 {
        Self::get(&self.session_closes)
    }

    /// Clusters closed so far.
    pub fn cluster_closes(&self) -> u64 {
        Self::get(&self.cluster_closes)
    }
}

type QueryFactory = Arc<dyn Fn() -> ClientResult<QueryOutput> + Send + Sync>;
type Scripts = Arc<RwLock<HashMap<String, QueryFactory>>>;

/// Builds scripted clusters whose sessions answer registered queries.
#[derive(Clone, Default)]
pub struct ScriptedBuilder {
    counters: Arc<ClusterCounters>,
    scripts: Scripts,
    fail_connect: bool,
}

impl ScriptedBuilder {
    /// Creates a builder with no scripted queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every connect attempt fail.
    #[must_use]
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Registers the output for a query string.
    pub fn script<F>(&self, query: impl Into<String>, output: F)
    where
        F: Fn() -> ClientResult<QueryOutput> + Send + Sync + 'static,
    {
        self.scripts.write().insert(query.into(), Arc::new(output));
    }

    /// Shared lifecycle counters.
    pub fn counters(&self) -> Arc<ClusterCounters> {
        Arc::clone(&self.counters)
    }
}

impl std::fmt::Debug for ScriptedBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedBuilder")
            .field("counters", &self.counters)
            .field("scripts", &self.scripts.read().len())
            .field("fail_connect", &self.fail_connect)
            .finish()
    }
}

impl ClusterBuilder for ScriptedBuilder {
    fn build(&self, config: &SessionConfig) -> ClientResult<Box<dyn Cluster>> {
        self.counters.builds.fetch_add(1, Ordering::SeqCst);
        debug!(hosts = ?config.hosts, port = config.port, "building scripted cluster");
        Ok(Box::new(ScriptedCluster {
            counters: Arc::clone(&self.counters),
            scripts: Arc::clone(&self.scripts),
            fail_connect: self.fail_connect,
        }))
    }
}

struct ScriptedCluster {
    counters: Arc<ClusterCounters>,
    scripts: Scripts,
    fail_connect: bool,
}

impl Cluster for ScriptedCluster {
    fn connect(&mut self, keyspace: Option<&str>) -> ClientResult<Box<dyn ClusterSession>> {
        if self.fail_connect {
            return Err(ClientError::ConnectionFailed("no hosts reachable".into()));
        }
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            keyspace: keyspace.map(str::to_string),
            counters: Arc::clone(&self.counters),
            scripts: Arc::clone(&self.scripts),
        }))
    }

    fn close(&mut self) {
        self.counters.cluster_closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedSession {
    keyspace: Option<String>,
    counters: Arc<ClusterCounters>,
    scripts: Scripts,
}

impl ClusterSession for ScriptedSession {
    fn execute(&self, query: &str) -> ClientResult<QueryOutput> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        let factory = self.scripts.read().get(query).cloned();
        match factory {
            Some(factory) => factory(),
            None => Err(ClientError::QueryFailed(format!(
                "unscripted query in keyspace {:?}: {query}",
                self.keyspace
            ))),
        }
    }

    fn close(&self) {
        self.counters.session_closes.fetch_add(1, Ordering::SeqCst);
    }
}
