//! Shared-session lifecycle tests: reference counting, disposal and
//! rebuilding across threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colbridge_client::{ClientError, Connection, SessionCache, SessionHandle};
use colbridge_common::{ConnectionParams, DISPOSED_REFS};
use colbridge_test::{init_tracing, ScriptedBuilder};
use rand::seq::SliceRandom;
use rand::Rng;

fn params(host: &str) -> ConnectionParams {
    ConnectionParams::new()
        .with("host", host)
        .with("keyspace", "test")
}

fn cache(builder: &ScriptedBuilder) -> SessionCache {
    init_tracing();
    SessionCache::new(builder.clone())
}

#[test]
fn test_concurrent_acquire_release_disposes_once() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);
    let key = params("10.0.0.1");

    let threads = 8;
    let per_thread = rand::thread_rng().gen_range(10..50);

    // Hold one reference so the handle survives the acquire phase.
    let anchor = cache.acquire(&key).unwrap();

    let handles: Vec<Arc<SessionHandle>> = thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                s.spawn(move || {
                    (0..per_thread)
                        .map(|_| cache.acquire(&key).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });

    assert_eq!(builder.counters().builds(), 1);
    assert!(handles.iter().all(|h| SessionHandle::same(h, &anchor)));
    assert_eq!(anchor.ref_count(), (threads * per_thread + 1) as i32);

    let mut releases = handles;
    releases.push(Arc::clone(&anchor));
    releases.shuffle(&mut rand::thread_rng());

    let disposals = AtomicUsize::new(0);
    thread::scope(|s| {
        for chunk in releases.chunks(per_thread) {
            let disposals = &disposals;
            s.spawn(move || {
                for handle in chunk {
                    if handle.release() {
                        disposals.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert_eq!(anchor.ref_count(), DISPOSED_REFS);
    assert!(anchor.is_disposed());
    assert_eq!(builder.counters().session_closes(), 1);
    assert_eq!(builder.counters().cluster_closes(), 1);
    assert!(!cache.contains(&key));
}

#[test]
fn test_concurrent_connections_share_one_cluster() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);
    let key = params("10.0.0.2");

    thread::scope(|s| {
        for _ in 0..16 {
            let cache = &cache;
            let key = &key;
            s.spawn(move || {
                let mut conn = Connection::open(cache, key).unwrap();
                assert!(!conn.is_closed());
                conn.close();
            });
        }
    });

    // Connections may interleave with disposal, so more than one build is
    // possible, but every build is closed exactly once.
    let counters = builder.counters();
    assert!(counters.builds() >= 1);
    assert_eq!(counters.session_closes(), counters.builds());
    assert_eq!(counters.cluster_closes(), counters.builds());
    assert!(cache.is_empty());
}

#[test]
fn test_acquire_after_dispose_rebuilds() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);
    let key = params("10.0.0.3");

    let first = cache.acquire(&key).unwrap();
    assert!(first.release());
    assert!(!first.acquire());
    assert_eq!(first.ref_count(), DISPOSED_REFS);
    assert!(!first.release());

    let second = cache.acquire(&key).unwrap();
    assert!(!SessionHandle::same(&second, &first));
    assert_eq!(second.ref_count(), 1);
    assert_eq!(builder.counters().builds(), 2);
}

#[test]
fn test_stale_handle_is_replaced_in_cache() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);
    let key = params("10.0.0.4");

    let stale = cache.load(&key).unwrap();
    assert!(stale.acquire());
    assert!(stale.release());

    let fresh = cache.acquire(&key).unwrap();
    assert!(!SessionHandle::same(&fresh, &stale));
    assert!(cache.contains(&key));
    assert!(fresh.release());
    assert!(!cache.contains(&key));
}

#[test]
fn test_connect_failure_closes_cluster() {
    let builder = ScriptedBuilder::new().failing_connect();
    let cache = cache(&builder);

    let err = Connection::open(&cache, &params("10.0.0.5")).unwrap_err();
    assert!(matches!(err, ClientError::ConnectionFailed(_)));
    assert_eq!(builder.counters().builds(), 1);
    assert_eq!(builder.counters().cluster_closes(), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_missing_host_is_config_error() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);

    let err = Connection::open(&cache, &ConnectionParams::new().with("keyspace", "k")).unwrap_err();
    assert!(matches!(err, ClientError::InvalidConfig(_)));
    assert_eq!(builder.counters().builds(), 0);
}

#[test]
fn test_distinct_params_get_distinct_sessions() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);

    let a = Connection::open(&cache, &params("10.0.0.6")).unwrap();
    let b = Connection::open(&cache, &params("10.0.0.6").with("debug", "true")).unwrap();
    let c = Connection::open(&cache, &params("10.0.0.6")).unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(builder.counters().builds(), 2);
    assert!(SessionHandle::same(
        a.session_handle().unwrap(),
        c.session_handle().unwrap()
    ));
    assert!(b.config().unwrap().debug);

    drop(a);
    drop(b);
    assert_eq!(cache.len(), 1);
    drop(c);
    assert!(cache.is_empty());
    assert_eq!(builder.counters().session_closes(), 2);
}

#[test]
fn test_query_after_close_fails() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);
    let mut conn = Connection::open(&cache, &params("10.0.0.7")).unwrap();

    assert!(conn.close());
    assert!(!conn.close());
    assert!(matches!(
        conn.query("SELECT 1"),
        Err(ClientError::ConnectionClosed)
    ));
}

#[test]
fn test_acquire_races_final_release() {
    let builder = ScriptedBuilder::new();
    let cache = cache(&builder);
    let key = params("10.0.0.8");
    let rounds = 200;

    thread::scope(|s| {
        for worker in 0..8 {
            let cache = &cache;
            let key = &key;
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..rounds {
                    if worker % 2 == 0 {
                        let handle = cache.acquire(key).unwrap();
                        assert!(!handle.is_disposed());
                        assert!(handle.ref_count() >= 1);
                        if rng.gen_bool(0.5) {
                            thread::yield_now();
                        }
                        handle.release();
                    } else {
                        let mut conn = Connection::open(cache, key).unwrap();
                        let handle = conn.session_handle().unwrap();
                        assert!(!handle.is_disposed());
                        assert!(handle.ref_count() >= 1);
                        if rng.gen_bool(0.5) {
                            thread::sleep(Duration::from_micros(rng.gen_range(0..50)));
                        }
                        conn.close();
                        assert!(conn.is_closed());
                    }
                }
            });
        }
    });

    // Every build was handed out at least once, then disposed exactly once.
    let counters = builder.counters();
    assert!(counters.builds() >= 1);
    assert_eq!(counters.session_closes(), counters.builds());
    assert_eq!(counters.cluster_closes(), counters.builds());
    assert!(cache.is_empty());
}
