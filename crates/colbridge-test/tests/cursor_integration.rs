//! End-to-end cursor tests over scripted cluster sessions.
//!
//! Results are built with the client codec, served by a scripted session
//! and read back through a connection's cursor.

use bytes::Bytes;
use colbridge_client::{
    ClientError, ColumnType, Connection, CqlDuration, Decimal, SessionCache, SqlDate,
    SqlTimestamp, Value, ValueMap, ValueSet, Varint,
};
use colbridge_common::{ConnectionParams, AFTER_LAST_ROW};
use colbridge_test::{init_tracing, int_pages, PageBuilder, ScriptedBuilder};

fn params() -> ConnectionParams {
    ConnectionParams::new()
        .with("host", "10.0.0.1")
        .with("keyspace", "test")
}

fn connect(builder: &ScriptedBuilder) -> (SessionCache, Connection) {
    init_tracing();
    let cache = SessionCache::new(builder.clone());
    let conn = Connection::open(&cache, &params()).unwrap();
    (cache, conn)
}

#[test]
fn test_concatenates_many_sources() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT id FROM numbers", || Ok(int_pages(1000, 3, true)));
    let (_cache, conn) = connect(&builder);

    let mut cursor = conn.query("SELECT id FROM numbers").unwrap();
    assert!(cursor.is_before_first());

    let mut expected = 0_i32;
    while cursor.next().unwrap() {
        assert_eq!(cursor.get_int("id").unwrap(), expected);
        expected += 1;
        assert_eq!(cursor.row(), expected as u64);
    }
    assert_eq!(expected, 3000);
    assert!(cursor.is_after_last());
    assert_eq!(cursor.row(), AFTER_LAST_ROW);

    assert!(!cursor.next().unwrap());
    assert!(!cursor.next().unwrap());
    assert!(cursor.is_after_last());
}

#[test]
fn test_only_empty_sources() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT id FROM numbers", || Ok(int_pages(50, 0, true)));
    let (_cache, conn) = connect(&builder);

    let mut cursor = conn.query("SELECT id FROM numbers").unwrap();
    assert!(!cursor.next().unwrap());
    assert!(cursor.is_after_last());
    assert!(matches!(cursor.get_int(1), Err(ClientError::NoCurrentRow)));
}

#[test]
fn test_wide_integer_boundaries() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT * FROM wide", || {
        let page = PageBuilder::new("test", "wide")
            .column("i", ColumnType::Int)
            .column("b", ColumnType::BigInt)
            .column("c", ColumnType::Counter)
            .column("v", ColumnType::Varint)
            .row(&[
                Value::Int(i32::MIN),
                Value::BigInt(i64::MAX),
                Value::BigInt(i64::MIN),
                Value::Varint(Varint::from(i64::MIN)),
            ])?
            .row(&[
                Value::Int(i32::MAX),
                Value::BigInt(-1),
                Value::BigInt(0),
                Value::Varint("18446744073709551617".parse()?),
            ])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT * FROM wide").unwrap();

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_long("i").unwrap(), i64::from(i32::MIN));
    assert_eq!(cursor.get_int("i").unwrap(), i32::MIN);
    assert_eq!(cursor.get_long("b").unwrap(), i64::MAX);
    assert_eq!(cursor.get_long("c").unwrap(), i64::MIN);
    assert_eq!(cursor.get_long("v").unwrap(), i64::MIN);
    // Out of int range reads as 0.
    assert_eq!(cursor.get_int("v").unwrap(), 0);
    assert!(matches!(
        cursor.get_int("b"),
        Err(ClientError::TypeMismatch { .. })
    ));

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_long("i").unwrap(), i64::from(i32::MAX));
    assert_eq!(cursor.get_long("b").unwrap(), -1);
    // 2^64 + 1 keeps its low 64 bits.
    assert_eq!(cursor.get_long("v").unwrap(), 1);
    assert_eq!(
        cursor.get_varint("v").unwrap().unwrap().to_string(),
        "18446744073709551617"
    );
}

#[test]
fn test_float_widens_without_reparsing() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT f, d FROM floats", || {
        let page = PageBuilder::new("test", "floats")
            .column("f", ColumnType::Float)
            .column("d", ColumnType::Double)
            .row(&[Value::Float(1.23456_f32), Value::Double(1.23456)])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT f, d FROM floats").unwrap();

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_float("f").unwrap(), 1.23456_f32);
    assert_eq!(cursor.get_double("f").unwrap(), f64::from(1.23456_f32));
    assert_eq!(cursor.get_double("d").unwrap(), 1.23456);
    assert!(matches!(
        cursor.get_float("d"),
        Err(ClientError::TypeMismatch { .. })
    ));
}

#[test]
fn test_null_values() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT * FROM events", || {
        let page = PageBuilder::new("test", "events")
            .column("day", ColumnType::Date)
            .column("at", ColumnType::Time)
            .column("ts", ColumnType::Timestamp)
            .column("n", ColumnType::Int)
            .column("amount", ColumnType::Decimal)
            .column("span", ColumnType::Duration)
            .row(&[
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
            ])?
            .row(&[
                Value::Date(SqlDate::from_epoch_days(19_000)?),
                Value::Null,
                Value::Timestamp(SqlTimestamp::from_millis(1_700_000_000_123)),
                Value::Int(7),
                Value::Decimal("12.50".parse::<Decimal>()?),
                Value::Duration(CqlDuration::new(1, 2, 3_000_000_000)?),
            ])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT * FROM events").unwrap();

    assert!(cursor.next().unwrap());
    assert!(cursor.get_date("day").unwrap().is_none());
    assert!(cursor.was_null());
    assert!(cursor.get_time("at").unwrap().is_none());
    assert!(cursor.get_timestamp("ts").unwrap().is_none());
    assert!(cursor.get_duration("span").unwrap().is_none());
    assert!(cursor.get_decimal("amount").unwrap().is_none());
    assert_eq!(cursor.get_int("n").unwrap(), 0);
    assert!(cursor.was_null());
    assert_eq!(cursor.get_object("n").unwrap(), Value::Null);

    assert!(cursor.next().unwrap());
    assert_eq!(
        cursor.get_date("day").unwrap().unwrap().to_string(),
        "2022-01-08"
    );
    assert!(!cursor.was_null());
    assert_eq!(
        cursor.get_timestamp("ts").unwrap().unwrap().millis(),
        1_700_000_000_123
    );
    assert_eq!(cursor.get_string("amount").unwrap().as_deref(), Some("12.50"));
    assert_eq!(cursor.get_string("span").unwrap().as_deref(), Some("1mo2d3s"));
    assert!(cursor.get_time("at").unwrap().is_none());
    assert!(cursor.was_null());
}

#[test]
fn test_empty_collections() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT * FROM bags", || {
        let page = PageBuilder::new("test", "bags")
            .column("l", ColumnType::list(ColumnType::Int))
            .column("s", ColumnType::set(ColumnType::Text))
            .column("m", ColumnType::map(ColumnType::Text, ColumnType::Int))
            .raw_row(vec![
                Some(Bytes::new()),
                Some(Bytes::new()),
                Some(Bytes::new()),
            ])
            .row(&[
                Value::List(Vec::new()),
                Value::Set(ValueSet::new()),
                Value::Map(ValueMap::new()),
            ])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT * FROM bags").unwrap();

    for _ in 0..2 {
        assert!(cursor.next().unwrap());
        assert!(cursor.get_list("l").unwrap().unwrap().is_empty());
        assert!(cursor.get_set("s").unwrap().unwrap().is_empty());
        assert!(cursor.get_map("m").unwrap().unwrap().is_empty());
        assert!(!cursor.was_null());
    }
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_collection_contents() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT tags, scores FROM players", || {
        let tags: ValueSet = ["b", "a", "b"]
            .into_iter()
            .map(|t| Value::Text(t.to_string()))
            .collect();
        let scores: ValueMap = [("x", 1), ("y", 2)]
            .into_iter()
            .map(|(k, v)| (Value::Text(k.to_string()), Value::Int(v)))
            .collect();
        let page = PageBuilder::new("test", "players")
            .column("tags", ColumnType::set(ColumnType::Text))
            .column("scores", ColumnType::map(ColumnType::Text, ColumnType::Int))
            .row(&[Value::Set(tags), Value::Map(scores)])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT tags, scores FROM players").unwrap();

    assert!(cursor.next().unwrap());
    let tags = cursor.get_set("tags").unwrap().unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&Value::Text("a".into())));
    let scores = cursor.get_map(2).unwrap().unwrap();
    assert_eq!(scores.get(&Value::Text("y".into())), Some(&Value::Int(2)));
    assert_eq!(cursor.get_string("scores").unwrap().as_deref(), Some("{x=1, y=2}"));
}

#[test]
fn test_malformed_element_fails_collection() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT l FROM broken", || {
        // One element of length 3 in a list<int>.
        let raw = Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 3, 1, 2, 3]);
        let page = PageBuilder::new("test", "broken")
            .column("l", ColumnType::list(ColumnType::Int))
            .raw_row(vec![Some(raw)])
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT l FROM broken").unwrap();

    assert!(cursor.next().unwrap());
    let err = cursor.get_list("l").unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn test_metadata_does_not_touch_was_null() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT a, b FROM t", || {
        let page = PageBuilder::new("test", "t")
            .column("a", ColumnType::Text)
            .column("b", ColumnType::Decimal)
            .row(&[Value::Null, Value::Null])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT a, b FROM t").unwrap();

    assert!(cursor.next().unwrap());
    assert!(cursor.get_string("a").unwrap().is_none());
    assert!(cursor.was_null());

    let metadata = cursor.metadata();
    assert_eq!(metadata.column_count(), 2);
    assert_eq!(metadata.column_type_name(1).unwrap(), "text");
    assert_eq!(metadata.display_size(2).unwrap(), 40);
    assert_eq!(metadata.table_name(1).unwrap(), "t");
    assert!(cursor.was_null());
}

#[test]
fn test_column_lookup() {
    let builder = ScriptedBuilder::new();
    builder.script("SELECT \"Name\" FROM t", || {
        let page = PageBuilder::new("test", "t")
            .column("Name", ColumnType::Text)
            .row(&[Value::Text("ada".into())])?
            .build();
        Ok(colbridge_client::QueryOutput::Single(Box::new(page)))
    });
    let (_cache, conn) = connect(&builder);
    let mut cursor = conn.query("SELECT \"Name\" FROM t").unwrap();

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("name").unwrap().as_deref(), Some("ada"));
    assert_eq!(cursor.get_string("\"Name\"").unwrap().as_deref(), Some("ada"));
    assert!(matches!(
        cursor.get_string("\"name\""),
        Err(ClientError::NoSuchColumn(_))
    ));
    assert!(matches!(
        cursor.get_string(2),
        Err(ClientError::ColumnIndexOutOfRange { index: 2, count: 1 })
    ));
}
