//! Codec and cursor benchmarks.

use std::sync::Arc;

use bytes::Bytes;
use colbridge_client::codec::{decode_value, encode_value};
use colbridge_client::cursor::{ColumnDefinitions, ColumnSpec, QueryOutput, ResultPage, RowSource};
use colbridge_client::{ColumnType, Decimal, RowCursor, Value};
use colbridge_common::CursorOptions;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn decode_int_benchmark(c: &mut Criterion) {
    let bytes = 123_456_i32.to_be_bytes();
    c.bench_function("decode_int_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(decode_value(&ColumnType::Int, Some(black_box(&bytes))).ok());
            }
        })
    });
}

fn decode_list_benchmark(c: &mut Criterion) {
    let ty = ColumnType::list(ColumnType::BigInt);
    let list = Value::List((0..256).map(Value::BigInt).collect());
    let encoded = encode_value(&ty, &list).unwrap().unwrap();

    c.bench_function("decode_list_256", |b| {
        b.iter(|| black_box(decode_value(&ty, Some(black_box(&encoded[..]))).ok()))
    });
}

fn decode_decimal_benchmark(c: &mut Criterion) {
    let value = Value::Decimal("-12345678901234567890.123456".parse::<Decimal>().unwrap());
    let encoded = encode_value(&ColumnType::Decimal, &value).unwrap().unwrap();

    c.bench_function("decode_decimal", |b| {
        b.iter(|| black_box(decode_value(&ColumnType::Decimal, Some(black_box(&encoded[..]))).ok()))
    });
}

fn pages(sources: usize, rows: usize) -> QueryOutput {
    let columns = Arc::new(ColumnDefinitions::new(vec![
        ColumnSpec::new("bench", "t", "id", ColumnType::Int),
        ColumnSpec::new("bench", "t", "name", ColumnType::Text),
    ]));
    let name = Bytes::from_static(b"row");
    let sources = (0..sources)
        .map(|_| {
            let rows = (0..rows as i32)
                .map(|i| {
                    vec![
                        Some(Bytes::copy_from_slice(&i.to_be_bytes())),
                        Some(name.clone()),
                    ]
                })
                .collect();
            Box::new(ResultPage::new(Arc::clone(&columns), rows)) as Box<dyn RowSource>
        })
        .collect();
    QueryOutput::Multi(sources)
}

fn cursor_iterate_benchmark(c: &mut Criterion) {
    c.bench_function("cursor_iterate_100x100", |b| {
        b.iter(|| {
            let mut cursor = RowCursor::new(pages(100, 100), CursorOptions::default());
            let mut sum = 0_i64;
            while cursor.next().unwrap_or(false) {
                sum += i64::from(cursor.get_int(1).unwrap_or(0));
                black_box(cursor.get_string("name").ok());
            }
            black_box(sum)
        })
    });
}

criterion_group!(
    benches,
    decode_int_benchmark,
    decode_list_benchmark,
    decode_decimal_benchmark,
    cursor_iterate_benchmark,
);
criterion_main!(benches);
