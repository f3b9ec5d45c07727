//! Benchmarks for frame decoding and price cache operations

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pro_price_stream::prices::{PriceCache, PriceSnapshot};
use pro_price_stream::{ServerMessage, SubscriptionSet};
use rust_decimal::Decimal;
use std::str::FromStr;

const SYMBOLS: [&str; 8] = ["BTC", "ETH", "SOL", "XRP", "ADA", "DOGE", "DOT", "AVAX"];

fn create_frame(records: usize) -> String {
    let data: Vec<serde_json::Value> = (0..records)
        .map(|i| {
            serde_json::json!({
                "symbol": SYMBOLS[i % SYMBOLS.len()],
                "price": 50000.0 + i as f64,
                "change_24h": -1.25,
                "volume_24h": 1250000,
                "market_cap": 980000000000u64,
                "timestamp": 1672531200000i64
            })
        })
        .collect();

    serde_json::json!({ "type": "price_update", "data": data }).to_string()
}

fn create_snapshot(symbol: &str, price: i64) -> PriceSnapshot {
    PriceSnapshot {
        symbol: symbol.to_string(),
        price: Decimal::from(price),
        change_24h: Decimal::from_str("2.5").unwrap(),
        volume_24h: Decimal::from(1000),
        market_cap: None,
        observed_at: Utc::now(),
    }
}

fn benchmark_parse_frame(c: &mut Criterion) {
    let frame = create_frame(8);

    c.bench_function("parse_price_update_8_records", |b| {
        b.iter(|| {
            black_box(ServerMessage::parse(black_box(&frame)).unwrap());
        })
    });

    c.bench_function("parse_connection_frame", |b| {
        b.iter(|| {
            black_box(ServerMessage::parse(black_box(r#"{"type":"connection","message":"ok"}"#)).unwrap());
        })
    });
}

fn benchmark_apply_update(c: &mut Criterion) {
    let mut cache = PriceCache::new();
    let snapshot = create_snapshot("btc", 50000);

    c.bench_function("apply_update", |b| {
        b.iter(|| {
            cache.apply_update(black_box(snapshot.clone()));
        })
    });
}

fn benchmark_cache_reads(c: &mut Criterion) {
    let mut cache = PriceCache::new();
    for (i, symbol) in SYMBOLS.iter().enumerate() {
        cache.apply_update(create_snapshot(symbol, 1000 + i as i64));
    }

    c.bench_function("get_single", |b| {
        b.iter(|| {
            black_box(cache.get(black_box("eth")));
        })
    });

    c.bench_function("get_all_8_symbols", |b| {
        b.iter(|| {
            black_box(cache.get_all());
        })
    });
}

fn benchmark_subscribe_message(c: &mut Criterion) {
    let set = SubscriptionSet::new(SYMBOLS);

    c.bench_function("encode_subscribe_8_symbols", |b| {
        b.iter(|| {
            black_box(set.subscribe_message().map(|m| m.encode()));
        })
    });
}

criterion_group!(
    benches,
    benchmark_parse_frame,
    benchmark_apply_update,
    benchmark_cache_reads,
    benchmark_subscribe_message
);
criterion_main!(benches);
