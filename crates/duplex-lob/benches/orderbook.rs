//! Benchmarks for order book operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use duplex_core::types::{Order, OrderId, Price, Quantity, Side};
use duplex_lob::OrderBook;

fn limit(id: u64, side: Side, price: i64, qty: u32) -> Order {
    Order::new_limit(
        OrderId::new(id),
        1,
        side,
        Price::from_raw(price),
        Quantity::new(qty),
    )
}

fn populated_book(levels: i64, orders_per_level: u64) -> OrderBook {
    let mut book = OrderBook::new(1);
    let mut id = 1;
    for level in 0..levels {
        for _ in 0..orders_per_level {
            book.add_order(limit(id, Side::Buy, 10_000 - level * 10, 100));
            id += 1;
            book.add_order(limit(id, Side::Sell, 10_010 + level * 10, 100));
            id += 1;
        }
    }
    book
}

fn bench_orderbook(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook");

    group.bench_function("add_resting_order", |b| {
        let mut book = populated_book(10, 5);
        let mut id = 1_000_000;
        b.iter(|| {
            id += 1;
            // rests far from the touch, then cancels to keep the book stable
            book.add_order(black_box(limit(id, Side::Buy, 5_000, 10)));
            book.cancel_order(OrderId::new(id));
        });
    });

    group.bench_function("add_matching_order", |b| {
        let mut book = populated_book(10, 5);
        let mut id = 1_000_000;
        b.iter(|| {
            id += 1;
            // refill the touch then hit it
            book.add_order(limit(id, Side::Sell, 10_010, 10));
            id += 1;
            let trades = book.add_order(black_box(limit(id, Side::Buy, 10_010, 10)));
            black_box(trades);
        });
    });

    group.bench_function("cancel_order", |b| {
        let mut book = populated_book(10, 5);
        let mut id = 1_000_000;
        b.iter(|| {
            id += 1;
            book.add_order(limit(id, Side::Buy, 9_000, 10));
            black_box(book.cancel_order(OrderId::new(id)));
        });
    });

    group.bench_function("best_bid_ask", |b| {
        let book = populated_book(10, 5);
        b.iter(|| {
            black_box(book.best_bid());
            black_box(book.best_ask());
        });
    });

    group.bench_function("snapshot", |b| {
        let book = populated_book(10, 5);
        b.iter(|| {
            black_box(book.snapshot());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_orderbook);
criterion_main!(benches);
