//! End-to-end demo: matching engine, A/B feeds, and arbitrage detection.
//!
//! Random-walks quotes for five symbols into both feeds for a few seconds,
//! with an occasional volatility burst, then reports feed, detector, and
//! engine statistics.
//!
//! Run with `cargo run --example feed_demo`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use duplex_arb::FeedHandler;
use duplex_core::types::{Price, Quantity};
use duplex_engine::MatchingEngine;

const SYMBOLS: u64 = 5;
const RUN_FOR: Duration = Duration::from_secs(10);
const TICK_INTERVAL: Duration = Duration::from_millis(10);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== duplex A/B feed demo ===");
    println!("Demonstrating A/B feed arbitrage detection and jitter impact\n");

    let engine = Arc::new(MatchingEngine::new());
    for symbol_id in 1..=SYMBOLS {
        engine.register_symbol(symbol_id);
    }
    engine.start().expect("engine start");

    let handler = FeedHandler::new(Arc::clone(&engine));
    handler.start();

    let mut rng = StdRng::from_entropy();
    // starting mids for the five symbols, in 6-decimal fixed point
    let mut mids: Vec<i64> = vec![
        100_000_000, // $100
        50_000_000,  // $50
        150_000_000, // $150
        80_000_000,  // $80
        120_000_000, // $120
    ];

    let started = Instant::now();
    let mut tick = 0u64;
    let mut volatile_until: Option<Instant> = None;

    while started.elapsed() < RUN_FOR {
        tick += 1;

        match volatile_until {
            Some(until) if Instant::now() >= until => {
                handler.set_volatile_market(false);
                volatile_until = None;
            }
            None if tick % 100 == 0 && rng.gen::<f64>() < 0.3 => {
                handler.set_volatile_market(true);
                volatile_until = Some(Instant::now() + Duration::from_secs(2));
            }
            _ => {}
        }

        for (i, mid) in mids.iter_mut().enumerate() {
            // random walk, floored to stay positive
            *mid = (*mid + rng.gen_range(-500_000..=500_000)).max(1_000_000);
            let spread: i64 = if i == 0 { 10_000 } else { 20_000 + i as i64 * 10_000 };

            let bid = Price::from_raw(*mid - spread / 2);
            let ask = Price::from_raw(*mid + spread / 2);
            let bid_size = Quantity::new(rng.gen_range(100..=1_000));
            let ask_size = Quantity::new(rng.gen_range(100..=1_000));

            handler.publish_quote(i as u64 + 1, bid, ask, bid_size, ask_size);
        }

        if tick % 5 == 0 {
            let symbol = rng.gen_range(0..SYMBOLS as usize);
            let is_buy = rng.gen_bool(0.5);
            let price = Price::from_raw(if is_buy {
                mids[symbol] + 10_000
            } else {
                mids[symbol] - 10_000
            });
            let quantity = Quantity::new(rng.gen_range(10..=100));
            handler.publish_trade(symbol as u64 + 1, price, quantity, is_buy);
        }

        std::thread::sleep(TICK_INTERVAL);
    }

    handler.stop();
    engine.stop();

    let (stats_a, stats_b) = handler.feed_stats();
    println!("\n=== Feed Statistics ===");
    println!(
        "Feed A: {} messages ({} dropped), avg latency {:.2} us, {} jitter events",
        stats_a.messages_received,
        stats_a.messages_dropped,
        stats_a.average_latency_us(),
        stats_a.jitter_events,
    );
    println!(
        "Feed B: {} messages ({} dropped), avg latency {:.2} us, {} jitter events",
        stats_b.messages_received,
        stats_b.messages_dropped,
        stats_b.average_latency_us(),
        stats_b.jitter_events,
    );

    let arb = handler.arbitrage_stats();
    println!("\n=== Arbitrage Detection ===");
    println!("Opportunities detected:   {}", arb.opportunities_detected);
    println!("Profitable opportunities: {}", arb.profitable_opportunities);
    println!("Missed opportunities:     {}", arb.missed_opportunities);
    println!("Average profit:           {:.2} bps", arb.average_profit_bps());
    println!(
        "Average latency diff:     {:.2} us",
        arb.average_latency_diff_us()
    );
    println!(
        "Max latency diff:         {:.2} us",
        arb.latency_diff_max_ns as f64 / 1_000.0
    );

    let engine_stats = handler.engine_stats();
    println!("\n=== Matching Engine ===");
    println!("Orders processed: {}", engine_stats.total_orders);
    println!("Trades executed:  {}", engine_stats.total_trades);
    println!("Volume traded:    {}", engine_stats.total_volume);

    for opportunity in handler.recent_arbitrage(3) {
        println!(
            "recent opportunity: symbol {} profit {:.2} bps (fast feed {})",
            opportunity.symbol_id,
            opportunity.profit_basis_points(),
            opportunity.fast_feed,
        );
    }
}
