use hdrhistogram::Histogram;
use itch_lob::{decode, Engine, Side, WireMessage, MESSAGE_LEN};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    println!("Preparing Latency Benchmark...");

    const ITERATIONS: u64 = 1_000_000;

    // Pre-encode the wire stream so only decode + match is timed
    let records: Vec<[u8; MESSAGE_LEN]> = (1..=ITERATIONS)
        .map(|order_id| {
            let side = if order_id % 2 == 0 { Side::Bid } else { Side::Ask };
            let price = 1_000_000 + (order_id % 100) as u32 * 100;
            WireMessage::add_order(order_id, side, 10, "AAPL", price).encode()
        })
        .collect();

    let mut engine = Engine::new();
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3)?;

    println!("Running {} iterations...", ITERATIONS);

    let mut total_duration = std::time::Duration::new(0, 0);

    for record in &records {
        // Critical measurement section
        let start = Instant::now();

        let msg = decode(record);
        // Use black_box to prevent compiler optimization
        std::hint::black_box(engine.process(&msg));

        let elapsed = start.elapsed();

        // Outliers above the histogram bound are skipped rather than panicking
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", ITERATIONS);
    println!("Throughput: {:.2} ops/sec", ITERATIONS as f64 / total_duration.as_secs_f64());
    println!("Resting:    {} orders", engine.order_count());
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    println!("\nDistribution:");
    for v in histogram.iter_log(100, 2.0) {
        let count = v.count_since_last_iteration();
        if count > 0 {
            println!("<= {:6} ns: {:10} count", v.value_iterated_to(), count);
        }
    }

    Ok(())
}
