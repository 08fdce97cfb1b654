use std::hash::BuildHasher;

use alloc_hash::HashTable;
use clap::Parser;
use foldhash::fast::FixedState;

/// Fills a table, churns part of it, and prints probe statistics after each
/// phase.
#[derive(Parser, Debug)]
struct Args {
    /// Number of elements the table is sized for.
    #[arg(short = 'n', long, default_value_t = 1000)]
    elements: usize,

    /// Percentage of entries removed and re-added with fresh keys.
    #[arg(short = 'r', long, default_value_t = 25)]
    churn_percent: u8,

    /// Seed for the fixed hash state.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

fn report(phase: &str, table: &HashTable<u64, u64>) {
    println!("--- {phase}: {} of {} buckets in use ---", table.len(), table.max_count());
    table.probe_histogram().print();
    table.debug_stats().print();
    println!();
}

fn main() {
    let args = Args::parse();
    let state = FixedState::with_seed(args.seed);
    let hash = |key: u64| state.hash_one(key);

    let mut table = HashTable::with_capacity(args.elements);
    let filled = table.max_count() as u64;
    for key in 0..filled {
        table.entry(hash(key), |&k| k == key).or_insert(key, key * 2);
    }
    report("filled", &table);

    let churn = filled * u64::from(args.churn_percent.min(100)) / 100;
    for key in 0..churn {
        if table.remove(hash(key), |&k| k == key).is_none() {
            eprintln!("key {key} went missing");
            return;
        }
    }
    report("after removal", &table);

    for key in filled..filled + churn {
        table.entry(hash(key), |&k| k == key).or_insert(key, key * 2);
    }
    report("after re-adding", &table);
}
