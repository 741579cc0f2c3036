use chain_hash::Config;
use chain_hash::HashCache;
use chain_hash::HashTable;
use chain_hash::hash::DefaultKeyHasher;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'b', long = "buckets", default_value_t = 8)]
    buckets: usize,

    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: usize,

    #[arg(long = "block_size", default_value_t = 64)]
    block_size: usize,

    /// Keep the initial bucket count instead of growing and shrinking.
    #[arg(long = "fixed")]
    fixed: bool,

    /// Number of random evictions to run after filling.
    #[arg(short = 'e', long = "evict", default_value_t = 0)]
    evict: usize,

    /// Maximum number of arena layout lines to print.
    #[arg(long = "arena_lines", default_value_t = 16)]
    arena_lines: usize,
}

fn main() {
    let args = Args::parse();

    let config = Config {
        buckets: args.buckets,
        block_size: args.block_size,
        resizable: !args.fixed,
    };
    let table: HashTable<u64> = match HashTable::with_config(config, DefaultKeyHasher) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    println!(
        "Creating table with {} buckets (resizable: {})",
        table.bucket_count(),
        table.is_resizable()
    );

    let mut cache = HashCache::from_parts(table, SmallRng::from_os_rng());
    for i in 0..args.count as u64 {
        cache.set(format!("_INBOX.{:022X}", i).as_bytes(), i);
    }
    println!("Inserted {} keys", cache.len());

    let mut evicted = 0;
    for _ in 0..args.evict {
        if cache.evict_random().is_none() {
            break;
        }
        evicted += 1;
    }
    if args.evict > 0 {
        println!("Evicted {} keys, {} remain", evicted, cache.len());
    }

    let stats = cache.stats();
    println!("elements       : {}", stats.elements);
    println!("buckets        : {}", stats.buckets);
    println!("occupied slots : {}", stats.occupied_slots);
    println!("longest chain  : {}", stats.longest_chain);
    println!("mean chain     : {:.2}", stats.mean_chain);
    println!(
        "load factor    : {:.2}%",
        stats.elements as f64 / stats.buckets as f64 * 100.0
    );

    println!("chain length histogram:");
    for (length, buckets) in cache.chain_histogram().iter().enumerate() {
        if *buckets > 0 {
            println!("  {:3}: {}", length, buckets);
        }
    }

    let arena = cache.arena();
    println!(
        "arena: {} blocks of {}, {} live",
        arena.block_count(),
        arena.block_size(),
        arena.len()
    );
    for line in arena.stats().take(args.arena_lines) {
        println!("  {}", line);
    }
}
