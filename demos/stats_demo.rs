use clap::Parser;
use robin_hash::DefaultKeyHasher;
use robin_hash::RobinMap;
use robin_hash::StableMap;
use robin_hash::TableConfig;
use robin_hash::slot::ValueSlot;

#[derive(Parser, Debug)]
struct Args {
    /// Number of keys to insert.
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: u64,

    /// Load factor at which the table grows.
    #[arg(short = 'l', long = "load_factor", default_value_t = robin_hash::DEFAULT_LOAD_FACTOR)]
    load_factor: f32,

    /// Seed mixed into every hash.
    #[arg(short = 's', long = "seed", default_value_t = robin_hash::DEFAULT_SEED)]
    seed: u32,

    /// Remove every `remove_every`-th key after filling, 0 to keep all.
    #[arg(short = 'r', long = "remove_every", default_value_t = 0)]
    remove_every: u64,

    /// Store values in stable cells instead of inline.
    #[arg(long = "stable")]
    stable: bool,
}

fn main() {
    let args = Args::parse();
    let config = TableConfig::new()
        .with_load_factor(args.load_factor)
        .with_seed(args.seed);

    println!(
        "Inserting {} keys (load factor {:.2}, seed {:#010X}, {} values)",
        args.count,
        config.load_factor(),
        config.seed(),
        if args.stable { "stable" } else { "inline" }
    );

    if args.stable {
        run(&args, StableMap::with_hasher_and_config(Default::default(), config));
    } else {
        run(&args, RobinMap::<u64, u64>::with_hasher_and_config(Default::default(), config));
    }
}

fn run<P: ValueSlot<u64>>(args: &Args, mut map: RobinMap<u64, u64, DefaultKeyHasher, P>) {
    for key in 0..args.count {
        if map.insert(key, key).is_some() {
            panic!("key inserted twice: {}", key);
        }
    }

    if args.remove_every != 0 {
        let removed = (0..args.count)
            .step_by(args.remove_every as usize)
            .filter(|key| map.remove(key).is_some())
            .count();
        println!("Removed {} keys", removed);
    }

    let (len, capacity) = (map.len(), map.capacity());
    println!("Map holds {} keys in {} slots", len, capacity);
    if capacity != 0 {
        println!(
            "Final load factor: {:.2}%",
            (len as f64 / capacity as f64) * 100.0
        );
    }

    map.probe_histogram().print();
    map.debug_stats().print();
}
