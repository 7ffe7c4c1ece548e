// Tiernet Simulation Runner — reference three-tier topology, seedable traffic
//
// Usage:
//   cargo run --bin sim                      # 30 packets, seed 0
//   cargo run --bin sim -- --packets 100     # more traffic
//   cargo run --bin sim -- --seed 42         # custom PRNG seed
//   cargo run --bin sim -- --json            # machine-readable report
//
// Set RUST_LOG=info to see the per-hop decision log.

mod report;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use report::SimReport;
use tiernet_engine::{MeshSimulation, NodeAddr, Tier, TopologyConfig};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    packets: u32,
    seed: u64,
    json: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        packets: 30,
        seed: 0,
        json: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--packets" => {
                i += 1;
                if i < args.len() {
                    cli.packets = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--json" => {
                cli.json = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = parse_args();
    let config = TopologyConfig::reference();
    let gateway = config.gateway;

    let mut sim = match MeshSimulation::new(&config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("topology setup failed: {err}");
            std::process::exit(1);
        }
    };

    // Traffic sources are the outermost sensors, picked uniformly per packet.
    let origins: Vec<NodeAddr> = config
        .nodes
        .iter()
        .filter(|spec| spec.tier == Tier::Three.as_u16())
        .map(|spec| spec.addr)
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let mut traces = Vec::with_capacity(cli.packets as usize);
    for _ in 0..cli.packets {
        let origin = *origins
            .choose(&mut rng)
            .expect("reference topology has tier-3 nodes");
        traces.push(sim.send_packet(origin, gateway));
    }

    let report = SimReport::new(sim.stats(), sim.snapshot(), traces);
    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("report serialization failed: {err}");
                std::process::exit(1);
            }
        }
    } else {
        println!("\n  Tiernet Simulation Runner");
        println!(
            "  PRNG: ChaCha8Rng | Packets: {} | Seed: {}",
            cli.packets, cli.seed
        );
        report.print_summary();
    }
}
