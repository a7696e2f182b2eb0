use std::collections::{BTreeSet, VecDeque};

use anyhow::{Result, ensure};
use chunkgen::procgen::{ChunkGrid, ChunkKind, GenRng, GeneratedRegion, GridPos, RegionGenerator};
use chunkgen::test_support::{CHUNK_SIZE, scenario_library};
use chunkgen::{ChunkLibrary, Rect, RulesConfig};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    runs: u32,
}

fn reachable(grid: &ChunkGrid, from: GridPos) -> BTreeSet<GridPos> {
    let mut seen = BTreeSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(pos) = queue.pop_front() {
        let Some(chunk) = grid.get(pos) else { continue };
        for next in chunk.links.iter().flatten() {
            if seen.insert(*next) {
                queue.push_back(*next);
            }
        }
    }
    seen
}

fn check_region(region: &GeneratedRegion, rules: &RulesConfig) -> Result<()> {
    let grid = &region.grid;
    let stats = &region.stats;

    ensure!(region.map.width == grid.cols() * CHUNK_SIZE, "composite width mismatch");
    ensure!(region.map.height == grid.rows() * CHUNK_SIZE, "composite height mismatch");
    if grid.is_empty() {
        return Ok(());
    }

    ensure!(grid.count(ChunkKind::Start) == 1, "expected exactly one start cell");
    let start = grid.find(ChunkKind::Start).unwrap_or(GridPos::new(0, 0));
    if stats.main_length > 1 {
        ensure!(grid.count(ChunkKind::End) == 1, "expected exactly one end cell");
        let end = grid.find(ChunkKind::End).unwrap_or(start);
        ensure!(reachable(grid, start).contains(&end), "end is not linked to start");
    }

    ensure!(stats.doors <= rules.doors_max, "{} doors exceed doors_max", stats.doors);
    ensure!(stats.keys <= stats.doors, "{} keys for {} doors", stats.keys, stats.doors);

    for (pos, chunk) in grid.iter() {
        if chunk.kind.is_door() {
            ensure!(chunk.is_straight_for(chunk.kind), "door at {pos:?} is not straight");
            continue;
        }
        for direction in chunk.linked_directions() {
            let Some(neighbor) = chunk.links[direction.index()].and_then(|next| grid.get(next))
            else {
                continue;
            };
            ensure!(neighbor.has_link(direction.opposite()), "one-sided link at {pos:?}");
            if !neighbor.kind.is_door() {
                ensure!(
                    neighbor.door_level == chunk.door_level,
                    "link at {pos:?} crosses door levels without a door"
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    println!("Starting procgen fuzz harness on seed {} for {} runs...", args.seed, args.runs);

    let (library, base_rules): (ChunkLibrary, RulesConfig) = scenario_library();
    let mut seeds = ChaCha8Rng::seed_from_u64(args.seed);

    for run in 0..args.runs {
        let run_seed = seeds.next_u64();
        let rules = RulesConfig {
            doors_max: (seeds.next_u64() % 4) as u32,
            door_spacing_min: (seeds.next_u64() % 4) as u32,
            ..base_rules.clone()
        };
        let width = ((seeds.next_u64() % 6) as i32 + 1) * CHUNK_SIZE as i32;
        let height = ((seeds.next_u64() % 6) as i32 + 1) * CHUNK_SIZE as i32;

        let region = RegionGenerator::new(&library, &rules)
            .generate(Rect::new(0, 0, width, height), &mut GenRng::from_seed(run_seed));
        debug!(run, run_seed, width, height, doors = region.stats.doors, "fuzz run");

        if let Err(err) = check_region(&region, &rules) {
            println!("Invariant violated on run {run} (seed {run_seed}, {width}x{height}): {err}");
            return Err(err);
        }
    }

    info!(runs = args.runs, "fuzz harness finished");
    println!("All {} runs upheld the generation invariants.", args.runs);
    Ok(())
}
