use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chunkgen::map_file::{MapSource, read_map, write_map_atomic};
use chunkgen::procgen::{ChunkKind, ChunkLibrary, GenRng, RegionGenerator};
use chunkgen::{DirMapSource, Map, Rect, RulesConfig, map_fingerprint};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a composite map from a rules file and a chunk directory
    Generate {
        /// Rules file, relative to the chunk directory
        #[arg(short, long)]
        rules: String,
        /// Directory chunk filenames are resolved against
        #[arg(short, long)]
        chunks: PathBuf,
        /// Region width in tiles
        #[arg(long)]
        width: i32,
        /// Region height in tiles
        #[arg(long)]
        height: i32,
        /// Fixed seed; a runtime seed is used when omitted
        #[arg(short, long)]
        seed: Option<u64>,
        /// Where to write the composite map
        #[arg(short, long)]
        out: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a summary of an existing map file
    Inspect {
        map: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<()> {
    init_logging();
    match Args::parse().command {
        Command::Generate { rules, chunks, width, height, seed, out, json } => {
            generate(&rules, chunks, Rect::new(0, 0, width, height), seed, &out, json)
        }
        Command::Inspect { map } => inspect(&map),
    }
}

fn generate(
    rules_name: &str,
    chunks: PathBuf,
    area: Rect,
    seed: Option<u64>,
    out: &Path,
    json: bool,
) -> Result<()> {
    let source = DirMapSource::new(chunks);
    let rules: RulesConfig = source
        .load_rules(rules_name)
        .with_context(|| format!("Failed to load rules: {rules_name}"))?;

    let library = ChunkLibrary::load(&source, &rules);
    if library.is_empty() {
        bail!("No chunk maps could be loaded from {}", source.root().display());
    }

    let mut rng = seed.map_or_else(GenRng::from_runtime_entropy, GenRng::from_seed);
    let mut region = RegionGenerator::new(&library, &rules).generate(area, &mut rng);
    region.map.ensure_collision_layer();

    write_map_atomic(out, &region.map)
        .with_context(|| format!("Failed to write composite map: {}", out.display()))?;
    let fingerprint = map_fingerprint(&region.map).context("Failed to serialize composite map")?;
    info!(out = %out.display(), "wrote composite map");

    let stats = region.stats;
    if json {
        let summary = serde_json::json!({
            "rows": stats.rows,
            "cols": stats.cols,
            "width": region.map.width,
            "height": region.map.height,
            "main_length": stats.main_length,
            "main_attempts": stats.main_attempts,
            "main_path_accepted": stats.main_path_accepted,
            "doors": stats.doors,
            "keys": stats.keys,
            "branches": stats.branches,
            "fingerprint": format!("{fingerprint:016x}"),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Generation complete.");
    println!("Grid: {} x {} chunks", stats.rows, stats.cols);
    println!("Map: {} x {} tiles", region.map.width, region.map.height);
    println!(
        "Main path: {} cells after {} attempt(s){}",
        stats.main_length,
        stats.main_attempts,
        if stats.main_path_accepted { "" } else { " (outside requested bounds)" }
    );
    println!("Doors: {}  Keys: {}  Branches: {}", stats.doors, stats.keys, stats.branches);
    for kind in [ChunkKind::Start, ChunkKind::End, ChunkKind::Normal, ChunkKind::Key] {
        println!("  {kind:?} cells: {}", region.grid.count(kind));
    }
    println!("Fingerprint: {fingerprint:016x}");
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let map: Map =
        read_map(path).with_context(|| format!("Failed to read map: {}", path.display()))?;
    let fingerprint = map_fingerprint(&map).context("Failed to serialize map")?;

    println!("Map: {} ({} x {} tiles)", map.title, map.width, map.height);
    println!("Layers: {}", map.layer_names().join(", "));
    println!(
        "Events: {}  Enemy groups: {}  NPCs: {}",
        map.events.len(),
        map.enemy_groups.len(),
        map.npcs.len()
    );
    if let Some(hero_pos) = map.hero_pos {
        println!("Hero spawn: ({}, {})", hero_pos.x, hero_pos.y);
    }
    if let Some(trigger) = map.procgen_trigger() {
        println!(
            "Procgen region: rules {} area {}x{} at ({}, {})",
            trigger.rules_file, trigger.area.w, trigger.area.h, trigger.area.x, trigger.area.y
        );
    }
    println!("Fingerprint: {fingerprint:016x}");
    Ok(())
}
