//! Voxshape workload driver
//!
//! Builds a palette of random block shapes, scatters them through a small
//! world and times shape combination, face culling, movement resolution and
//! ray casts, the latter two in parallel.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -p voxshape-benchmark -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--seed <N>`: Seed for shape and query generation (default: 42)
//! - `--shapes <N>`: Number of shapes placed in the world (default: 512)
//! - `--queries <N>`: Number of movement and ray queries (default: 10000)
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod config;

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Context;
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use voxshape_core::{Aabb, BlockPos, Direction};
use voxshape_physics::{collide_movement, raycast, PlacedShape};
use voxshape_shape::{block_occludes, cuboid, or_all, Shape};

use crate::config::BenchConfig;

/// Distinct block shapes generated per run.
const PALETTE_SIZE: usize = 32;

/// Edge length of the cubic world region shapes are placed in.
const WORLD_SIZE: i32 = 16;

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BenchConfig::from_args();
    info!(?config, "Voxshape workload");
    let mut rng = StdRng::seed_from_u64(config.seed);

    let start = Instant::now();
    let palette = (0..PALETTE_SIZE)
        .map(|_| random_block_shape(&mut rng))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let boxes: usize = palette.iter().map(|s| s.to_aabbs().len()).sum();
    info!(
        shapes = palette.len(),
        boxes,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Built shape palette"
    );

    let world = scatter(&mut rng, &palette, config.shapes);
    let start = Instant::now();
    let (faces, culled) = cull_faces(&world);
    info!(
        placed = world.len(),
        faces,
        culled,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Face culling"
    );

    let world_shapes: Vec<Shape> = world.values().map(PlacedShape::world_shape).collect();
    let placed: Vec<PlacedShape> = world.into_values().collect();

    let movers: Vec<(Aabb, DVec3)> = (0..config.queries)
        .map(|_| (random_mover(&mut rng), random_vector(&mut rng, 4.0)))
        .collect();
    let start = Instant::now();
    let blocked = movers
        .par_iter()
        .filter(|(aabb, movement)| collide_movement(*movement, aabb, &world_shapes) != *movement)
        .count();
    info!(
        queries = movers.len(),
        blocked,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Movement resolution"
    );

    let rays: Vec<(DVec3, DVec3)> = (0..config.queries)
        .map(|_| {
            let from = random_point(&mut rng);
            (from, from + random_vector(&mut rng, 8.0))
        })
        .collect();
    let start = Instant::now();
    let hits: Vec<f64> = rays
        .par_iter()
        .filter_map(|&(from, to)| raycast(from, to, &placed))
        .map(|hit| hit.distance)
        .collect();
    let mean = if hits.is_empty() {
        0.0
    } else {
        hits.iter().sum::<f64>() / hits.len() as f64
    };
    info!(
        rays = rays.len(),
        hits = hits.len(),
        mean_distance = mean,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Ray casts"
    );

    Ok(())
}

/// Union of one to four boxes snapped to sixteenths of a cell.
fn random_block_shape(rng: &mut StdRng) -> anyhow::Result<Shape> {
    let count = rng.gen_range(1..=4);
    let parts = (0..count)
        .map(|_| {
            let mut corner = || {
                let a = rng.gen_range(0..16);
                let b = rng.gen_range(a + 1..=16);
                (f64::from(a) / 16.0, f64::from(b) / 16.0)
            };
            let (x0, x1) = corner();
            let (y0, y1) = corner();
            let (z0, z1) = corner();
            cuboid(x0, y0, z0, x1, y1, z1).context("generating block part")
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let (first, rest) = parts.split_first().context("block needs at least one part")?;
    Ok(or_all(first, rest))
}

fn scatter(rng: &mut StdRng, palette: &[Shape], count: usize) -> HashMap<BlockPos, PlacedShape> {
    let mut world = HashMap::with_capacity(count);
    for _ in 0..count {
        let pos = BlockPos::new(
            rng.gen_range(0..WORLD_SIZE),
            rng.gen_range(0..WORLD_SIZE),
            rng.gen_range(0..WORLD_SIZE),
        );
        let shape = palette[rng.gen_range(0..palette.len())].clone();
        world.insert(pos, PlacedShape::new(pos, shape));
    }
    debug!(requested = count, placed = world.len(), "Scattered shapes");
    world
}

/// Count faces adjacent to another shape and how many of them are hidden.
fn cull_faces(world: &HashMap<BlockPos, PlacedShape>) -> (usize, usize) {
    let mut faces = 0;
    let mut culled = 0;
    for (pos, placed) in world {
        for direction in Direction::ALL {
            let Some(neighbor) = world.get(&pos.relative(direction)) else {
                continue;
            };
            faces += 1;
            if block_occludes(&placed.shape, &neighbor.shape, direction) {
                culled += 1;
            }
        }
    }
    (faces, culled)
}

fn random_point(rng: &mut StdRng) -> DVec3 {
    let size = f64::from(WORLD_SIZE);
    DVec3::new(
        rng.gen_range(0.0..size),
        rng.gen_range(0.0..size),
        rng.gen_range(0.0..size),
    )
}

fn random_vector(rng: &mut StdRng, length: f64) -> DVec3 {
    DVec3::new(
        rng.gen_range(-length..length),
        rng.gen_range(-length..length),
        rng.gen_range(-length..length),
    )
}

/// A player-sized box somewhere in the world.
fn random_mover(rng: &mut StdRng) -> Aabb {
    let feet = random_point(rng);
    Aabb::new(
        feet - DVec3::new(0.3, 0.0, 0.3),
        feet + DVec3::new(0.3, 1.8, 0.3),
    )
}

fn print_help() {
    eprintln!(
        "Voxshape workload driver

USAGE:
    cargo run --release -p voxshape-benchmark -- [OPTIONS]

OPTIONS:
    --seed <N>      Seed for shape and query generation (default: 42)
    --shapes <N>    Number of shapes placed in the world (default: 512)
    --queries <N>   Number of movement and ray queries (default: 10000)
    -h, --help      Print this help message

ENVIRONMENT:
    RUST_LOG        Log filter (e.g. info, debug, voxshape_shape=trace)"
    );
}
