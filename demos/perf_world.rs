use glam::Vec2;
use skirmish_grid::*;
use std::time::Instant;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() {
    let mut world = CollisionWorld::new(WorldConfig {
        cell_size: 64.0,
        enable_timing: true,
        ..Default::default()
    });

    let n = 5_000usize; // number of units
    let mut seed = 1u32;
    for i in 0..n {
        let pos = Vec2::new(unit(&mut seed) * 4096.0, unit(&mut seed) * 4096.0);
        if i % 10 == 0 {
            world.add_box_collider(pos, 96.0, 96.0, 0.0, ColliderOptions::default().layer(Layer::BUILDING).fixed());
        } else {
            world.add_circle_collider(pos, 8.0 + unit(&mut seed) * 8.0, ColliderOptions::default());
        }
    }

    let ids: Vec<ColliderId> = world.colliders().filter(|c| !c.is_static()).map(|c| c.id()).collect();
    for frame in 0..5 {
        for &id in &ids {
            if let Some(c) = world.get(id) {
                let step = Vec2::new(unit(&mut seed) * 8.0 - 4.0, unit(&mut seed) * 8.0 - 4.0);
                let next = c.position() + step;
                world.update_position(id, next);
            }
        }
        let t0 = Instant::now();
        let results = world.update();
        let elapsed = t0.elapsed();
        let n_events = world.drain_events().len();
        let s = world.debug_stats();
        if let Some(t) = world.timing() {
            println!(
                "frame={} N={} cell_size={} update={:.3}ms (pairs={:.3}ms exits={:.3}ms) tested={} collisions={} events={}",
                frame,
                n,
                world.cfg.cell_size,
                t.update_ms,
                t.pairs_ms,
                t.trigger_exit_ms,
                s.tested_pairs,
                results.len(),
                n_events
            );
        } else {
            println!("frame={} N={} update={:?} collisions={}", frame, n, elapsed, results.len());
        }
    }

    let mut pf = Pathfinder::new(PathfinderConfig::default());
    let t0 = Instant::now();
    let mut found = 0;
    for _ in 0..100 {
        let start = Vec2::new(unit(&mut seed) * 4096.0, unit(&mut seed) * 4096.0);
        let goal = Vec2::new(unit(&mut seed) * 4096.0, unit(&mut seed) * 4096.0);
        if pf.find_path(&world, start, goal, None).found {
            found += 1;
        }
    }
    let (hits, misses) = pf.cache().hit_stats();
    println!(
        "paths: 100 queries in {:?}, found={} cache hits={} misses={}",
        t0.elapsed(),
        found,
        hits,
        misses
    );
}
