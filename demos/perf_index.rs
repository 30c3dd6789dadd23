use glam::Vec2;
use sars::*;
use std::time::Instant;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    (lcg(seed) as f32 / u32::MAX as f32) * 2.0 - 1.0
}

/// Uniform point inside `area`.
fn point(seed: &mut u32, area: &Aabb2) -> Vec2 {
    let t = Vec2::new(lcg(seed) as f32, lcg(seed) as f32) / u32::MAX as f32;
    area.min + area.size() * t
}

fn main() {
    let n = 20_000usize; // number of objects
    let frames = 60;
    for cells in [4u32, 16, 64] {
        let mut ix: SpatialIndex<u32> = SpatialIndex::new(IndexConfig {
            bounds: None,
            cells_x: cells,
            cells_y: cells,
            max_searches: 2,
        })
        .expect("valid layout");

        let area = ix.bounds();
        let mut seed = 1u32;
        let half = Vec2::splat(0.01);
        let mut ids = Vec::with_capacity(n);
        let t0 = Instant::now();
        for i in 0..n {
            let c = point(&mut seed, &area);
            ids.push(ix.insert(None, &Aabb2::from_center(c, half), i as u32));
        }
        let t_insert = t0.elapsed();

        let t1 = Instant::now();
        let mut hits = 0usize;
        for _ in 0..frames {
            for &id in &ids {
                let b = ix.aabb(id);
                let drift = Vec2::new(unit(&mut seed), unit(&mut seed)) * 0.01;
                ix.move_object(id, None, &b.translate(drift));
            }
            for &id in ids.iter().step_by(100) {
                let b = ix.aabb(id);
                hits += ix.search_by_aabb(None, &b, |_, _| SearchVerdict::MoreHit);
            }
        }
        let t_frames = t1.elapsed();

        println!(
            "N={} cells={}x{} insert={:?} {} frames={:?} ({:.3}ms/frame) hits={} stats={:?}",
            n,
            cells,
            cells,
            t_insert,
            frames,
            t_frames,
            t_frames.as_secs_f64() * 1000.0 / frames as f64,
            hits,
            ix.debug_stats()
        );
    }
}
