use glam::Vec2;
use sars::*;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Thing {
    Magnet,
    Pebble,
    Hazard,
}

fn bb(cx: f32, cy: f32, half: f32) -> Aabb2 {
    Aabb2::from_center(Vec2::new(cx, cy), Vec2::splat(half))
}

fn main() {
    let mut ix: SpatialIndex<Thing> = SpatialIndex::new(IndexConfig::default()).expect("default layout");

    let magnet = ix.insert(None, &bb(0.0, 0.0, 0.1), Thing::Magnet);
    for i in 0..6 {
        let a = i as f32 * std::f32::consts::TAU / 6.0;
        ix.insert(None, &bb(a.cos() * 0.4, a.sin() * 0.4, 0.04), Thing::Pebble);
    }
    ix.insert(None, &bb(0.3, 0.05, 0.05), Thing::Hazard);

    // Pull every pebble within range halfway in; each pulled pebble checks its
    // new spot for hazards with a nested search.
    let range = Aabb2::new(Vec2::splat(-0.5), Vec2::splat(0.5));
    let center = ix.aabb(magnet).center();
    let mut hazard_hits = 0;
    let pulled = ix.search_by_aabb(Some(center), &range, |ix, hit| {
        if hit.payload != Thing::Pebble {
            return SearchVerdict::MoreMiss;
        }
        let moved = hit.aabb.translate((center - hit.position) * 0.5);
        let id = ix.move_object(hit.id, None, &moved);
        let own = ix.aabb(id);
        hazard_hits += ix.search_by_aabb(None, &own, |_, other| {
            if other.payload == Thing::Hazard { SearchVerdict::StopHit } else { SearchVerdict::MoreMiss }
        });
        SearchVerdict::MoreHit
    });

    println!(
        "pulled={} pebbles_touching_hazard={} stats={:?}",
        pulled,
        hazard_hits,
        ix.debug_stats()
    );
}
