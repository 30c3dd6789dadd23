use approx::assert_relative_eq;
use glam::Vec2;

use super::*;
use crate::config::TeepeeQuantity;
use crate::input::Finger;
use crate::present::{LogPresenter, Sfx};

/// Nothing spawns on its own and nothing starts on screen except the adult.
fn quiet() -> GameConfig {
    GameConfig {
        seed: Some(7),
        num_viruses: 0,
        num_babies: 0,
        tv_spawn_chance: 0.0,
        mask_spawn_chance: 0.0,
        teepee_spawn_chance: 0.0,
        ..GameConfig::default()
    }
}

fn game(cfg: GameConfig) -> Game<LogPresenter> {
    Game::new(cfg, LogPresenter::new()).unwrap()
}

fn place(g: &mut Game<LogPresenter>, id: EntityId, x: f32, y: f32) {
    g.sim.pool.get_mut(id).position = Vec2::new(x, y);
    g.sim.update_x(&mut g.index, id);
}

fn add_baby(g: &mut Game<LogPresenter>, x: f32, y: f32) -> EntityId {
    let baby = g.sim.new_baby(&mut g.index).unwrap();
    g.sim.babies_cnt += 1;
    place(g, baby, x, y);
    baby
}

/// Activate a roaming virus at a spot.
fn drop_virus(g: &mut Game<LogPresenter>, x: f32, y: f32) -> EntityId {
    let virus = g.sim.cast.viruses[0];
    g.sim.set_active(virus, true);
    place(g, virus, x, y);
    virus
}

fn adult_state(g: &Game<LogPresenter>) -> (u32, u32, bool, Option<EntityId>, bool) {
    match g.entity(g.adult()).kind {
        EntityKind::Adult { rescues, masked, captivated, holding, infected } => {
            (rescues, masked, captivated, holding, infected)
        }
        other => panic!("adult slot holds {other:?}"),
    }
}

fn sounds(g: &Game<LogPresenter>, sfx: Sfx) -> usize {
    g.presenter().sounds.iter().filter(|&&s| s == sfx).count()
}

fn visual_kind(g: &Game<LogPresenter>, id: EntityId) -> VisualKind {
    g.presenter().visual(g.entity(id).visual).unwrap().kind
}

#[test]
fn test_new_rejects_invalid_config() {
    let cfg = GameConfig { win_threshold: 0, ..quiet() };
    assert!(matches!(Game::new(cfg, LogPresenter::new()), Err(Error::Config(_))));
}

#[test]
fn test_reset_populates_round() {
    let cfg = GameConfig { seed: Some(1), ..GameConfig::default() };
    let mut g = game(cfg);
    // tv, teepee, mask, adult, viruses, babies
    assert_eq!(g.sim.pool.len(), 4 + 8 + 10);
    assert_eq!(g.babies(), 10);
    assert_eq!(g.phase(), GamePhase::Playing);
    assert!(g.entity(g.adult()).active);
    // Everything but the unspawned mask and teepee is indexed
    assert_eq!(g.index().len(), g.sim.pool.len() - 2);

    g.update(20, &InputState::default());
    g.reset();
    assert_eq!(g.sim.pool.len(), 4 + 8 + 10);
    assert_eq!(g.hoard(), 0);
    assert_eq!(g.index().depth(), 0);
}

#[test]
fn test_one_virus_two_babies_converted_once() {
    let mut g = game(GameConfig { num_viruses: 1, ..quiet() });
    let adult = g.adult();
    place(&mut g, adult, 0.8, 0.8);
    let a = add_baby(&mut g, 0.06, 0.0);
    let b = add_baby(&mut g, -0.06, 0.0);
    let c = add_baby(&mut g, -0.8, -0.8);
    drop_virus(&mut g, 0.0, 0.0);

    g.update(20, &InputState::default());
    assert!(g.entity(a).is_virus() && g.entity(b).is_virus());
    assert!(g.entity(c).is_baby());
    assert_eq!(g.babies(), 1);
    assert_eq!(sounds(&g, Sfx::BabyInfected), 2);
    // Their own searches ran this tick and found nothing to convert
    assert!(g.sim.pending.is_empty());
}

#[test]
fn test_infection_spreads_one_level_per_tick() {
    let mut g = game(GameConfig { num_viruses: 1, ..quiet() });
    let adult = g.adult();
    place(&mut g, adult, 0.8, 0.8);
    let b1 = add_baby(&mut g, 0.08, 0.0);
    let b2 = add_baby(&mut g, 0.16, 0.0);
    let b3 = add_baby(&mut g, 0.24, 0.0);
    let far = add_baby(&mut g, -0.8, -0.8);
    let virus = drop_virus(&mut g, 0.0, 0.0);
    assert_eq!(g.babies(), 4);

    let keys = InputState::default();
    g.update(20, &keys);
    // The virus got b1; b1's own search got b2; b2 waits for the next tick
    assert!(g.entity(b1).is_virus());
    assert!(g.entity(b2).is_virus());
    assert!(g.entity(b3).is_baby());
    assert_eq!(g.sim.pending.iter().copied().collect::<Vec<_>>(), vec![b2]);
    assert_eq!(sounds(&g, Sfx::BabyInfected), 2);
    assert_eq!(g.babies(), 2);
    // A successful virus resets
    assert!(!g.entity(virus).active);

    g.update(40, &keys);
    assert_eq!(g.entity(b3).kind, EntityKind::Virus { roaming: false });
    assert_eq!(visual_kind(&g, b3), VisualKind::BabyInfected);
    assert_eq!(sounds(&g, Sfx::BabyInfected), 3);
    assert_eq!(g.babies(), 1);

    // Nothing left to catch: no further infections, no double counting
    g.update(60, &keys);
    g.update(80, &keys);
    assert!(g.entity(far).is_baby());
    assert_eq!(sounds(&g, Sfx::BabyInfected), 3);
    assert_eq!(g.babies(), 1);
    assert!(g.sim.pending.is_empty());
}

#[test]
fn test_rescue_on_every_edge() {
    let edges = [
        (InputState { right: true, ..Default::default() }, Vec2::new(0.95, 0.0)),
        (InputState { left: true, ..Default::default() }, Vec2::new(-0.95, 0.0)),
        (InputState { up: true, ..Default::default() }, Vec2::new(0.0, 0.95)),
        (InputState { down: true, ..Default::default() }, Vec2::new(0.0, -0.95)),
    ];
    for (keys, start) in edges {
        let mut g = game(GameConfig { num_babies: 1, ..quiet() });
        let baby = g.entities().find(|(_, e)| e.is_baby()).map(|(id, _)| id).unwrap();
        let adult = g.adult();
        place(&mut g, adult, start.x, start.y);
        place(&mut g, baby, start.x, start.y);

        g.update(20, &keys);
        assert_eq!(adult_state(&g).3, Some(baby), "picked up heading {keys:?}");
        assert_eq!(sounds(&g, Sfx::BabyHeld), 1);

        for t in [40, 60, 80, 100] {
            g.update(t, &keys);
        }
        let (rescues, _, _, holding, _) = adult_state(&g);
        assert_eq!((rescues, holding), (1, None), "rescued heading {keys:?}");
        assert!(!g.entity(baby).active);
        assert_eq!(g.babies(), 0);
        assert_eq!(g.score(), 420);
        assert_eq!(sounds(&g, Sfx::BabyRescued), 1);
        let at = g.entity(adult).position;
        assert!(at.abs().max_element() <= 1.1 + 1e-6);

        // The respawn reuses the rescued baby's slot
        let before = g.sim.pool.len();
        g.update(500, &InputState::default());
        assert_eq!(g.sim.pool.len(), before);
        assert!(g.entity(baby).active);
        assert_eq!(g.babies(), 1);
    }
}

#[test]
fn test_mask_absorbs_three_hits_then_adult_falls() {
    let mut g = game(GameConfig { num_viruses: 1, ..quiet() });
    let (adult, mask) = (g.adult(), g.sim.cast.mask);
    g.sim.spawn_mask(&mut g.index, 0.0);
    place(&mut g, mask, 0.0, 0.0);

    let keys = InputState::default();
    let mut now = 20;
    g.update(now, &keys);
    assert_eq!(adult_state(&g).1, 3);
    assert!(!g.entity(mask).active);
    assert_eq!(visual_kind(&g, adult), VisualKind::AdultMasked);

    for left in [2, 1, 0] {
        drop_virus(&mut g, 0.0, 0.0);
        now += 20;
        g.update(now, &keys);
        assert_eq!(adult_state(&g).1, left);
        assert!(!adult_state(&g).4);
        assert!(g.entity(adult).flashing);
        assert_eq!(g.phase(), GamePhase::Playing);
    }
    assert_eq!(sounds(&g, Sfx::AdultMaskHit), 3);
    assert_eq!(sounds(&g, Sfx::AdultUnmasked), 1);
    assert_eq!(visual_kind(&g, adult), VisualKind::Adult);

    drop_virus(&mut g, 0.0, 0.0);
    now += 20;
    g.update(now, &keys);
    assert!(adult_state(&g).4);
    assert_eq!(visual_kind(&g, adult), VisualKind::AdultInfected);
    assert_eq!(g.phase(), GamePhase::Over);

    now += 20;
    g.update(now, &keys);
    assert_eq!(g.phase(), GamePhase::OverDelay);
    assert_eq!(g.presenter().scores, vec![0]);
    g.update(now + 999, &keys);
    assert_eq!(g.phase(), GamePhase::OverDelay);
    g.update(now + 1000, &keys);
    assert_eq!(g.phase(), GamePhase::OverWaiting);

    assert_eq!(g.dispatch(&InputEvent::KeyDown(Key::Other)), Dispatch::Continue);
    assert_eq!(g.phase(), GamePhase::Playing);
    assert_eq!(adult_state(&g), (0, 0, false, None, false));
}

#[test]
fn test_hatted_baby_is_immune() {
    let mut g = game(GameConfig { num_viruses: 1, ..quiet() });
    let adult = g.adult();
    place(&mut g, adult, 0.8, 0.8);
    let baby = add_baby(&mut g, -0.5, 0.0);
    let mask = g.sim.cast.mask;
    g.sim.spawn_mask(&mut g.index, -0.5);
    place(&mut g, mask, -0.5, 0.0);

    g.update(20, &InputState::default());
    assert!(g.entity(baby).is_hatted());
    assert_eq!(visual_kind(&g, baby), VisualKind::BabyHatted);
    assert!(!g.entity(mask).active);

    let virus = drop_virus(&mut g, -0.5, 0.0);
    g.update(40, &InputState::default());
    assert!(g.entity(baby).is_baby());
    assert_eq!(g.babies(), 1);
    assert!(g.entity(virus).active);
}

#[test]
fn test_infected_held_baby_is_dropped() {
    let mut g = game(GameConfig { num_viruses: 1, ..quiet() });
    let adult = g.adult();
    place(&mut g, adult, 0.5, 0.5);
    let baby = add_baby(&mut g, 0.0, 0.0);
    if let EntityKind::Adult { holding, .. } = &mut g.sim.pool.get_mut(adult).kind {
        *holding = Some(baby);
    }
    drop_virus(&mut g, 0.0, 0.0);

    g.update(20, &InputState::default());
    assert!(g.entity(baby).is_virus());
    assert_eq!(adult_state(&g).3, None);
    assert_eq!(g.phase(), GamePhase::Playing);
}

#[test]
fn test_win_on_the_tick_the_hoard_crosses_threshold() {
    let cfg = GameConfig {
        win_threshold: 8,
        teepee_quantities: vec![TeepeeQuantity { quantity: 4, chance: 1.0 }],
        ..quiet()
    };
    let mut g = game(cfg);
    let teepee = g.sim.cast.teepee;
    let keys = InputState::default();

    g.sim.spawn_teepee(&mut g.index, 0.0, 4);
    place(&mut g, teepee, 0.0, 0.0);
    g.update(20, &keys);
    assert_eq!(g.hoard(), 4);
    assert!(!g.entity(teepee).active);
    assert_eq!(g.phase(), GamePhase::Playing);

    g.sim.spawn_teepee(&mut g.index, 0.0, 4);
    place(&mut g, teepee, 0.0, 0.0);
    g.update(40, &keys);
    assert_eq!(g.hoard(), 8);
    assert_eq!(g.phase(), GamePhase::OverWinning);
    assert_eq!(g.presenter().count_active(VisualKind::TeepeeIcon), 8);

    g.update(60, &keys);
    assert_eq!(g.phase(), GamePhase::OverWinningDelay);
    assert_eq!(g.presenter().scores, vec![0]);
    g.update(560, &keys);
    assert_eq!(g.phase(), GamePhase::OverWinningDelay);
    g.update(1080, &keys);
    assert_eq!(g.phase(), GamePhase::OverWinningWaiting);
    g.update(2500, &keys);

    let finger = Finger { touch_id: 0, finger_id: 0, x: 0.5, y: 0.5 };
    g.dispatch(&InputEvent::FingerDown(finger));
    assert_eq!(g.phase(), GamePhase::Playing);
    assert_eq!(g.hoard(), 0);
}

#[test]
fn test_full_arms_refuse_teepee() {
    let mut g = game(quiet());
    let (adult, teepee) = (g.adult(), g.sim.cast.teepee);
    let baby = add_baby(&mut g, 0.0, 0.0);
    if let EntityKind::Adult { holding, .. } = &mut g.sim.pool.get_mut(adult).kind {
        *holding = Some(baby);
    }
    g.sim.spawn_teepee(&mut g.index, 0.0, 6);
    place(&mut g, teepee, 0.0, 0.0);

    g.update(20, &InputState::default());
    assert_eq!(g.hoard(), 0);
    assert!(g.entity(teepee).active);
    assert!(g.entity(teepee).flashing && g.entity(baby).flashing);
    assert!(sounds(&g, Sfx::AdultArmsFull) >= 1);

    g.update(80, &InputState::default());
    let alpha = g.presenter().visual(g.entity(baby).visual).unwrap().alpha;
    assert_relative_eq!(alpha, 0.25);
}

#[test]
fn test_tv_pulls_babies_and_nests_a_search() {
    let mut g = game(quiet());
    let adult = g.adult();
    place(&mut g, adult, 0.8, 0.8);
    let pulled = add_baby(&mut g, 0.3, 0.0);
    let sick = add_baby(&mut g, 0.36, 0.0);
    let close = add_baby(&mut g, 0.1, 0.0);
    assert!(g.sim.pool.get_mut(sick).infect());
    g.sim.babies_cnt -= 1;
    g.sim.spawn_tv(&mut g.index, Vec2::ZERO, 0);

    g.update(20, &InputState::default());
    assert_relative_eq!(g.entity(pulled).position.x, 0.295, epsilon = 1e-6);
    assert!(g.entity(pulled).is_virus());
    assert_eq!(g.babies(), 1);
    // Too close to be pulled
    assert_relative_eq!(g.entity(close).position.x, 0.1);
    assert!(g.entity(close).is_baby());
    assert_eq!(g.index().debug_stats().max_depth_reached, 2);
}

#[test]
fn test_tv_captivates_until_timer_expires() {
    let mut g = game(quiet());
    let adult = g.adult();
    g.sim.spawn_tv(&mut g.index, Vec2::ZERO, 0);
    let keys = InputState { right: true, ..Default::default() };

    g.update(20, &keys);
    assert!(adult_state(&g).2);
    assert_eq!(sounds(&g, Sfx::AdultCaptivated), 1);
    for t in (40..=2980).step_by(20) {
        g.update(t, &keys);
    }
    assert_relative_eq!(g.entity(adult).position.x, 0.04);
    assert!(adult_state(&g).2);

    g.update(3000, &keys);
    assert!(!adult_state(&g).2);
    assert!(!g.entity(g.sim.cast.tv).active);
    g.update(3020, &keys);
    assert_relative_eq!(g.entity(adult).position.x, 0.08);
}

#[test]
fn test_touch_steers_adult() {
    let mut g = game(quiet());
    // Right edge of the window maps past the play area
    let finger = Finger { touch_id: 1, finger_id: 3, x: 1.0, y: 0.5 };
    g.dispatch(&InputEvent::FingerDown(finger));
    g.update(20, &InputState::default());
    assert_relative_eq!(g.entity(g.adult()).position.x, 0.04);

    g.dispatch(&InputEvent::FingerUp(finger));
    g.update(40, &InputState::default());
    assert_relative_eq!(g.entity(g.adult()).position.x, 0.04);
    assert_eq!(g.dispatch(&InputEvent::KeyDown(Key::Escape)), Dispatch::Quit);
}

fn baby_ids(g: &Game<LogPresenter>) -> Vec<EntityId> {
    g.entities().filter(|(_, e)| e.is_baby()).map(|(id, _)| id).collect()
}

#[test]
fn test_full_pool_leaves_nursery_short() {
    let cfg = GameConfig { num_babies: 2, max_entities: 6, ..quiet() };
    let mut g = game(cfg);
    assert_eq!(g.sim.pool.len(), 6);
    let babies = baby_ids(&g);
    assert!(g.sim.pool.get_mut(babies[0]).infect());
    g.sim.set_active(babies[0], false);
    g.sim.babies_cnt -= 1;

    g.update(500, &InputState::default());
    assert_eq!(g.sim.pool.len(), 6);
    assert_eq!(g.babies(), 1);
    assert_eq!(g.phase(), GamePhase::Playing);

    // A rescued slot is still handed back out
    g.sim.set_active(babies[1], false);
    g.sim.rescues.push(babies[1]);
    g.sim.babies_cnt -= 1;
    g.update(1000, &InputState::default());
    assert_eq!(g.sim.pool.len(), 6);
    assert_eq!(g.babies(), 1);
    assert!(g.entity(babies[1]).active);
}

#[test]
fn test_set_config_resizes_pool_on_reset() {
    let mut g = game(GameConfig { max_entities: 4, ..quiet() });
    assert_eq!(g.sim.pool.capacity(), 4);

    g.set_config(GameConfig { max_entities: 40, num_babies: 30, ..quiet() }).unwrap();
    g.reset();
    assert_eq!(g.sim.pool.capacity(), 40);
    assert_eq!(g.sim.pool.len(), 34);
    assert_eq!(g.babies(), 30);
}

#[test]
fn test_baby_on_the_tv_is_not_pulled() {
    let mut g = game(quiet());
    let adult = g.adult();
    place(&mut g, adult, 0.8, 0.8);
    g.sim.cfg.tv_range_min = 0.0;
    let baby = add_baby(&mut g, 0.3, 0.3);
    g.sim.spawn_tv(&mut g.index, Vec2::new(0.3, 0.3), 0);

    g.update(20, &InputState::default());
    assert_eq!(g.entity(baby).position, Vec2::new(0.3, 0.3));
    assert!(g.entity(baby).is_baby());
}

#[test]
fn test_inactive_teepee_is_not_a_hit() {
    let mut g = game(quiet());
    let (adult, teepee) = (g.adult(), g.sim.cast.teepee);
    place(&mut g, teepee, 0.0, 0.0);
    let aabb = g.entity(adult).aabb;

    let hits = g.index.search_by_aabb(None, &aabb, |ix, hit| g.sim.adult_search(ix, hit));
    assert_eq!(hits, 0);
    assert_eq!(g.hoard(), 0);

    g.sim.set_active(teepee, true);
    let hits = g.index.search_by_aabb(None, &aabb, |ix, hit| g.sim.adult_search(ix, hit));
    assert_eq!(hits, 1);
    assert_eq!(g.hoard(), 1);
    assert_eq!(sounds(&g, Sfx::AdultMine), 1);
}

#[test]
fn test_reset_drops_touch() {
    let mut g = game(quiet());
    let finger = Finger { touch_id: 1, finger_id: 0, x: 1.0, y: 0.5 };
    g.dispatch(&InputEvent::FingerDown(finger));
    g.reset();
    g.update(20, &InputState::default());
    assert_relative_eq!(g.entity(g.adult()).position.x, 0.0);
}
