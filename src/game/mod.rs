//! The game model: pooled entities, per-tick rules resolved through index
//! searches, and the phase machine around a round of play.

mod entity;
mod search;
mod tick;
mod timers;

#[cfg(test)]
mod tests;

pub use entity::{Entity, EntityId, EntityKind, Pool};
pub use timers::{TickTimers, Timer};

use std::collections::VecDeque;

use glam::{Mat4, Vec2, Vec3};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::SpatialIndexApi;
use crate::bounds::{Aabb3, model_transform, transform_aabb3_to_aabb2};
use crate::config::GameConfig;
use crate::error::{ConfigError, Error};
use crate::index::SpatialIndex;
use crate::input::{InputEvent, InputState, Key, TouchTracker};
use crate::present::{Presenter, VisualId, VisualKind};

/// Where a round stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    /// The adult got infected.
    Over,
    OverDelay,
    OverWaiting,
    /// The hoard reached the win threshold.
    OverWinning,
    OverWinningDelay,
    OverWinningWaiting,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        self != GamePhase::Playing
    }

    /// Waiting for any key or touch to start over.
    pub fn is_waiting(self) -> bool {
        matches!(self, GamePhase::OverWaiting | GamePhase::OverWinningWaiting)
    }

    pub fn is_win(self) -> bool {
        matches!(
            self,
            GamePhase::OverWinning | GamePhase::OverWinningDelay | GamePhase::OverWinningWaiting
        )
    }
}

/// What the caller's event loop should do after an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Quit,
}

// Render layers
const LAYER_TV: u32 = 1;
const LAYER_ADULT: u32 = 3;
const LAYER_BABY: u32 = 4;
const LAYER_PICKUP: u32 = 4;
const LAYER_VIRUS: u32 = 5;
const LAYER_ICON: u32 = 8;

/// Hoard icons per row on the score display.
const ICONS_PER_ROW: usize = 16;
const ICON_PITCH: f32 = 0.0625;

/// One icon per hoarded teepee. Not indexed; purely decorative.
#[derive(Copy, Clone, Debug)]
struct TeepeeIcon {
    visual: VisualId,
}

/// Entities with a fixed role for the whole round.
#[derive(Clone, Debug, Default)]
struct Cast {
    adult: EntityId,
    tv: EntityId,
    mask: EntityId,
    teepee: EntityId,
    viruses: Vec<EntityId>,
}

/// All round state apart from the index, so search visitors can borrow it
/// while the index is lent out.
struct Sim<V> {
    cfg: GameConfig,
    presenter: V,
    rng: StdRng,
    phase: GamePhase,
    timers: TickTimers,

    pool: Pool,
    cast: Cast,
    /// Babies on screen and not yet infected or rescued.
    babies_cnt: usize,
    teepee_cnt: u32,
    icons: Vec<TeepeeIcon>,

    /// Fresh infections awaiting their own virus search.
    pending: VecDeque<EntityId>,
    /// Rescued babies whose slots the next respawn reuses.
    rescues: Vec<EntityId>,
    flashers_on: Vec<EntityId>,
    flashers_off: Vec<EntityId>,
}

/// A game session: the spatial index plus everything living in it.
pub struct Game<V: Presenter> {
    index: SpatialIndex<EntityId>,
    sim: Sim<V>,
    touch: TouchTracker,
}

impl<V: Presenter> Game<V> {
    /// Validate the config, build the index, and start the first round.
    pub fn new(cfg: GameConfig, presenter: V) -> Result<Self, Error> {
        cfg.validate()?;
        let mut index = SpatialIndex::new(cfg.index.clone())?;
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sim = Sim {
            pool: Pool::with_capacity(cfg.max_entities),
            cfg,
            presenter,
            rng,
            phase: GamePhase::Playing,
            timers: TickTimers::default(),
            cast: Cast::default(),
            babies_cnt: 0,
            teepee_cnt: 0,
            icons: Vec::new(),
            pending: VecDeque::new(),
            rescues: Vec::new(),
            flashers_on: Vec::new(),
            flashers_off: Vec::new(),
        };
        sim.reset(&mut index);
        Ok(Self { index, sim, touch: TouchTracker::default() })
    }

    /// Load a TOML config file and start a game with it.
    pub fn from_config_file(path: impl AsRef<std::path::Path>, presenter: V) -> Result<Self, Error> {
        Self::new(GameConfig::load(path)?, presenter)
    }

    /// Throw the current round away and start a fresh one.
    pub fn reset(&mut self) {
        self.touch.clear();
        self.sim.reset(&mut self.index);
    }

    /// Advance to `now_ms` on the caller's monotonic clock.
    pub fn update(&mut self, now_ms: u64, keys: &InputState) {
        let sim = &mut self.sim;
        match sim.phase {
            GamePhase::Playing => sim.play(&mut self.index, now_ms, keys, self.touch.position()),

            GamePhase::Over => {
                sim.show_score();
                sim.timers.reset(Timer::Over, now_ms);
                sim.set_phase(GamePhase::OverDelay);
            }
            GamePhase::OverDelay => {
                if sim.timers.elapsed(Timer::Over, now_ms, sim.cfg.over_delay_ms) {
                    sim.set_phase(GamePhase::OverWaiting);
                }
            }
            GamePhase::OverWaiting => {}

            GamePhase::OverWinning => {
                sim.show_score();
                sim.timers.reset(Timer::Over, now_ms);
                sim.set_phase(GamePhase::OverWinningDelay);
            }
            GamePhase::OverWinningDelay => {
                let t = sim.timers.ticks(Timer::Over, now_ms) as f32 / sim.cfg.over_delay_ms.max(1) as f32;
                if t > 1.0 {
                    sim.set_phase(GamePhase::OverWinningWaiting);
                } else {
                    sim.explode_icons(t);
                }
            }
            GamePhase::OverWinningWaiting => {
                let ticks = sim.timers.ticks(Timer::Over, now_ms);
                sim.scroll_icons(ticks);
            }
        }
    }

    /// Feed one input event.
    pub fn dispatch(&mut self, event: &InputEvent) -> Dispatch {
        match event {
            InputEvent::KeyDown(Key::Escape) => return Dispatch::Quit,
            InputEvent::KeyDown(Key::Other) => {
                if self.sim.phase.is_waiting() {
                    self.reset();
                }
            }
            InputEvent::FingerDown(finger) => {
                if self.sim.phase.is_waiting() {
                    self.reset();
                }
                self.touch.track(finger, self.sim.cfg.touch_scale);
            }
            InputEvent::FingerMotion(finger) => self.touch.track(finger, self.sim.cfg.touch_scale),
            InputEvent::FingerUp(finger) => self.touch.release(finger),
        }
        Dispatch::Continue
    }

    pub fn phase(&self) -> GamePhase {
        self.sim.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.sim.cfg
    }

    /// Replace the tuning for the next round. The index layout is fixed for
    /// the lifetime of the game.
    pub fn set_config(&mut self, cfg: GameConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        if cfg.index != self.sim.cfg.index {
            return Err(ConfigError::Invalid {
                field: "index",
                reason: "grid layout can't change on a running game".into(),
            });
        }
        self.sim.cfg = cfg;
        Ok(())
    }

    pub fn presenter(&self) -> &V {
        &self.sim.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut V {
        &mut self.sim.presenter
    }

    pub fn index(&self) -> &SpatialIndex<EntityId> {
        &self.index
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        self.sim.pool.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.sim.pool.iter()
    }

    pub fn adult(&self) -> EntityId {
        self.sim.cast.adult
    }

    /// Babies in play (not infected, not rescued).
    pub fn babies(&self) -> usize {
        self.sim.babies_cnt
    }

    pub fn rescues(&self) -> u32 {
        self.sim.rescues_total()
    }

    pub fn score(&self) -> u32 {
        self.sim.score()
    }

    /// Teepee hoarded so far.
    pub fn hoard(&self) -> u32 {
        self.sim.teepee_cnt
    }
}

impl<V: Presenter> Sim<V> {
    fn reset(&mut self, ix: &mut SpatialIndex<EntityId>) {
        ix.reset();
        self.presenter.clear();
        if self.pool.capacity() == self.cfg.max_entities {
            self.pool.clear();
        } else {
            debug!("entity pool resized {} -> {}", self.pool.capacity(), self.cfg.max_entities);
            self.pool = Pool::with_capacity(self.cfg.max_entities);
        }
        self.babies_cnt = 0;
        self.teepee_cnt = 0;
        self.icons.clear();
        self.pending.clear();
        self.rescues.clear();
        self.flashers_on.clear();
        self.flashers_off.clear();

        let scales = self.cfg.scales.clone();
        let tv = self.spawn(EntityKind::Tv, VisualKind::Tv, LAYER_TV, scales.tv);
        self.update_x(ix, tv);
        let teepee = self.spawn(EntityKind::Teepee { quantity: 1, bonus: None }, VisualKind::Teepee, LAYER_PICKUP, scales.teepee);
        let mask = self.spawn(EntityKind::Mask, VisualKind::Mask, LAYER_PICKUP, scales.mask);
        let adult = self.spawn(
            EntityKind::Adult { rescues: 0, masked: 0, captivated: false, holding: None, infected: false },
            VisualKind::Adult,
            LAYER_ADULT,
            scales.adult,
        );
        self.update_x(ix, adult);

        let mut viruses = Vec::with_capacity(self.cfg.num_viruses);
        for _ in 0..self.cfg.num_viruses {
            let virus = self.spawn(EntityKind::Virus { roaming: true }, VisualKind::Virus, LAYER_VIRUS, scales.virus);
            self.pool.get_mut(virus).position = self.random_position();
            self.update_x(ix, virus);
            viruses.push(virus);
        }
        self.cast = Cast { adult, tv, mask, teepee, viruses };

        for _ in 0..self.cfg.num_babies {
            if self.new_baby(ix).is_some() {
                self.babies_cnt += 1;
            }
        }
        self.set_active(adult, true);

        self.phase = GamePhase::Playing;
        info!(
            "new game: {} babies, {} viruses, {} entities",
            self.cfg.num_babies,
            self.cfg.num_viruses,
            self.pool.len()
        );
    }

    fn spawn(&mut self, kind: EntityKind, visual: VisualKind, layer: u32, scale: Vec3) -> EntityId {
        let visual = self.presenter.create_visual(visual, layer);
        self.pool.alloc(Entity::new(kind, visual, scale))
    }

    /// Spawn a baby at a random spot, reusing a rescued one when available.
    /// `None` once the pool is full and nobody is waiting for reuse.
    fn new_baby(&mut self, ix: &mut SpatialIndex<EntityId>) -> Option<EntityId> {
        let baby = match self.rescues.pop() {
            Some(baby) => baby,
            None if self.pool.is_full() => return None,
            None => self.spawn(EntityKind::Baby { hatted: false }, VisualKind::Baby, LAYER_BABY, self.cfg.scales.baby),
        };
        self.pool.get_mut(baby).position = self.random_position();
        self.update_x(ix, baby);
        self.set_active(baby, true);
        Some(baby)
    }

    /// Rebuild an entity's transform and box from its position and push the
    /// box into the index.
    fn update_x(&mut self, ix: &mut SpatialIndex<EntityId>, id: EntityId) {
        let e = self.pool.get_mut(id);
        e.model_x = model_transform(e.position, e.scale);
        e.aabb = transform_aabb3_to_aabb2(&e.model_x, &Aabb3::UNIT);
        e.handle = Some(match e.handle {
            None => ix.insert(None, &e.aabb, id),
            Some(handle) => ix.move_object(handle, None, &e.aabb),
        });
        self.presenter.set_transform(e.visual, &e.model_x);
    }

    fn set_active(&mut self, id: EntityId, active: bool) {
        let e = self.pool.get_mut(id);
        e.active = active;
        self.presenter.set_active(e.visual, active);
    }

    fn is_active(&self, id: EntityId) -> bool {
        self.pool.get(id).active
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if phase != self.phase {
            debug!("phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Uniform in `[-1, 1]` per axis.
    fn random_position(&mut self) -> Vec2 {
        Vec2::new(self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0))
    }

    fn chance(&mut self, p: f32) -> bool {
        self.rng.r#gen::<f32>() < p
    }

    fn rescues_total(&self) -> u32 {
        match self.pool.get(self.cast.adult).kind {
            EntityKind::Adult { rescues, .. } => rescues,
            _ => 0,
        }
    }

    fn score(&self) -> u32 {
        self.rescues_total() * self.cfg.score_per_rescue
    }

    fn show_score(&mut self) {
        let score = self.score();
        if self.phase.is_win() {
            info!("hoarded {} teepee, score {}", self.teepee_cnt, score);
        } else {
            info!("adult infected after {} rescue(s), score {}", self.rescues_total(), score);
        }
        self.presenter.show_score(score);
    }

    fn icon_home(i: usize) -> Vec2 {
        Vec2::new(
            ((i % ICONS_PER_ROW) as f32 * ICON_PITCH) * 2.0 - 0.9375,
            (0.9687 - (i / ICONS_PER_ROW) as f32 * ICON_PITCH) * 1.9375 - 0.9375,
        )
    }

    fn add_icon(&mut self) {
        let visual = self.presenter.create_visual(VisualKind::TeepeeIcon, LAYER_ICON);
        let at = Self::icon_home(self.icons.len());
        let model_x = Mat4::from_translation(at.extend(0.0)) * Mat4::from_scale(self.cfg.scales.teepee_icon);
        self.presenter.set_transform(visual, &model_x);
        self.presenter.set_active(visual, true);
        self.icons.push(TeepeeIcon { visual });
    }

    /// Blow the hoard outward, `t` running 0..1 over the over-delay.
    fn explode_icons(&mut self, t: f32) {
        let spread = 1.0 + t * 32.0;
        for (i, icon) in self.icons.iter().enumerate() {
            let at = Self::icon_home(i) * spread;
            let model_x = Mat4::from_translation(at.extend(0.0)) * Mat4::from_scale(self.cfg.scales.teepee_icon);
            self.presenter.set_transform(icon.visual, &model_x);
        }
    }

    /// Scroll the hoard upward in a loop while spinning it.
    fn scroll_icons(&mut self, ticks: u64) {
        let angle = ((ticks % 6283) as f32 * 0.005).sin();
        let scroll = (ticks % 10_000) as f32 * 0.0001;
        for (i, icon) in self.icons.iter().enumerate() {
            let x = Self::icon_home(i).x;
            let row = (i / ICONS_PER_ROW) as f32 * ICON_PITCH;
            let y = (1.0 - (row + scroll).rem_euclid(1.0)) * 3.0 - 1.5;
            let model_x = Mat4::from_translation(Vec3::new(x, y, 0.0))
                * Mat4::from_scale(self.cfg.scales.teepee_icon)
                * Mat4::from_rotation_z(angle);
            self.presenter.set_transform(icon.visual, &model_x);
        }
    }
}
