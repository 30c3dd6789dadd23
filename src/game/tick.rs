//! One step of play: the timer-driven passes over the round.

use glam::Vec2;
use log::{debug, info, trace};
use rand::Rng;

use crate::api::SpatialIndexApi;
use crate::bounds::Aabb2;
use crate::index::SpatialIndex;
use crate::input::{self, InputState};
use crate::present::{Presenter, Sfx};

use super::{EntityId, EntityKind, GamePhase, Sim, Timer};

type Ix = SpatialIndex<EntityId>;

impl<V: Presenter> Sim<V> {
    /// Run every pass whose timer elapsed, then settle the phase.
    pub(super) fn play(&mut self, ix: &mut Ix, now_ms: u64, keys: &InputState, touch: Option<Vec2>) {
        if self.timers.elapsed(Timer::Entities, now_ms, self.cfg.entities_delay_ms) {
            self.update_entities(ix, now_ms);
        }

        if self.timers.elapsed(Timer::Input, now_ms, self.cfg.input_delay_ms) {
            let from = self.pool.get(self.cast.adult).position;
            if let Some(dir) = input::movement(keys, touch, from, self.cfg.adult_speed) {
                self.move_adult(ix, dir);
            }
        }

        if self.timers.elapsed(Timer::Tv, now_ms, self.cfg.tv_delay_ms) {
            self.tv_off();
        }

        if self.timers.elapsed(Timer::Flashers, now_ms, self.cfg.flashers_delay_ms) {
            self.flash_step();
        }

        if self.timers.elapsed(Timer::NewBabies, now_ms, self.cfg.new_babies_delay_ms) {
            self.refill_babies(ix);
        }

        self.settle();
    }

    /// Move everything that moves on its own and resolve the contacts.
    pub(super) fn update_entities(&mut self, ix: &mut Ix, now_ms: u64) {
        let (tv, mask, teepee) = (self.cast.tv, self.cast.mask, self.cast.teepee);

        if !self.is_active(tv) && self.chance(self.cfg.tv_spawn_chance) {
            let at = self.random_position();
            self.spawn_tv(ix, at, now_ms);
        }
        if !self.is_active(mask) && self.chance(self.cfg.mask_spawn_chance) {
            let x = self.rng_x();
            self.spawn_mask(ix, x);
        }
        if !self.is_active(teepee) && self.chance(self.cfg.teepee_spawn_chance) {
            let x = self.rng_x();
            let quantity = self.roll_teepee_quantity();
            self.spawn_teepee(ix, x, quantity);
        }

        if self.is_active(mask) {
            self.pool.get_mut(mask).position.y += self.cfg.pickup_speed;
            self.update_x(ix, mask);
            let aabb = self.pool.get(mask).aabb;
            let hits = ix.search_by_aabb(None, &aabb, |_, hit| self.mask_search(hit));
            if hits == 0 && self.pool.get(mask).position.y > self.cfg.offscreen {
                self.set_active(mask, false);
            }
        }

        if self.is_active(teepee) {
            self.pool.get_mut(teepee).position.y += self.cfg.pickup_speed;
            self.update_x(ix, teepee);
            let e = self.pool.get(teepee);
            let (aabb, at) = (e.aabb, e.position);
            if let EntityKind::Teepee { bonus: Some(bonus), .. } = e.kind {
                self.presenter.move_bonus(bonus, at);
            }
            let hits = ix.search_by_aabb(None, &aabb, |_, hit| self.teepee_search(hit));
            if hits == 0 && at.y > self.cfg.offscreen {
                self.retire_teepee();
            }
        }

        if self.is_active(tv) {
            let r = self.cfg.tv_range_max;
            let range = Aabb2::new(Vec2::splat(-r), Vec2::splat(r));
            let origin = self.pool.get(tv).position;
            let pulled = ix.search_by_aabb(Some(origin), &range, |ix, hit| self.tv_search(ix, hit));
            trace!("tv pulled {} baby(ies)", pulled);
        }

        for i in 0..self.cast.viruses.len() {
            let virus = self.cast.viruses[i];
            self.roam(ix, virus);
        }

        self.spread_infections(ix);
    }

    /// Drift one roaming virus and let it infect whatever it touches.
    fn roam(&mut self, ix: &mut Ix, virus: EntityId) {
        let offscreen = self.cfg.offscreen;
        if self.pool.get(virus).position.y > offscreen {
            if self.is_active(virus) {
                self.reset_virus(ix, virus);
            } else {
                // Re-enter from the bottom
                self.set_active(virus, true);
                self.pool.get_mut(virus).position.y = -offscreen;
            }
        }

        self.pool.get_mut(virus).position.y += self.cfg.virus_speed;
        self.update_x(ix, virus);

        if self.is_active(virus) {
            let aabb = self.pool.get(virus).aabb;
            let hits = ix.search_by_aabb(None, &aabb, |ix, hit| self.virus_search(ix, virus, hit));
            if hits > 0 {
                self.reset_virus(ix, virus);
            }
        }
    }

    /// Give each infection queued before this pass one search of its own.
    /// Infections it causes wait for the next tick.
    fn spread_infections(&mut self, ix: &mut Ix) {
        let batch: Vec<EntityId> = self.pending.drain(..).collect();
        for infection in batch {
            let e = self.pool.get(infection);
            if !e.active || !e.is_virus() {
                continue;
            }
            let aabb = e.aabb;
            ix.search_by_aabb(None, &aabb, |ix, hit| self.virus_search(ix, infection, hit));
        }
        if !self.pending.is_empty() {
            trace!("{} infection(s) carried to the next tick", self.pending.len());
        }
    }

    pub(super) fn spawn_tv(&mut self, ix: &mut Ix, at: Vec2, now_ms: u64) {
        let tv = self.cast.tv;
        self.timers.reset(Timer::Tv, now_ms);
        self.pool.get_mut(tv).position = at;
        self.update_x(ix, tv);
        self.set_active(tv, true);
        let line = self.rng.gen_range(0..10u8);
        self.presenter.play(Sfx::TvTalk(line));
        debug!("tv on at {:?}", at);
    }

    pub(super) fn spawn_mask(&mut self, ix: &mut Ix, x: f32) {
        let mask = self.cast.mask;
        self.pool.get_mut(mask).position = Vec2::new(x, -self.cfg.offscreen);
        self.update_x(ix, mask);
        self.set_active(mask, true);
    }

    pub(super) fn spawn_teepee(&mut self, ix: &mut Ix, x: f32, quantity: u32) {
        let teepee = self.cast.teepee;
        let at = Vec2::new(x, -self.cfg.offscreen);
        let bonus = self.presenter.spawn_bonus(quantity, at);
        let e = self.pool.get_mut(teepee);
        e.position = at;
        if let EntityKind::Teepee { quantity: q, bonus: b } = &mut e.kind {
            *q = quantity;
            // An unreleased counter from the last drop goes with it
            if let Some(stale) = b.replace(bonus) {
                self.presenter.release_bonus(stale, at, 1);
            }
        }
        self.update_x(ix, teepee);
        self.set_active(teepee, true);
    }

    /// Entries are tried in order and later successes win, so rare big
    /// bundles override common small ones.
    fn roll_teepee_quantity(&mut self) -> u32 {
        let mut quantity = 1;
        for i in 0..self.cfg.teepee_quantities.len() {
            let entry = self.cfg.teepee_quantities[i];
            if self.rng.r#gen::<f32>() <= entry.chance {
                quantity = entry.quantity;
            }
        }
        quantity
    }

    fn rng_x(&mut self) -> f32 {
        self.rng.gen_range(-1.0..=1.0)
    }

    /// The teepee fell off the top; let its counter go right away.
    fn retire_teepee(&mut self) {
        let teepee = self.cast.teepee;
        let e = self.pool.get_mut(teepee);
        let at = e.position;
        if let EntityKind::Teepee { bonus, .. } = &mut e.kind {
            if let Some(bonus) = bonus.take() {
                self.presenter.release_bonus(bonus, at, 1);
            }
        }
        self.set_active(teepee, false);
    }

    fn tv_off(&mut self) {
        if self.is_active(self.cast.tv) {
            debug!("tv off");
        }
        self.set_active(self.cast.tv, false);
        if let EntityKind::Adult { captivated, .. } = &mut self.pool.get_mut(self.cast.adult).kind {
            *captivated = false;
        }
    }

    /// Take a virus out of play and park it somewhere random.
    pub(super) fn reset_virus(&mut self, ix: &mut Ix, virus: EntityId) {
        self.set_active(virus, false);
        self.pool.get_mut(virus).position = self.random_position();
        self.update_x(ix, virus);
    }

    /// Move the adult (and whatever it carries), rescue at the edges, then
    /// look for contacts.
    pub(super) fn move_adult(&mut self, ix: &mut Ix, dir: Vec2) {
        let adult = self.cast.adult;
        let (captivated, holding) = match self.pool.get(adult).kind {
            EntityKind::Adult { captivated, holding, .. } => (captivated, holding),
            _ => return,
        };
        if captivated {
            return;
        }

        let limit = self.cfg.adult_limit;
        let e = self.pool.get_mut(adult);
        e.position = (e.position + dir).clamp(Vec2::splat(-limit), Vec2::splat(limit));
        let at = e.position;
        self.update_x(ix, adult);

        if let Some(baby) = holding {
            self.pool.get_mut(baby).position = at;
            self.update_x(ix, baby);
            if at.abs().max_element() > self.cfg.rescue_threshold {
                self.rescue(baby);
            }
        }

        let aabb = self.pool.get(adult).aabb;
        ix.search_by_aabb(None, &aabb, |ix, hit| self.adult_search(ix, hit));
    }

    fn rescue(&mut self, baby: EntityId) {
        self.presenter.play(Sfx::BabyRescued);
        self.pool.get_mut(baby).flashes_remaining = 0;
        self.set_active(baby, false);
        self.rescues.push(baby);
        self.babies_cnt = self.babies_cnt.saturating_sub(1);
        if let EntityKind::Adult { rescues, holding, .. } = &mut self.pool.get_mut(self.cast.adult).kind {
            *holding = None;
            *rescues += 1;
            debug!("baby rescued, {} so far", rescues);
        }
    }

    /// Start (or restart) flashing an entity `count` times.
    pub(super) fn flash(&mut self, id: EntityId, count: u32) {
        let e = self.pool.get_mut(id);
        if !e.flashing {
            e.flashing = true;
            self.flashers_on.push(id);
        }
        e.flashes_remaining = count;
    }

    /// Alternate flashing entities between dimmed and opaque.
    fn flash_step(&mut self) {
        let mut new_off = Vec::new();
        for id in std::mem::take(&mut self.flashers_on) {
            let e = self.pool.get_mut(id);
            if e.flashes_remaining == 0 {
                e.flashing = false;
                continue;
            }
            e.flashes_remaining -= 1;
            self.presenter.set_alpha(e.visual, self.cfg.flash_alpha);
            new_off.push(id);
        }

        let new_on = std::mem::replace(&mut self.flashers_off, new_off);
        for &id in &new_on {
            self.presenter.set_alpha(self.pool.get(id).visual, 1.0);
        }
        self.flashers_on = new_on;
    }

    /// Top the nursery back up, checking each newcomer for an instant infection.
    fn refill_babies(&mut self, ix: &mut Ix) {
        let missing = self.cfg.num_babies.saturating_sub(self.babies_cnt);
        for _ in 0..missing {
            let Some(baby) = self.new_baby(ix) else {
                trace!("entity pool full, nursery short by {}", self.cfg.num_babies - self.babies_cnt);
                break;
            };
            let aabb = self.pool.get(baby).aabb;
            let contacts = ix.search_by_aabb(None, &aabb, |ix, hit| self.baby_search(ix, baby, hit));
            if contacts > 0 && !self.pool.get(baby).is_hatted() {
                self.infect_baby(baby);
            } else {
                self.babies_cnt += 1;
            }
        }
    }

    /// End-of-tick check: an infected adult loses, a full hoard wins.
    fn settle(&mut self) {
        if self.phase.is_over() {
            return;
        }
        let infected = matches!(self.pool.get(self.cast.adult).kind, EntityKind::Adult { infected: true, .. });
        if infected {
            info!("game over: adult infected");
            self.set_phase(GamePhase::Over);
        } else if self.teepee_cnt >= self.cfg.win_threshold {
            info!("game won: {} teepee hoarded", self.teepee_cnt);
            self.set_phase(GamePhase::OverWinning);
        }
    }
}
