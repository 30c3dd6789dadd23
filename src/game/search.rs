//! Search visitors: what happens when one entity's box turns up another.
//!
//! Each visitor reads the candidate's kind from the pool at visit time, so an
//! entity converted earlier in the same tick is handled under its new kind.

use crate::api::SpatialIndexApi;
use crate::index::SpatialIndex;
use crate::present::{Presenter, Sfx, VisualKind};
use crate::types::{SearchHit, SearchVerdict};

use super::{EntityId, EntityKind, Sim};

use SearchVerdict::*;

type Ix = SpatialIndex<EntityId>;

impl<V: Presenter> Sim<V> {
    /// An active virus (roaming, or a fresh infection) looking for victims.
    pub(super) fn virus_search(&mut self, ix: &mut Ix, virus: EntityId, hit: &SearchHit<EntityId>) -> SearchVerdict {
        let id = hit.payload;
        let (kind, active) = self.kind_of(id);
        match kind {
            EntityKind::Baby { hatted } => {
                // Rescued babies linger inactive until respawned
                if !active || hatted {
                    return MoreMiss;
                }
                self.infect_baby(id);
                self.babies_cnt = self.babies_cnt.saturating_sub(1);
                MoreHit
            }
            EntityKind::Adult { masked, .. } if masked > 0 => {
                self.absorb_virus(ix, virus);
                StopMiss
            }
            EntityKind::Adult { .. } => {
                self.infect_adult();
                StopHit
            }
            _ => MoreMiss,
        }
    }

    /// The adult bumping into things after a move.
    pub(super) fn adult_search(&mut self, ix: &mut Ix, hit: &SearchHit<EntityId>) -> SearchVerdict {
        let id = hit.payload;
        let adult = self.cast.adult;
        let (kind, active) = self.kind_of(id);
        match kind {
            EntityKind::Baby { .. } => {
                if !active {
                    return MoreMiss;
                }
                let EntityKind::Adult { holding, .. } = &mut self.pool.get_mut(adult).kind else {
                    return MoreMiss;
                };
                match *holding {
                    None => {
                        *holding = Some(id);
                        self.presenter.play(Sfx::BabyHeld);
                        StopHit
                    }
                    // Arms are full; keep looking past the carried baby
                    Some(_) => MoreMiss,
                }
            }
            EntityKind::Adult { .. } => MoreMiss,
            EntityKind::Virus { .. } => {
                if !active {
                    return MoreMiss;
                }
                if self.masked() > 0 {
                    self.absorb_virus(ix, id);
                    return MoreMiss;
                }
                self.infect_adult();
                StopHit
            }
            EntityKind::Tv => {
                if !active {
                    return MoreMiss;
                }
                if let EntityKind::Adult { captivated, .. } = &mut self.pool.get_mut(adult).kind {
                    *captivated = true;
                }
                self.presenter.play(Sfx::AdultCaptivated);
                StopHit
            }
            EntityKind::Mask => {
                if active {
                    self.mask_adult();
                }
                MoreMiss
            }
            EntityKind::Teepee { .. } if active => {
                self.more_teepee();
                MoreHit
            }
            EntityKind::Teepee { .. } => MoreMiss,
        }
    }

    /// The falling mask landing on someone.
    pub(super) fn mask_search(&mut self, hit: &SearchHit<EntityId>) -> SearchVerdict {
        let id = hit.payload;
        let (kind, active) = self.kind_of(id);
        match kind {
            EntityKind::Baby { .. } => {
                if !active {
                    return MoreMiss;
                }
                if self.is_active(self.cast.mask) {
                    self.hat_baby(id);
                }
                StopHit
            }
            EntityKind::Adult { .. } => {
                if self.is_active(self.cast.mask) {
                    self.mask_adult();
                }
                StopHit
            }
            _ => MoreMiss,
        }
    }

    /// The falling teepee landing on the adult.
    pub(super) fn teepee_search(&mut self, hit: &SearchHit<EntityId>) -> SearchVerdict {
        match self.pool.get(hit.payload).kind {
            EntityKind::Adult { .. } => {
                if self.is_active(self.cast.teepee) {
                    self.more_teepee();
                }
                StopHit
            }
            _ => MoreMiss,
        }
    }

    /// The TV pulling nearby babies in. Each pulled baby searches again from
    /// its new spot, one level deeper.
    pub(super) fn tv_search(&mut self, ix: &mut Ix, hit: &SearchHit<EntityId>) -> SearchVerdict {
        let baby = hit.payload;
        let e = self.pool.get(baby);
        if !e.is_baby() || !e.active || self.holding() == Some(baby) {
            return MoreMiss;
        }

        let delta = self.pool.get(self.cast.tv).position - e.position;
        let distance = delta.length();
        // Sitting on the TV has no pull direction
        if distance <= f32::EPSILON || distance < self.cfg.tv_range_min || distance > self.cfg.tv_range_max {
            return MoreMiss;
        }

        let pull = delta / distance * self.cfg.tv_attraction;
        self.pool.get_mut(baby).position += pull;
        self.update_x(ix, baby);

        let aabb = self.pool.get(baby).aabb;
        let contacts = ix.search_by_aabb(None, &aabb, |ix, hit| self.baby_search(ix, baby, hit));
        if contacts > 0 && !self.pool.get(baby).is_hatted() {
            self.infect_baby(baby);
            self.babies_cnt = self.babies_cnt.saturating_sub(1);
        }
        MoreHit
    }

    /// A baby that just moved or appeared, checking what it landed on. Hits
    /// count active viruses; masks are put on along the way.
    pub(super) fn baby_search(&mut self, _ix: &mut Ix, baby: EntityId, hit: &SearchHit<EntityId>) -> SearchVerdict {
        let (kind, active) = self.kind_of(hit.payload);
        match kind {
            EntityKind::Virus { .. } if active => {
                if self.pool.get(baby).is_hatted() {
                    MoreMiss
                } else {
                    StopHit
                }
            }
            EntityKind::Mask if active => {
                self.hat_baby(baby);
                MoreMiss
            }
            _ => MoreMiss,
        }
    }
}

// Outcomes shared by the visitors above.
impl<V: Presenter> Sim<V> {
    pub(super) fn kind_of(&self, id: EntityId) -> (EntityKind, bool) {
        let e = self.pool.get(id);
        (e.kind, e.active)
    }

    pub(super) fn holding(&self) -> Option<EntityId> {
        match self.pool.get(self.cast.adult).kind {
            EntityKind::Adult { holding, .. } => holding,
            _ => None,
        }
    }

    pub(super) fn masked(&self) -> u32 {
        match self.pool.get(self.cast.adult).kind {
            EntityKind::Adult { masked, .. } => masked,
            _ => 0,
        }
    }

    /// Baby becomes a stationary virus and is queued to spread next.
    pub(super) fn infect_baby(&mut self, baby: EntityId) {
        let e = self.pool.get_mut(baby);
        if !e.infect() {
            return;
        }
        self.presenter.replace_visual(e.visual, VisualKind::BabyInfected);
        self.presenter.play(Sfx::BabyInfected);
        self.pending.push_back(baby);

        // The adult lets go of an infected baby
        if let EntityKind::Adult { holding, .. } = &mut self.pool.get_mut(self.cast.adult).kind {
            if *holding == Some(baby) {
                *holding = None;
            }
        }
    }

    /// Game over: the adult caught it, and so did whoever it was carrying.
    pub(super) fn infect_adult(&mut self) {
        let adult = self.pool.get_mut(self.cast.adult);
        if !adult.infect_adult() {
            return;
        }
        self.presenter.replace_visual(adult.visual, VisualKind::AdultInfected);
        self.presenter.play(Sfx::AdultInfected);
        if let Some(held) = self.holding() {
            let visual = self.pool.get(held).visual;
            self.presenter.replace_visual(visual, VisualKind::BabyInfected);
            self.presenter.play(Sfx::BabyInfected);
        }
    }

    /// The mask eats one virus hit: one charge per contact, and the virus is
    /// taken out of play immediately so it can't hit again this tick.
    pub(super) fn absorb_virus(&mut self, ix: &mut Ix, virus: EntityId) {
        let adult = self.cast.adult;
        let EntityKind::Adult { masked, .. } = &mut self.pool.get_mut(adult).kind else {
            return;
        };
        *masked = masked.saturating_sub(1);
        let unmasked = *masked == 0;

        self.presenter.play(Sfx::AdultMaskHit);
        if unmasked {
            let visual = self.pool.get(adult).visual;
            self.presenter.replace_visual(visual, VisualKind::Adult);
            self.presenter.play(Sfx::AdultUnmasked);
        }
        self.flash(adult, self.cfg.flashes_on_mask_hit);
        self.reset_virus(ix, virus);
    }

    pub(super) fn mask_adult(&mut self) {
        let adult = self.pool.get_mut(self.cast.adult);
        if let EntityKind::Adult { masked, .. } = &mut adult.kind {
            *masked += self.cfg.mask_protection;
        }
        self.presenter.replace_visual(adult.visual, VisualKind::AdultMasked);
        self.presenter.play(Sfx::AdultMine);
        self.set_active(self.cast.mask, false);
    }

    pub(super) fn hat_baby(&mut self, baby: EntityId) {
        let e = self.pool.get_mut(baby);
        if e.hat() {
            self.presenter.replace_visual(e.visual, VisualKind::BabyHatted);
            self.presenter.play(Sfx::BabyHatted);
        }
        self.set_active(self.cast.mask, false);
    }

    /// Pick up the teepee, unless the adult's arms are full.
    pub(super) fn more_teepee(&mut self) {
        let teepee = self.cast.teepee;
        if let Some(held) = self.holding() {
            let flashes = self.cfg.flashes_on_refused_pickup;
            self.flash(teepee, flashes);
            self.flash(held, flashes);
            self.presenter.play(Sfx::AdultArmsFull);
            return;
        }

        let e = self.pool.get_mut(teepee);
        let at = e.position;
        let (quantity, bonus) = match &mut e.kind {
            EntityKind::Teepee { quantity, bonus } => (*quantity, bonus.take()),
            _ => return,
        };
        for _ in 0..quantity {
            self.add_icon();
        }
        self.teepee_cnt += quantity;
        if let Some(bonus) = bonus {
            self.presenter.release_bonus(bonus, at, self.cfg.bonus_release_frames);
        }
        self.presenter.play(Sfx::AdultMine);
        self.set_active(teepee, false);
    }
}
