//! Contracts for the presentation collaborators (render nodes, audio) plus a
//! do-nothing and a logging implementation.

use std::collections::HashMap;

use glam::{Mat4, Vec2};
use log::{debug, info, trace};

use crate::cache::ResourceCache;

/// Which art an entity is drawn with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Adult,
    AdultMasked,
    AdultInfected,
    Baby,
    BabyHatted,
    BabyInfected,
    Virus,
    Tv,
    Mask,
    Teepee,
    TeepeeIcon,
}

impl VisualKind {
    /// Texture asset and its alpha mask.
    pub fn asset(self) -> (&'static str, &'static str) {
        match self {
            VisualKind::Adult => ("assets/adult.ans", "assets/adult.mask.ans"),
            VisualKind::AdultMasked => ("assets/adult-masked.ans", "assets/adult-masked.mask.ans"),
            VisualKind::Baby => ("assets/baby.ans", "assets/baby.mask.ans"),
            VisualKind::BabyHatted => ("assets/baby-hatted.ans", "assets/baby-hatted.mask.ans"),
            // infected things all wear the virus art
            VisualKind::AdultInfected | VisualKind::BabyInfected | VisualKind::Virus => {
                ("assets/virus.ans", "assets/virus.mask.ans")
            }
            VisualKind::Tv => ("assets/tv.ans", "assets/tv.mask.ans"),
            VisualKind::Mask => ("assets/mask.ans", "assets/mask.mask.ans"),
            VisualKind::Teepee | VisualKind::TeepeeIcon => ("assets/teepee.ans", "assets/teepee.mask.ans"),
        }
    }
}

/// Handle to a visual node owned by the presenter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VisualId(pub u32);

/// Handle to a floating bonus counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BonusId(pub u32);

/// Sound cues. Fire and forget.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Sfx {
    BabyInfected,
    BabyHatted,
    BabyHeld,
    BabyRescued,
    AdultArmsFull,
    AdultInfected,
    AdultCaptivated,
    AdultMaskHit,
    AdultMine,
    AdultUnmasked,
    TvTalk(u8),
}

/// Everything the game model asks of the render and audio layers.
pub trait Presenter {
    /// Create a node for an entity, initially inactive.
    fn create_visual(&mut self, kind: VisualKind, layer: u32) -> VisualId;
    /// Swap the art on an existing node, keeping its transform and activity.
    fn replace_visual(&mut self, visual: VisualId, kind: VisualKind);
    fn set_active(&mut self, visual: VisualId, active: bool);
    fn set_alpha(&mut self, visual: VisualId, alpha: f32);
    fn set_transform(&mut self, visual: VisualId, model_x: &Mat4);

    fn play(&mut self, sfx: Sfx);
    fn show_score(&mut self, score: u32);

    /// Attach a counter showing `quantity` to a pickup.
    fn spawn_bonus(&mut self, quantity: u32, at: Vec2) -> BonusId;
    /// Detach the counter at `at` and let it float away over `frames` frames.
    fn release_bonus(&mut self, bonus: BonusId, at: Vec2, frames: u32);
    fn move_bonus(&mut self, bonus: BonusId, at: Vec2);

    /// Drop every node, called when a new game starts.
    fn clear(&mut self);
}

/// Presenter that draws and plays nothing.
#[derive(Debug, Default)]
pub struct NullPresenter {
    next: u32,
}

impl Presenter for NullPresenter {
    fn create_visual(&mut self, _kind: VisualKind, _layer: u32) -> VisualId {
        self.next += 1;
        VisualId(self.next)
    }
    fn replace_visual(&mut self, _visual: VisualId, _kind: VisualKind) {}
    fn set_active(&mut self, _visual: VisualId, _active: bool) {}
    fn set_alpha(&mut self, _visual: VisualId, _alpha: f32) {}
    fn set_transform(&mut self, _visual: VisualId, _model_x: &Mat4) {}
    fn play(&mut self, _sfx: Sfx) {}
    fn show_score(&mut self, _score: u32) {}
    fn spawn_bonus(&mut self, _quantity: u32, _at: Vec2) -> BonusId {
        self.next += 1;
        BonusId(self.next)
    }
    fn release_bonus(&mut self, _bonus: BonusId, _at: Vec2, _frames: u32) {}
    fn move_bonus(&mut self, _bonus: BonusId, _at: Vec2) {}
    fn clear(&mut self) {}
}

/// Node state as last set through the presenter.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    pub kind: VisualKind,
    pub layer: u32,
    pub active: bool,
    pub alpha: f32,
    pub model_x: Mat4,
}

/// Texture descriptor cached per asset.
#[derive(Debug)]
pub struct TextureRef {
    pub path: &'static str,
    pub mask: &'static str,
}

/// Headless presenter: keeps node state in memory, records cues, and logs
/// everything. Useful for demos and for asserting what the game asked for.
pub struct LogPresenter {
    textures: ResourceCache<&'static str, TextureRef>,
    visuals: HashMap<VisualId, VisualState>,
    next: u32,
    pub sounds: Vec<Sfx>,
    pub scores: Vec<u32>,
}

impl Default for LogPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogPresenter {
    pub fn new() -> Self {
        Self {
            textures: ResourceCache::new("texture"),
            visuals: HashMap::new(),
            next: 0,
            sounds: Vec::new(),
            scores: Vec::new(),
        }
    }

    pub fn visual(&self, id: VisualId) -> Option<&VisualState> {
        self.visuals.get(&id)
    }

    /// Active nodes of the given kind.
    pub fn count_active(&self, kind: VisualKind) -> usize {
        self.visuals.values().filter(|v| v.active && v.kind == kind).count()
    }

    pub fn textures_loaded(&self) -> usize {
        self.textures.len()
    }

    fn texture(&mut self, kind: VisualKind) {
        let (path, mask) = kind.asset();
        // Descriptors can't fail to "load" headlessly
        let _ = self.textures.get_or_load(path, |&path| Ok::<_, ()>(TextureRef { path, mask }));
    }
}

impl Presenter for LogPresenter {
    fn create_visual(&mut self, kind: VisualKind, layer: u32) -> VisualId {
        self.texture(kind);
        self.next += 1;
        let id = VisualId(self.next);
        self.visuals.insert(
            id,
            VisualState { kind, layer, active: false, alpha: 1.0, model_x: Mat4::IDENTITY },
        );
        trace!("visual {:?}: new {:?} on layer {}", id, kind, layer);
        id
    }

    fn replace_visual(&mut self, visual: VisualId, kind: VisualKind) {
        self.texture(kind);
        if let Some(v) = self.visuals.get_mut(&visual) {
            debug!("visual {:?}: {:?} -> {:?}", visual, v.kind, kind);
            v.kind = kind;
        }
    }

    fn set_active(&mut self, visual: VisualId, active: bool) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.active = active;
        }
    }

    fn set_alpha(&mut self, visual: VisualId, alpha: f32) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.alpha = alpha;
        }
    }

    fn set_transform(&mut self, visual: VisualId, model_x: &Mat4) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.model_x = *model_x;
        }
    }

    fn play(&mut self, sfx: Sfx) {
        debug!("sfx {:?}", sfx);
        self.sounds.push(sfx);
    }

    fn show_score(&mut self, score: u32) {
        info!("score: {}", score);
        self.scores.push(score);
    }

    fn spawn_bonus(&mut self, quantity: u32, at: Vec2) -> BonusId {
        self.next += 1;
        trace!("bonus {} x{} at {:?}", self.next, quantity, at);
        BonusId(self.next)
    }

    fn release_bonus(&mut self, bonus: BonusId, at: Vec2, frames: u32) {
        trace!("bonus {:?} released at {:?} for {} frame(s)", bonus, at, frames);
    }

    fn move_bonus(&mut self, _bonus: BonusId, _at: Vec2) {}

    fn clear(&mut self) {
        debug!("clearing {} visual(s)", self.visuals.len());
        self.visuals.clear();
    }
}

impl Drop for LogPresenter {
    fn drop(&mut self) {
        self.textures.teardown();
    }
}
