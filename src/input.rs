//! Input mapping: held directional keys, a single tracked finger, and the
//! adult's per-tick movement derived from them.

use glam::Vec2;

/// Directional keys currently held (arrows or WASD, the caller decides).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputState {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// One finger sample in normalized window coordinates (`0..1`, y down).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Finger {
    pub touch_id: i64,
    pub finger_id: i64,
    pub x: f32,
    pub y: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    FingerDown(Finger),
    FingerMotion(Finger),
    FingerUp(Finger),
}

/// Map a normalized window position into play coordinates, y up.
pub fn touch_to_play(x: f32, y: f32, scale: f32) -> Vec2 {
    Vec2::new(x - 0.5, 0.5 - y) * scale
}

/// Follows the first finger to touch down until it lifts; other fingers are
/// ignored meanwhile.
#[derive(Clone, Debug, Default)]
pub struct TouchTracker {
    owner: Option<(i64, i64)>,
    position: Vec2,
}

impl TouchTracker {
    /// Feed a down or motion sample.
    pub fn track(&mut self, finger: &Finger, scale: f32) {
        let id = (finger.touch_id, finger.finger_id);
        if self.owner.is_some_and(|owner| owner != id) {
            return;
        }
        self.owner = Some(id);
        self.position = touch_to_play(finger.x, finger.y, scale);
    }

    pub fn release(&mut self, finger: &Finger) {
        if self.owner == Some((finger.touch_id, finger.finger_id)) {
            self.owner = None;
        }
    }

    /// Where the tracked finger is, in play coordinates.
    pub fn position(&self) -> Option<Vec2> {
        self.owner.map(|_| self.position)
    }

    pub fn clear(&mut self) {
        self.owner = None;
    }
}

/// Movement for one input tick, or `None` when nothing is steering.
///
/// Keys add `speed` per axis; an active touch overrides them and steers
/// toward the finger. The result never exceeds `speed` in length, and a touch
/// closer than `speed` moves exactly onto it.
pub fn movement(keys: &InputState, touch: Option<Vec2>, from: Vec2, speed: f32) -> Option<Vec2> {
    let mut dir = match touch {
        Some(target) => target - from,
        None if keys.any() => {
            let mut dir = Vec2::ZERO;
            if keys.left {
                dir.x -= speed;
            }
            if keys.right {
                dir.x += speed;
            }
            if keys.up {
                dir.y += speed;
            }
            if keys.down {
                dir.y -= speed;
            }
            dir
        }
        None => return None,
    };

    let distance = dir.length();
    if distance > 0.0 {
        dir = dir / distance * distance.min(speed);
    }
    Some(dir)
}
