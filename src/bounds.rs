use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in the play plane. `min <= max` on both axes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

/// Axis-aligned box in model space. Only used as the reference shape that
/// entity transforms are applied to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb2 {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box of half extents `half` centered on `center`.
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self { min: center - half, max: center + half }
    }

    /// Linearly interpolate both corners from `a` to `b` by `t`.
    pub fn lerp(a: &Aabb2, b: &Aabb2, t: f32) -> Self {
        Self { min: a.min.lerp(b.min, t), max: a.max.lerp(b.max, t) }
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn translate(&self, by: Vec2) -> Self {
        Self { min: self.min + by, max: self.max + by }
    }

    /// Inclusive overlap: boxes sharing only an edge still overlap.
    pub fn overlaps(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl Aabb3 {
    /// Every entity starts out as this cube and gets transformed into place.
    pub const UNIT: Aabb3 = Aabb3 { min: Vec3::NEG_ONE, max: Vec3::ONE };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn lerp(a: &Aabb3, b: &Aabb3, t: f32) -> Self {
        Self { min: a.min.lerp(b.min, t), max: a.max.lerp(b.max, t) }
    }

    /// Drop the Z extents.
    pub fn to_aabb2(&self) -> Aabb2 {
        Aabb2 { min: self.min.truncate(), max: self.max.truncate() }
    }

    fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
        ]
    }
}

/// Transform all eight corners and reduce to the enclosing box. Unlike
/// transforming just `min`/`max` this stays correct under rotation.
pub fn transform_aabb3(transform: &Mat4, aabb: &Aabb3) -> Aabb3 {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(-f32::MAX);
    for corner in aabb.corners() {
        let p = transform.transform_point3(corner);
        min = min.min(p);
        max = max.max(p);
    }
    Aabb3 { min, max }
}

/// [`transform_aabb3`] followed by dropping Z.
pub fn transform_aabb3_to_aabb2(transform: &Mat4, aabb: &Aabb3) -> Aabb2 {
    transform_aabb3(transform, aabb).to_aabb2()
}

/// Translate-then-scale model transform, the order entities are built in.
pub fn model_transform(position: Vec2, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position.extend(0.0)) * Mat4::from_scale(scale)
}
