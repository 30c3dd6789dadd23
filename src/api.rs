use glam::Vec2;

use crate::bounds::Aabb2;
use crate::error::IndexError;
use crate::types::*;

/// Public API contract for the reentrant spatial index.
pub trait SpatialIndexApi<P: Copy> {
    /// Construct an index with the given grid layout.
    fn new(cfg: IndexConfig) -> Result<Self, IndexError>
    where
        Self: Sized;

    // --- Membership --------------------------------------------------------

    /// Insert an object and return its handle. When `origin` is given, `aabb`
    /// is relative to it.
    fn insert(&mut self, origin: Option<Vec2>, aabb: &Aabb2, payload: P) -> ObjectId;

    /// Move an object to a new box, updating only the cells that changed.
    fn move_object(&mut self, id: ObjectId, origin: Option<Vec2>, aabb: &Aabb2) -> ObjectId;

    /// Remove one object. Its handle becomes stale.
    fn remove(&mut self, id: ObjectId) -> P;

    /// Drop every object, keeping the grid itself.
    fn reset(&mut self);

    // --- Queries -----------------------------------------------------------

    /// Visit every object overlapping `aabb` (translated by `origin` if given)
    /// exactly once, until the visitor says stop. The visitor may move objects
    /// or start a nested search through the index it is handed. Returns the
    /// number of hit verdicts.
    fn search_by_aabb<F>(&mut self, origin: Option<Vec2>, aabb: &Aabb2, visit: F) -> usize
    where
        Self: Sized,
        F: FnMut(&mut Self, &SearchHit<P>) -> SearchVerdict;

    /// Current box of a live object.
    fn aabb(&self, id: ObjectId) -> Aabb2;

    /// Payload of a live object.
    fn payload(&self, id: ObjectId) -> P;

    /// Number of live objects.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
