use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb2;

/// Verdict a search visitor returns for each candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchVerdict {
    /// Keep going; this candidate was not a match.
    MoreMiss,
    /// Keep going; count this candidate as a hit.
    MoreHit,
    /// Stop now without counting a hit.
    StopMiss,
    /// Stop now and count a hit.
    StopHit,
}

impl SearchVerdict {
    pub fn is_hit(self) -> bool {
        matches!(self, SearchVerdict::MoreHit | SearchVerdict::StopHit)
    }

    pub fn is_stop(self) -> bool {
        matches!(self, SearchVerdict::StopMiss | SearchVerdict::StopHit)
    }
}

/// Handle to an object stored in the index. Stale once the object is removed
/// or the index is reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

/// What a search visitor sees for one candidate.
#[derive(Copy, Clone, Debug)]
pub struct SearchHit<P> {
    pub id: ObjectId,
    /// Center of the object's box.
    pub position: Vec2,
    pub aabb: Aabb2,
    pub payload: P,
}

/// Grid layout for a spatial index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// World extent covered by the grid; `None` covers the `[-1, 1]` play area.
    pub bounds: Option<Aabb2>,
    pub cells_x: u32,
    pub cells_y: u32,
    /// How many searches may be in flight at once (outer search plus nested ones).
    pub max_searches: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            cells_x: 4,
            cells_y: 4,
            // TV search nests a baby search
            max_searches: 2,
        }
    }
}

/// Debug statistics for the current index contents.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub objects: usize,
    /// Cells holding at least one object.
    pub occupied_cells: usize,
    /// Sum of per-cell object counts; exceeds `objects` when boxes span cells.
    pub cell_entries: usize,
    /// Deepest nesting reached by any search since construction.
    pub max_depth_reached: usize,
}
