use glam::Vec2;
use log::{debug, trace};

use crate::api::SpatialIndexApi;
use crate::bounds::Aabb2;
use crate::error::IndexError;
use crate::types::*;

/// Extent covered when the config leaves `bounds` unset: the play area.
pub const DEFAULT_BOUNDS: Aabb2 = Aabb2::new(Vec2::NEG_ONE, Vec2::ONE);

/// Uniform-grid spatial index with reentrant searches.
///
/// The grid covers a fixed extent split into `cells_x * cells_y` cells.
/// Boxes reaching past the extent are clamped into the border cells, so they
/// stay searchable; the grid just stops helping out there.
pub struct SpatialIndex<P: Copy> {
    pub cfg: IndexConfig,
    bounds: Aabb2,
    cell_size: Vec2,

    // Grid: row-major cells -> slots of the objects overlapping them
    cells: Vec<Vec<u32>>,

    // Object slab
    slots: Vec<Slot<P>>,
    free: Vec<u32>,
    live: usize,

    // One scratch area per permitted search level
    scratch: Vec<Scratch>,
    depth: usize,
    max_depth_reached: usize,
}

struct Slot<P> {
    generation: u32,
    object: Option<Object<P>>,
}

struct Object<P> {
    aabb: Aabb2,
    payload: P,
    cells: CellRange,
}

/// Inclusive range of cell coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellRange {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl CellRange {
    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    fn iter(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| (x, y)))
    }
}

/// Per-level search state: the candidate snapshot and visited stamps.
#[derive(Default)]
struct Scratch {
    epoch: u32,
    visited: Vec<u32>,
    candidates: Vec<ObjectId>,
}

impl<P: Copy> SpatialIndexApi<P> for SpatialIndex<P> {
    fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        if cfg.cells_x == 0 || cfg.cells_y == 0 {
            return Err(IndexError::NoCells { cells_x: cfg.cells_x, cells_y: cfg.cells_y });
        }
        if cfg.max_searches == 0 {
            return Err(IndexError::NoSearches);
        }
        let bounds = cfg.bounds.unwrap_or(DEFAULT_BOUNDS);
        let finite = bounds.min.is_finite() && bounds.max.is_finite();
        if !finite || bounds.min.x >= bounds.max.x || bounds.min.y >= bounds.max.y {
            return Err(IndexError::InvalidBounds { min: bounds.min, max: bounds.max });
        }

        let cell_size = bounds.size() / Vec2::new(cfg.cells_x as f32, cfg.cells_y as f32);
        let n_cells = cfg.cells_x as usize * cfg.cells_y as usize;
        debug!(
            "spatial index: {}x{} cells of {:?} over {:?}..{:?}, {} search level(s)",
            cfg.cells_x, cfg.cells_y, cell_size, bounds.min, bounds.max, cfg.max_searches
        );
        Ok(Self {
            bounds,
            cell_size,
            cells: vec![Vec::new(); n_cells],
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            scratch: (0..cfg.max_searches).map(|_| Scratch::default()).collect(),
            depth: 0,
            max_depth_reached: 0,
            cfg,
        })
    }

    fn insert(&mut self, origin: Option<Vec2>, aabb: &Aabb2, payload: P) -> ObjectId {
        let aabb = Self::place(origin, aabb);
        let cells = self.cell_range(&aabb);
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot { generation: 0, object: None });
                (self.slots.len() - 1) as u32
            }
        };
        let entry = &mut self.slots[slot as usize];
        entry.object = Some(Object { aabb, payload, cells });
        let id = ObjectId { slot, generation: entry.generation };

        for (x, y) in cells.iter() {
            let c = self.cell_index(x, y);
            self.cells[c].push(slot);
        }
        self.live += 1;
        id
    }

    fn move_object(&mut self, id: ObjectId, origin: Option<Vec2>, aabb: &Aabb2) -> ObjectId {
        let aabb = Self::place(origin, aabb);
        let cells = self.cell_range(&aabb);
        let object = self.object_mut(id);
        let old = object.cells;
        object.aabb = aabb;
        object.cells = cells;

        if old != cells {
            for (x, y) in old.iter().filter(|&(x, y)| !cells.contains(x, y)) {
                let c = self.cell_index(x, y);
                Self::unlink(&mut self.cells[c], id.slot);
            }
            for (x, y) in cells.iter().filter(|&(x, y)| !old.contains(x, y)) {
                let c = self.cell_index(x, y);
                self.cells[c].push(id.slot);
            }
        }
        id
    }

    fn remove(&mut self, id: ObjectId) -> P {
        let object = match self.slots.get_mut(id.slot as usize) {
            Some(slot) if slot.generation == id.generation && slot.object.is_some() => {
                slot.generation = slot.generation.wrapping_add(1);
                slot.object.take()
            }
            _ => None,
        };
        let Some(object) = object else {
            panic!("spatial index: remove of stale or invalid handle {id:?}");
        };
        for (x, y) in object.cells.iter() {
            let c = self.cell_index(x, y);
            Self::unlink(&mut self.cells[c], id.slot);
        }
        self.free.push(id.slot);
        self.live -= 1;
        object.payload
    }

    fn reset(&mut self) {
        assert!(self.depth == 0, "spatial index: reset while {} search(es) active", self.depth);
        for cell in &mut self.cells {
            cell.clear();
        }
        for slot in &mut self.slots {
            if slot.object.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        // Hand slots back lowest-first
        self.free.clear();
        self.free.extend((0..self.slots.len() as u32).rev());
        debug!("spatial index reset, dropped {} object(s)", self.live);
        self.live = 0;
    }

    fn search_by_aabb<F>(&mut self, origin: Option<Vec2>, aabb: &Aabb2, mut visit: F) -> usize
    where
        F: FnMut(&mut Self, &SearchHit<P>) -> SearchVerdict,
    {
        let query = Self::place(origin, aabb);
        let level = self.depth;
        if level >= self.scratch.len() {
            panic!(
                "spatial index: nested search depth {} exceeds max_searches {}",
                level + 1,
                self.scratch.len()
            );
        }
        self.depth += 1;
        self.max_depth_reached = self.max_depth_reached.max(self.depth);

        // Snapshot candidates into this level's scratch before handing `self`
        // to the visitor, which may move objects or search again.
        let mut scratch = std::mem::take(&mut self.scratch[level]);
        self.collect_candidates(&query, &mut scratch);
        trace!(
            "search level {} over {:?}..{:?}: {} candidate(s)",
            level,
            query.min,
            query.max,
            scratch.candidates.len()
        );

        let mut hits = 0;
        for &id in &scratch.candidates {
            // Earlier visits may have moved or removed this object
            let Some(hit) = self.hit_for(id, &query) else { continue };
            let verdict = visit(self, &hit);
            if verdict.is_hit() {
                hits += 1;
            }
            if verdict.is_stop() {
                break;
            }
        }

        scratch.candidates.clear();
        self.scratch[level] = scratch;
        self.depth -= 1;
        hits
    }

    fn aabb(&self, id: ObjectId) -> Aabb2 {
        self.object(id).aabb
    }

    fn payload(&self, id: ObjectId) -> P {
        self.object(id).payload
    }

    fn len(&self) -> usize {
        self.live
    }
}

impl<P: Copy> SpatialIndex<P> {
    fn place(origin: Option<Vec2>, aabb: &Aabb2) -> Aabb2 {
        assert!(aabb.is_valid(), "spatial index: inverted or NaN aabb {aabb:?}");
        match origin {
            Some(origin) => aabb.translate(origin),
            None => *aabb,
        }
    }

    fn cell_of(&self, p: Vec2) -> (u32, u32) {
        let rel = ((p - self.bounds.min) / self.cell_size).floor();
        let cx = rel.x.clamp(0.0, (self.cfg.cells_x - 1) as f32) as u32;
        let cy = rel.y.clamp(0.0, (self.cfg.cells_y - 1) as f32) as u32;
        (cx, cy)
    }

    fn cell_range(&self, aabb: &Aabb2) -> CellRange {
        let (x0, y0) = self.cell_of(aabb.min);
        let (x1, y1) = self.cell_of(aabb.max);
        CellRange { x0, y0, x1, y1 }
    }

    fn cell_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.cfg.cells_x as usize + x as usize
    }

    fn unlink(cell: &mut Vec<u32>, slot: u32) {
        if let Some(pos) = cell.iter().position(|&s| s == slot) {
            cell.swap_remove(pos);
        }
    }

    fn object(&self, id: ObjectId) -> &Object<P> {
        match self.slots.get(id.slot as usize) {
            Some(Slot { generation, object: Some(object) }) if *generation == id.generation => object,
            _ => panic!("spatial index: stale or invalid handle {id:?}"),
        }
    }

    fn object_mut(&mut self, id: ObjectId) -> &mut Object<P> {
        match self.slots.get_mut(id.slot as usize) {
            Some(Slot { generation, object: Some(object) }) if *generation == id.generation => object,
            _ => panic!("spatial index: stale or invalid handle {id:?}"),
        }
    }

    fn collect_candidates(&self, query: &Aabb2, scratch: &mut Scratch) {
        scratch.epoch = scratch.epoch.wrapping_add(1);
        if scratch.epoch == 0 {
            scratch.visited.iter_mut().for_each(|v| *v = 0);
            scratch.epoch = 1;
        }
        if scratch.visited.len() < self.slots.len() {
            scratch.visited.resize(self.slots.len(), 0);
        }
        let epoch = scratch.epoch;
        scratch.candidates.clear();

        for (x, y) in self.cell_range(query).iter() {
            for &slot in &self.cells[self.cell_index(x, y)] {
                let mark = &mut scratch.visited[slot as usize];
                if *mark == epoch {
                    continue;
                }
                *mark = epoch;
                let generation = self.slots[slot as usize].generation;
                scratch.candidates.push(ObjectId { slot, generation });
            }
        }
    }

    fn hit_for(&self, id: ObjectId, query: &Aabb2) -> Option<SearchHit<P>> {
        let slot = self.slots.get(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.as_ref()?;
        if !object.aabb.overlaps(query) {
            return None;
        }
        Some(SearchHit {
            id,
            position: object.aabb.center(),
            aabb: object.aabb,
            payload: object.payload,
        })
    }

    /// Extent the grid covers.
    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }

    /// Number of searches currently in flight.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Return debug stats for the current contents.
    pub fn debug_stats(&self) -> IndexStats {
        IndexStats {
            objects: self.live,
            occupied_cells: self.cells.iter().filter(|c| !c.is_empty()).count(),
            cell_entries: self.cells.iter().map(Vec::len).sum(),
            max_depth_reached: self.max_depth_reached,
        }
    }
}

impl<P: Copy> std::fmt::Debug for SpatialIndex<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("cells_x", &self.cfg.cells_x)
            .field("cells_y", &self.cfg.cells_y)
            .field("bounds", &self.bounds)
            .field("live", &self.live)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
