use glam::{Mat4, Vec2, Vec3};

use crate::bounds::Aabb2;
use crate::present::{BonusId, VisualId};
use crate::types::ObjectId;

/// Index of an entity in the session's pool. Valid until the game resets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub(crate) u32);

/// Per-kind state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EntityKind {
    Adult {
        rescues: u32,
        /// Virus hits the adult can still absorb.
        masked: u32,
        /// Touching the TV; input is ignored until the TV switches off.
        captivated: bool,
        holding: Option<EntityId>,
        infected: bool,
    },
    Baby {
        /// Hatted babies shrug off viruses.
        hatted: bool,
    },
    Virus {
        /// Roaming viruses drift across the screen; infected babies don't.
        roaming: bool,
    },
    Tv,
    Mask,
    Teepee {
        quantity: u32,
        bonus: Option<BonusId>,
    },
}

/// Shared entity header plus its kind.
#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub visual: VisualId,
    pub(crate) handle: Option<ObjectId>,
    pub position: Vec2,
    pub scale: Vec3,
    pub model_x: Mat4,
    /// Index box as of the last transform update.
    pub aabb: Aabb2,
    pub active: bool,
    pub flashing: bool,
    pub flashes_remaining: u32,
}

impl Entity {
    pub fn new(kind: EntityKind, visual: VisualId, scale: Vec3) -> Self {
        Self {
            kind,
            visual,
            handle: None,
            position: Vec2::ZERO,
            scale,
            model_x: Mat4::IDENTITY,
            aabb: Aabb2::new(Vec2::ZERO, Vec2::ZERO),
            active: false,
            flashing: false,
            flashes_remaining: 0,
        }
    }

    pub fn is_baby(&self) -> bool {
        matches!(self.kind, EntityKind::Baby { .. })
    }

    pub fn is_virus(&self) -> bool {
        matches!(self.kind, EntityKind::Virus { .. })
    }

    pub fn is_hatted(&self) -> bool {
        matches!(self.kind, EntityKind::Baby { hatted: true })
    }

    /// Turn an unhatted baby into a stationary virus. False if it wasn't one.
    pub fn infect(&mut self) -> bool {
        match self.kind {
            EntityKind::Baby { hatted: false } => {
                self.kind = EntityKind::Virus { roaming: false };
                true
            }
            _ => false,
        }
    }

    /// Put a hat on a baby. False if it wasn't a baby.
    pub fn hat(&mut self) -> bool {
        match &mut self.kind {
            EntityKind::Baby { hatted } => {
                *hatted = true;
                true
            }
            _ => false,
        }
    }

    /// Mark the adult infected. False if this isn't the adult.
    pub fn infect_adult(&mut self) -> bool {
        match &mut self.kind {
            EntityKind::Adult { infected, .. } => {
                *infected = true;
                true
            }
            _ => false,
        }
    }
}

/// Fixed-capacity arena. Entities are never freed individually; the whole
/// pool is cleared when a game resets. Callers that allocate mid-round check
/// `is_full` first; `alloc` past capacity is fatal.
#[derive(Debug)]
pub struct Pool {
    entities: Vec<Entity>,
    capacity: usize,
}

impl Pool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entities: Vec::with_capacity(capacity), capacity }
    }

    pub fn alloc(&mut self, entity: Entity) -> EntityId {
        if self.is_full() {
            panic!("entity pool exhausted (capacity {})", self.capacity);
        }
        self.entities.push(entity);
        EntityId((self.entities.len() - 1) as u32)
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().enumerate().map(|(i, e)| (EntityId(i as u32), e))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
