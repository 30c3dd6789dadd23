//! sars: grid spatial index with reentrant AABB searches, and the entity
//! model of a small arcade game built on it

pub mod bounds;
pub mod types;
pub mod api;
pub mod index;
pub mod error;
pub mod config;
pub mod cache;
pub mod present;
pub mod input;
pub mod game;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::bounds::{Aabb2, Aabb3};
pub use crate::index::SpatialIndex;
pub use crate::error::{ConfigError, Error, IndexError};
pub use crate::config::GameConfig;
pub use crate::game::{Dispatch, Game, GamePhase};
