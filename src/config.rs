//! Game tuning. Every field has a default, so a TOML file only needs the
//! values it wants to change.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::IndexConfig;

/// Weighted teepee bundle size. Entries are rolled in order and a later
/// success overrides an earlier one.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeepeeQuantity {
    pub quantity: u32,
    pub chance: f32,
}

/// Whole-game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for spawn randomness; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Entity pool capacity per session. Replacement babies stop spawning
    /// once it is full.
    pub max_entities: usize,

    pub num_viruses: usize,
    pub num_babies: usize,

    pub virus_speed: f32,
    pub adult_speed: f32,
    /// Shared by the mask and teepee pickups.
    pub pickup_speed: f32,

    pub entities_delay_ms: u64,
    pub input_delay_ms: u64,
    pub new_babies_delay_ms: u64,
    pub tv_delay_ms: u64,
    pub over_delay_ms: u64,
    pub flashers_delay_ms: u64,

    /// Per-tick activation probabilities for dormant pickups.
    pub tv_spawn_chance: f32,
    pub mask_spawn_chance: f32,
    pub teepee_spawn_chance: f32,
    pub teepee_quantities: Vec<TeepeeQuantity>,

    pub tv_range_min: f32,
    pub tv_range_max: f32,
    pub tv_attraction: f32,

    /// Virus hits absorbed per mask picked up.
    pub mask_protection: u32,
    /// Hoard size that wins the game.
    pub win_threshold: u32,
    pub score_per_rescue: u32,

    /// The adult cannot leave `[-adult_limit, adult_limit]`.
    pub adult_limit: f32,
    /// Carrying a baby past this on either axis rescues it.
    pub rescue_threshold: f32,
    /// Movers past this are off-screen; spawns happen at its negation.
    pub offscreen: f32,

    pub flash_alpha: f32,
    pub flashes_on_mask_hit: u32,
    pub flashes_on_refused_pickup: u32,
    pub bonus_release_frames: u32,

    /// Touch positions are scaled past the play area so babies can be
    /// carried off the edges.
    pub touch_scale: f32,

    pub scales: ScaleConfig,
    pub index: IndexConfig,
}

/// Per-kind model scales applied to the unit cube.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub adult: Vec3,
    pub baby: Vec3,
    pub virus: Vec3,
    pub mask: Vec3,
    pub teepee: Vec3,
    pub teepee_icon: Vec3,
    pub tv: Vec3,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_entities: 1024,
            num_viruses: 8,
            num_babies: 10,
            virus_speed: 0.01,
            adult_speed: 0.04,
            pickup_speed: 0.02,
            entities_delay_ms: 20,
            input_delay_ms: 20,
            new_babies_delay_ms: 500,
            tv_delay_ms: 3000,
            over_delay_ms: 1000,
            flashers_delay_ms: 75,
            tv_spawn_chance: 0.025,
            mask_spawn_chance: 0.01,
            teepee_spawn_chance: 0.275,
            teepee_quantities: [
                (4, 0.25),
                (6, 0.125),
                (9, 0.06),
                (12, 0.04),
                (18, 0.03),
                (24, 0.02),
                (30, 0.01),
                (36, 0.001),
            ]
            .into_iter()
            .map(|(quantity, chance)| TeepeeQuantity { quantity, chance })
            .collect(),
            tv_range_min: 0.2,
            tv_range_max: 0.7,
            tv_attraction: 0.005,
            mask_protection: 3,
            win_threshold: 256,
            score_per_rescue: 420,
            adult_limit: 1.1,
            rescue_threshold: 1.05,
            offscreen: 1.2,
            flash_alpha: 0.25,
            flashes_on_mask_hit: 4,
            flashes_on_refused_pickup: 5,
            bonus_release_frames: 100,
            touch_scale: 2.4,
            scales: ScaleConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            adult: Vec3::splat(0.07),
            baby: Vec3::splat(0.05),
            virus: Vec3::splat(0.05),
            mask: Vec3::splat(0.07),
            teepee: Vec3::splat(0.07),
            teepee_icon: Vec3::splat(0.06),
            tv: Vec3::splat(0.15),
        }
    }
}

impl GameConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject values the game cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid { field, reason: reason.into() }
        }

        // adult, tv, mask, teepee, the roaming viruses and a full nursery
        let fixed = 4 + self.num_viruses + self.num_babies;
        if self.max_entities < fixed {
            return Err(invalid("max_entities", format!("needs at least {fixed} for the starting entities")));
        }
        for (field, p) in [
            ("tv_spawn_chance", self.tv_spawn_chance),
            ("mask_spawn_chance", self.mask_spawn_chance),
            ("teepee_spawn_chance", self.teepee_spawn_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(field, format!("{p} is not a probability")));
            }
        }
        if self.tv_range_min.is_nan() || self.tv_range_min <= 0.0 {
            return Err(invalid("tv_range_min", "must be positive"));
        }
        if self.tv_range_min > self.tv_range_max {
            return Err(invalid("tv_range_min", "exceeds tv_range_max"));
        }
        if self.rescue_threshold >= self.adult_limit {
            return Err(invalid("rescue_threshold", "must be inside adult_limit or rescues are impossible"));
        }
        if self.win_threshold == 0 {
            return Err(invalid("win_threshold", "must be positive"));
        }
        if self.index.max_searches < 2 {
            return Err(invalid("index.max_searches", "the TV search nests a baby search, needs 2"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_overrides() {
        let cfg = GameConfig::from_toml_str(
            r#"
            seed = 7
            num_babies = 3
            win_threshold = 12

            [index]
            cells_x = 8
            cells_y = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.num_babies, 3);
        assert_eq!(cfg.win_threshold, 12);
        assert_eq!((cfg.index.cells_x, cfg.index.cells_y), (8, 6));
        assert_eq!(cfg.index.max_searches, 2);
        assert_eq!(cfg.num_viruses, 8);
        assert_eq!(cfg.teepee_quantities.len(), 8);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let cfg = GameConfig { seed: Some(3), ..GameConfig::default() };
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(GameConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_validation_errors() {
        let err = GameConfig::from_toml_str("mask_spawn_chance = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "mask_spawn_chance", .. }));
        let err = GameConfig::from_toml_str("rescue_threshold = 2.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "rescue_threshold", .. }));
        for text in ["tv_range_min = 0.0", "tv_range_min = -0.1"] {
            let err = GameConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { field: "tv_range_min", .. }));
        }
        let err = GameConfig::from_toml_str("[index]\nmax_searches = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "index.max_searches", .. }));
        assert!(matches!(GameConfig::from_toml_str("num_babies = \"ten\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::load("/nonexistent/sars.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
