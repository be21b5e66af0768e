use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// How the road is projected onto the screen
/// - Perspective : horizon line, distance scaling, vanishing point
/// - TopDown     : flat road, horizon at the top edge, unit scale everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    TopDown,
}

/// Arrow key behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyboardMode {
    /// one lane per key press
    #[default]
    EdgeTriggered,
    /// keep stepping lanes while the key is down
    Held,
}

/// How pointer input inside the bottom control region is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerMode {
    #[default]
    TapThirds,
    TapToMove,
    DragToMove,
}

/// Session tuning. Read-only once a `World` is built from it.
///
/// Every field has a default so a partial `config.json` is enough:
/// ```json
/// { "laneCount": 5, "projection": "topDown" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub projection: ProjectionMode,
    pub keyboard_mode: KeyboardMode,
    pub pointer_mode: PointerMode,

    // road
    pub lane_count: usize,
    pub road_width_fraction: f32,
    pub horizon_fraction: f32,
    pub segment_count: usize,
    pub road_scroll_speed: f32,

    // obstacles
    pub obstacle_speed: f32,
    pub obstacle_spawn_interval_ms: f32,
    pub obstacle_size: f32,
    pub despawn_margin: f32,

    // projectiles
    pub projectile_speed: f32,
    pub projectile_size: f32,
    pub fire_rate_ms: f64,

    // player
    pub max_health: u32,
    pub collision_damage: u32,
    pub invulnerability_ms: f32,
    pub lane_change_step: f32,
    pub character_width: f32,
    pub character_height: f32,
    pub character_bottom_offset: f32,
    pub max_bank_angle: f32,

    pub near_miss_distance: f32,
    /// fraction of character height
    pub near_miss_window: f32,
    /// fraction of screen height, measured from the bottom edge
    pub control_region_fraction: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            screen_width: 800.0,
            screen_height: 600.0,
            projection: ProjectionMode::Perspective,
            keyboard_mode: KeyboardMode::EdgeTriggered,
            pointer_mode: PointerMode::TapThirds,
            lane_count: 7,
            road_width_fraction: 0.8,
            horizon_fraction: 0.3,
            segment_count: 20,
            road_scroll_speed: 4.0,
            obstacle_speed: 2.0,
            obstacle_spawn_interval_ms: 1500.0,
            obstacle_size: 50.0,
            despawn_margin: 50.0,
            projectile_speed: 8.0,
            projectile_size: 16.0,
            fire_rate_ms: 300.0,
            max_health: 100,
            collision_damage: 20,
            invulnerability_ms: 1500.0,
            lane_change_step: 0.05,
            character_width: 60.0,
            character_height: 80.0,
            character_bottom_offset: 100.0,
            max_bank_angle: 0.26,
            near_miss_distance: 0.7,
            near_miss_window: 0.5,
            control_region_fraction: 0.25,
        }
    }
}

impl GameConfig {
    pub fn with_screen_size(mut self, width: f32, height: f32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Rejects tunings the core cannot honour. Called once at load time so
    /// the per-frame code never has to.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.screen_width > 0.0 && self.screen_height > 0.0,
            "screen must have a positive size, got {}x{}",
            self.screen_width,
            self.screen_height
        );
        ensure!(self.lane_count > 0, "laneCount must be at least 1");
        ensure!(self.segment_count > 0, "segmentCount must be at least 1");
        ensure!(
            (0.0..1.0).contains(&self.horizon_fraction),
            "horizonFraction must lie in [0, 1), got {}",
            self.horizon_fraction
        );
        ensure!(
            self.road_width_fraction > 0.0 && self.road_width_fraction <= 1.0,
            "roadWidthFraction must lie in (0, 1], got {}",
            self.road_width_fraction
        );
        ensure!(
            self.lane_change_step > 0.0,
            "laneChangeStep must be positive, got {}",
            self.lane_change_step
        );
        Ok(())
    }

    /// Screen y of the player's centre
    pub fn player_y(&self) -> f32 {
        self.screen_height - self.character_bottom_offset
    }

    /// Screen y above which a pointer is outside the control region
    pub fn control_region_top(&self) -> f32 {
        self.screen_height * (1.0 - self.control_region_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_lanes() {
        let config = GameConfig {
            lane_count: 0,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("laneCount"));
    }

    #[test]
    fn rejects_horizon_at_screen_bottom() {
        let config = GameConfig {
            horizon_fraction: 1.0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_road_width() {
        let config = GameConfig {
            road_width_fraction: 0.0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_stalled_lane_change() {
        let config = GameConfig {
            lane_change_step: 0.0,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("laneChangeStep"));
    }

    #[test]
    fn control_region_is_bottom_quarter() {
        let config = GameConfig::default();
        assert_eq!(config.control_region_top(), 450.0);
        assert_eq!(config.player_y(), 500.0);
    }

    #[test]
    fn screen_size_override_keeps_tuning() {
        let config = GameConfig::default().with_screen_size(1024.0, 768.0);
        assert_eq!(config.screen_width, 1024.0);
        assert_eq!(config.screen_height, 768.0);
        assert_eq!(config.lane_count, 7);
    }
}
