//! Bubble configuration
//!
//! Read from TOML. Every field has a default, so an empty file (or no file)
//! yields the stock bubble: 56dp circle, physics release, nearest-edge snap
//! and the five-slot recorder menu.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bubble::DisplayMode;
use crate::error::ConfigError;
use crate::menu::{default_menu_items, MenuItem};
use crate::snap::MoveDirection;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// Edge length of the square bubble surface
    pub bubble_size_dp: f64,
    /// Pointer travel that turns a press into a drag
    pub touch_slop_dp: f64,
    /// Weight of the newest sample in the release velocity (0..=1)
    pub velocity_smoothing: f64,
    /// Inertial release instead of a discrete snap
    pub use_physics: bool,
    pub move_direction: MoveDirection,
    pub display_mode: DisplayMode,
    /// Animate onto the edge when first attached
    pub animate_initial_move: bool,
    pub initial: InitialPlacement,
    pub physics: PhysicsConfig,
    pub trash: TrashConfig,
    pub menu: MenuConfig,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            bubble_size_dp: 56.0,
            touch_slop_dp: 8.0,
            velocity_smoothing: 0.6,
            use_physics: true,
            move_direction: MoveDirection::Nearest,
            display_mode: DisplayMode::ShowAlways,
            animate_initial_move: true,
            initial: InitialPlacement::default(),
            physics: PhysicsConfig::default(),
            trash: TrashConfig::default(),
            menu: MenuConfig::default(),
        }
    }
}

/// Where the bubble appears before its first snap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPlacement {
    /// Absolute x, defaults to the right screen edge
    pub x: Option<i32>,
    /// Vertical position as a fraction of screen height
    pub y_fraction: f64,
}

impl Default for InitialPlacement {
    fn default() -> Self {
        Self { x: None, y_fraction: 0.6 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Exponential velocity decay per second
    pub damping: f64,
    /// Speed (px/s) below which inertia stops
    pub stop_speed: f64,
    /// Horizontal speed (px/s) that counts as a throw for `MoveDirection::Thrown`.
    /// Applies to the discrete snap as well.
    pub fling_speed: f64,
    /// Length of the ease onto the edge once inertia stops
    pub settle_ms: u64,
    pub bounce_amplitude: f64,
    pub bounce_frequency: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            damping: 6.0,
            stop_speed: 40.0,
            fling_speed: 600.0,
            settle_ms: 350,
            bounce_amplitude: 0.1,
            bounce_frequency: 0.8,
        }
    }
}

impl PhysicsConfig {
    pub fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Inertia only ends if the velocity decays and the stop speed is reachable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damping.is_nan() || self.damping <= 0.0 {
            return Err(ConfigError::InvalidPhysics(format!("damping must be positive, got {}", self.damping)));
        }
        if self.stop_speed.is_nan() || self.stop_speed <= 0.0 {
            return Err(ConfigError::InvalidPhysics(format!(
                "stop_speed must be positive, got {}",
                self.stop_speed
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrashConfig {
    /// A disabled trash is never shown and never deletes
    pub enabled: bool,
    pub size_dp: f64,
    /// Gap between the trash target and the bottom of the screen
    pub bottom_margin_dp: f64,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_dp: 72.0,
            bottom_margin_dp: 48.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub item_size_dp: f64,
    /// Gap between the toggle and the menu bar (px)
    pub margin: i32,
    pub animation_ms: u64,
    /// Delay of the item animation relative to the main button
    pub start_delay_ms: u64,
    pub items: Vec<MenuItemDef>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            item_size_dp: 48.0,
            margin: 20,
            animation_ms: 500,
            start_delay_ms: 150,
            items: default_menu_items()
                .into_iter()
                .map(|item| MenuItemDef {
                    id: item.id,
                    icon: item.icon,
                    checked: item.checked,
                })
                .collect(),
        }
    }
}

impl MenuConfig {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    /// Resolve the declared items into their fixed slot order
    pub fn menu_items(&self) -> Result<Vec<MenuItem>, ConfigError> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .enumerate()
            .map(|(order, def)| {
                if def.id.trim().is_empty() {
                    return Err(ConfigError::InvalidMenu(format!("item {} has an empty id", order)));
                }
                if !seen.insert(def.id.as_str()) {
                    return Err(ConfigError::InvalidMenu(format!("duplicate item id {:?}", def.id)));
                }
                let mut item = MenuItem::new(def.id.clone(), def.icon.clone(), order);
                item.checked = def.checked;
                Ok(item)
            })
            .collect()
    }
}

/// One `[[menu.items]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemDef {
    pub id: String,
    pub icon: String,
    #[serde(default)]
    pub checked: bool,
}

impl BubbleConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        // Surface menu mistakes at load time rather than on first expand
        config.menu.menu_items()?;
        config.physics.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded bubble config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BubbleConfig::from_toml_str("").unwrap();
        assert_eq!(config.bubble_size_dp, 56.0);
        assert!(config.use_physics);
        assert_eq!(config.move_direction, MoveDirection::Nearest);
        assert_eq!(config.menu.menu_items().unwrap().len(), 5);
    }

    #[test]
    fn test_partial_override() {
        let config = BubbleConfig::from_toml_str(
            r#"
            use_physics = false
            move_direction = "thrown"

            [physics]
            damping = 3.5

            [menu]
            margin = 12

            [[menu.items]]
            id = "item_home"
            icon = "ic_home"

            [[menu.items]]
            id = "item_tool"
            icon = "ic_tool"
            checked = true
            "#,
        )
        .unwrap();

        assert!(!config.use_physics);
        assert_eq!(config.move_direction, MoveDirection::Thrown);
        assert_eq!(config.physics.damping, 3.5);
        assert_eq!(config.physics.stop_speed, 40.0);
        assert_eq!(config.menu.margin, 12);

        let items = config.menu.menu_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].order, 1);
        assert!(items[1].checked);
    }

    #[test]
    fn test_duplicate_menu_ids_rejected() {
        let err = BubbleConfig::from_toml_str(
            r#"
            [[menu.items]]
            id = "item_home"
            icon = "a"

            [[menu.items]]
            id = "item_home"
            icon = "b"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMenu(_)));
    }

    #[test]
    fn test_non_positive_stop_speed_rejected() {
        let err = BubbleConfig::from_toml_str("[physics]\nstop_speed = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPhysics(_)));

        let err = BubbleConfig::from_toml_str("[physics]\ndamping = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPhysics(_)));
    }

    #[test]
    fn test_trash_and_display_mode_keys() {
        let config = BubbleConfig::from_toml_str(
            r#"
            display_mode = "hide_always"

            [trash]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.display_mode, DisplayMode::HideAlways);
        assert!(!config.trash.enabled);
        assert_eq!(config.trash.size_dp, 72.0);
    }

    #[test]
    fn test_parse_error_reported() {
        let err = BubbleConfig::from_toml_str("bubble_size_dp = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
