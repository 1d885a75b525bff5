use crate::engine::{Point, Size};
use crate::level::TILE_SIZE;
use anyhow::{anyhow, Result};

/// Where the game fetches its assets from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    /// tile grid produced by `make-level`
    pub level_url: String,
    /// sprite name -> [x, y, width, height] inside the atlas image
    pub atlas_url: String,
    pub atlas_image: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        AssetPaths {
            level_url: "https://herebeseaswines.net/tiny-space-game/level.json".into(),
            atlas_url: "https://herebeseaswines.net/tiny-space-game/image-data.json".into(),
            atlas_image: "assets/graphics.png".into(),
        }
    }
}

/// Tunables of a game session, `GameConfig::default()` is what ships
///
/// Fields are public, `validate` checks what the game relies on :
/// - `tile_size`, ship and canvas sizes are positive
/// - `1 <= min_speed <= start_speed <= max_speed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub tile_size: i32,
    /// collision box of the ship, larger than the drawn sprite
    pub ship_size: Size,
    pub start_position: Point,
    pub start_speed: i32,
    pub min_speed: i32,
    pub max_speed: i32,
    pub canvas: Size,
    pub assets: AssetPaths,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            tile_size: TILE_SIZE as i32,
            ship_size: Size {
                width: 145,
                height: 80,
            },
            start_position: Point { x: 0, y: 200 },
            start_speed: 1,
            min_speed: 1,
            max_speed: 5,
            canvas: Size {
                width: 900,
                height: 600,
            },
            assets: AssetPaths::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tile_size <= 0 {
            return Err(anyhow!("tile size must be positive, got {}", self.tile_size));
        }
        for (name, size) in [("ship", self.ship_size), ("canvas", self.canvas)] {
            if size.width <= 0 || size.height <= 0 {
                return Err(anyhow!("{} size must be positive, got {:?}", name, size));
            }
        }
        if !(1 <= self.min_speed
            && self.min_speed <= self.start_speed
            && self.start_speed <= self.max_speed)
        {
            return Err(anyhow!(
                "speeds must satisfy 1 <= min ({}) <= start ({}) <= max ({})",
                self.min_speed,
                self.start_speed,
                self.max_speed
            ));
        }
        Ok(())
    }

    /// clamps a speed into [min_speed, max_speed], never panics, even on a
    /// config that fails `validate`
    pub fn clamp_speed(&self, speed: i32) -> i32 {
        speed.max(self.min_speed).min(self.max_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_speed_is_within_bounds() {
        let config = GameConfig::default();
        assert_eq!(config.clamp_speed(config.start_speed), config.start_speed);
    }

    #[test]
    fn clamp_speed_limits_both_ends() {
        let config = GameConfig::default();
        assert_eq!(config.clamp_speed(0), 1);
        assert_eq!(config.clamp_speed(6), 5);
        assert_eq!(config.clamp_speed(3), 3);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_speed_bounds_are_rejected() {
        let config = GameConfig {
            min_speed: 5,
            max_speed: 1,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
        // still no panic when used anyway
        assert_eq!(config.clamp_speed(3), 1);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let no_tiles = GameConfig {
            tile_size: 0,
            ..GameConfig::default()
        };
        assert!(no_tiles.validate().is_err());

        let flat_ship = GameConfig {
            ship_size: Size {
                width: 145,
                height: 0,
            },
            ..GameConfig::default()
        };
        assert!(flat_ship.validate().is_err());
    }

    #[test]
    fn start_speed_outside_bounds_is_rejected() {
        let config = GameConfig {
            start_speed: 9,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
