use crate::browser;
use crate::config::GameConfig;
use crate::engine;
use crate::engine::input::KeyState;
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Game, Point, Rect, Renderer};
use crate::level::{TileGrid, PASSABLE};
use crate::ship::spaceship::ShipStateMachine;
use crate::ship::{Direction, InputSnapshot};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::join;
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use web_sys::HtmlImageElement;

/// TABLE
/// ┌───────────────────── Game Architecture Overview ────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐          ┌─────────────┐          ┌──────────────┐   │
/// │    │  engine.rs  │  update  │   game.rs   │ advance  │ ship/        │   │
/// │    │  GameLoop   ├─────────►│ TinySpace   ├─────────►│ ShipState    │   │
/// │    │             │ KeyState │ Game        │ Snapshot │ Machine      │   │
/// │    └─────────────┘          └──────┬──────┘          └──────┬───────┘   │
/// │                                    │ draw                   │ can_move  │
/// │                              ┌─────┴──────┐          ┌──────┴───────┐   │
/// │                              │  Renderer  │          │  level.rs    │   │
/// │                              │  atlas     │          │  TileGrid    │   │
/// │                              └────────────┘          └──────────────┘   │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum TinySpaceGame {
    /// Assets are still loading, carries the settings for the session
    Loading(GameConfig),

    /// Assets loaded, ship flying or crashed
    Loaded(Flight),
}

impl TinySpaceGame {
    pub fn new(config: GameConfig) -> Self {
        TinySpaceGame::Loading(config)
    }

    async fn load_level(url: &str) -> Result<TileGrid> {
        browser::fetch_json::<TileGrid>(url)
            .await
            .with_context(|| format!("Failed to load level from : {}", url))
    }

    async fn load_atlas(url: &str) -> Result<Atlas> {
        browser::fetch_json::<Atlas>(url)
            .await
            .with_context(|| format!("Failed to load sprite atlas from : {}", url))
    }

    async fn load_atlas_image(path: &str) -> Result<HtmlImageElement> {
        engine::load_image(path)
            .await
            .with_context(|| format!("Failed to load atlas image from : {}", path))
    }
}

#[async_trait(?Send)]
impl Game for TinySpaceGame {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            TinySpaceGame::Loading(config) => {
                config.validate().context("Invalid game config")?;
                // all three resources load at once, the slowest decides
                let (level, atlas, image) = join!(
                    Self::load_level(&config.assets.level_url),
                    Self::load_atlas(&config.assets.atlas_url),
                    Self::load_atlas_image(&config.assets.atlas_image),
                );
                let level = level?;
                log!(
                    "Level loaded : {} rows x {} columns",
                    level.rows(),
                    level.columns()
                );

                Ok(Box::new(TinySpaceGame::Loaded(Flight::new(
                    config.clone(),
                    level,
                    atlas?,
                    image?,
                ))))
            }
            TinySpaceGame::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let TinySpaceGame::Loaded(flight) = self {
            flight.update(InputSnapshot::from(keystate));
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let TinySpaceGame::Loaded(flight) = self {
            flight.draw(renderer);
        }
    }

    fn is_running(&self) -> bool {
        match self {
            TinySpaceGame::Loading(_) => true,
            TinySpaceGame::Loaded(flight) => flight.ship.is_playing(),
        }
    }
}

// ==================== Atlas ====================
/// `[x, y, width, height]` of a sprite inside the atlas image
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect(i32, i32, i32, i32);

impl From<AtlasRect> for Rect {
    fn from(AtlasRect(x, y, width, height): AtlasRect) -> Self {
        Rect::new_from_x_y(x, y, width, height)
    }
}

/// Coordinate table of the single sprite image
#[derive(Debug, Deserialize, Clone)]
pub struct Atlas {
    tile: AtlasRect,
    #[serde(rename = "plr")]
    player: AtlasRect,
    instructions: AtlasRect,
    background: AtlasRect,
    /// arrow key name -> highlighted instructions
    pressed: HashMap<String, AtlasRect>,
}

impl Atlas {
    fn pressed(&self, direction: Direction) -> Option<Rect> {
        self.pressed.get(direction.key()).copied().map(Rect::from)
    }
}

// ==================== Flight ====================
/// A loaded session
pub struct Flight {
    ship: ShipStateMachine,
    // read only for the whole session
    level: Rc<TileGrid>,
    atlas: Rc<Atlas>,
    image: HtmlImageElement,
    config: GameConfig,
    // input of the latest update, the nav overlay shows it
    input: InputSnapshot,
}

impl Flight {
    // screen layout, canvas pixels
    const PLAYER_SCREEN_X: i32 = 75;
    const PLAYER_DRAW_SIZE: i32 = 80;
    const TILES_BEHIND_SHIP: i32 = 4;
    const VISIBLE_COLUMNS: i32 = 50;
    const BACKGROUND: Rect = Rect {
        position: Point { x: 600, y: 0 },
        size: engine::Size {
            width: 300,
            height: 600,
        },
    };
    const NAVIGATION: Rect = Rect {
        position: Point { x: 690, y: 375 },
        size: engine::Size {
            width: 200,
            height: 216,
        },
    };
    const GAME_OVER_TEXT: &'static str = "GAME OVER";
    const GAME_OVER_FONT: &'static str = "140px Arcade";

    fn new(config: GameConfig, level: TileGrid, atlas: Atlas, image: HtmlImageElement) -> Self {
        Flight {
            ship: ShipStateMachine::new(&config),
            level: Rc::new(level),
            atlas: Rc::new(atlas),
            image,
            config,
            input: InputSnapshot::none(),
        }
    }

    fn update(&mut self, input: InputSnapshot) {
        self.input = input;
        let was_playing = self.ship.is_playing();
        self.ship = self.ship.advance(&self.input, &self.level, &self.config);
        if was_playing && !self.ship.is_playing() {
            log!(
                "Ship crashed at {:?} going {}, now {}",
                self.ship.position(),
                self.ship.speed(),
                self.ship.phase_name()
            );
        }
    }

    /// Draw order matters : level -> side panel -> navigation -> player
    fn draw(&self, renderer: &Renderer) {
        self.draw_level(renderer);
        renderer.draw_image(&self.image, &self.atlas.background.into(), &Self::BACKGROUND);
        self.draw_navigation(renderer);
        self.draw_player(renderer);

        if !self.ship.is_playing() {
            // the loop stops after this frame, so this runs once
            renderer.draw_text_when_loaded(
                Self::GAME_OVER_TEXT,
                Self::GAME_OVER_FONT,
                "black",
                Point {
                    x: self.config.canvas.width / 2,
                    y: self.config.canvas.height / 2,
                },
            );
        }
    }

    fn draw_level(&self, renderer: &Renderer) {
        let canvas = Rect::new(Point::default(), self.config.canvas);
        renderer.fill_rect(&canvas, "#FFFFFF");

        let tile = self.config.tile_size;
        let scroll_x = self.ship.position().x;
        let tile_frame: Rect = self.atlas.tile.into();
        let visible_rows = self.config.canvas.height / tile;

        for row in 0..visible_rows {
            for col in visible_columns(scroll_x, tile) {
                // beyond the level's right edge there is nothing to draw
                let Some(cell) = self.level.get(row as usize, col as usize) else {
                    continue;
                };
                if cell != PASSABLE {
                    renderer.draw_image(
                        &self.image,
                        &tile_frame,
                        &Rect::new_from_x_y(col * tile - scroll_x, row * tile, tile, tile),
                    );
                }
            }
        }
    }

    fn draw_navigation(&self, renderer: &Renderer) {
        renderer.draw_image(&self.image, &self.atlas.instructions.into(), &Self::NAVIGATION);
        if let Some(pressed) = self.input.active().and_then(|d| self.atlas.pressed(d)) {
            renderer.draw_image(&self.image, &pressed, &Self::NAVIGATION);
        }
    }

    fn draw_player(&self, renderer: &Renderer) {
        renderer.draw_image(
            &self.image,
            &self.atlas.player.into(),
            &Rect::new_from_x_y(
                Self::PLAYER_SCREEN_X,
                self.ship.position().y,
                Self::PLAYER_DRAW_SIZE,
                Self::PLAYER_DRAW_SIZE,
            ),
        );

        #[cfg(debug_assertions)]
        {
            // level x maps to screen x 0, see draw_level
            let mut bounding_box = self.ship.bounding_box(&self.config);
            bounding_box.position.x = 0;
            bounding_box.draw_debug(renderer);
        }
    }
}

/// Level columns drawn while the view is scrolled to `scroll_x`
/// - starts a few tiles behind the ship, never before column 0
fn visible_columns(scroll_x: i32, tile_size: i32) -> Range<i32> {
    let first = (scroll_x.div_euclid(tile_size) - Flight::TILES_BEHIND_SHIP).max(0);
    first..first + Flight::VISIBLE_COLUMNS
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) const IMAGE_DATA: &str = r#"{
        "tile": [0, 0, 20, 20],
        "plr": [20, 0, 80, 80],
        "instructions": [0, 100, 200, 216],
        "background": [300, 0, 300, 600],
        "pressed": {
            "ArrowDown": [200, 100, 200, 216],
            "ArrowUp": [400, 100, 200, 216],
            "ArrowLeft": [600, 100, 200, 216],
            "ArrowRight": [800, 100, 200, 216]
        }
    }"#;

    #[test]
    fn atlas_parses_image_data() {
        let atlas: Atlas = serde_json::from_str(IMAGE_DATA).unwrap();
        assert_eq!(Rect::from(atlas.player), Rect::new_from_x_y(20, 0, 80, 80));
        assert_eq!(Rect::from(atlas.tile), Rect::new_from_x_y(0, 0, 20, 20));
    }

    #[test]
    fn atlas_finds_pressed_overlay_per_direction() {
        let atlas: Atlas = serde_json::from_str(IMAGE_DATA).unwrap();
        assert_eq!(
            atlas.pressed(Direction::Left),
            Some(Rect::new_from_x_y(600, 100, 200, 216))
        );
        assert_eq!(
            atlas.pressed(Direction::Down),
            Some(Rect::new_from_x_y(200, 100, 200, 216))
        );
    }

    #[test]
    fn atlas_without_pressed_entry_draws_no_overlay() {
        let atlas: Atlas = serde_json::from_str(
            r#"{"tile":[0,0,1,1],"plr":[0,0,1,1],"instructions":[0,0,1,1],
                "background":[0,0,1,1],"pressed":{}}"#,
        )
        .unwrap();
        assert_eq!(atlas.pressed(Direction::Up), None);
    }

    #[test]
    fn columns_start_at_zero_near_level_start() {
        assert_eq!(visible_columns(0, 20), 0..50);
        assert_eq!(visible_columns(79, 20), 0..50);
    }

    #[test]
    fn columns_keep_tiles_behind_the_ship() {
        // ship in column 10, four columns of history stay on screen
        assert_eq!(visible_columns(200, 20), 6..56);
        assert_eq!(visible_columns(219, 20), 6..56);
    }
}
