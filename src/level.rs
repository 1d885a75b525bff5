//! Tile grid of a level and the collision test against it.
//!
//! The grid is a coarse copy of the level image: one red channel sample per
//! `TILE_SIZE` block. `make-level` builds it offline, the game fetches it as
//! JSON (nested row arrays).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Edge length of a tile in pixels
pub const TILE_SIZE: u32 = 20;

/// Cell value of open space, everything else blocks the ship
pub const PASSABLE: u8 = 255;

/// `rows[row][col]`, one sampled intensity per tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileGrid {
    rows: Vec<Vec<u8>>,
}

impl TileGrid {
    pub fn new(rows: Vec<Vec<u8>>) -> Self {
        TileGrid { rows }
    }

    /// Samples the top left pixel of every `tile_size` block of an RGBA8 image
    /// - `rgba` is row major, 4 bytes per pixel
    /// - grid is ceil(height / tile_size) rows by ceil(width / tile_size) cols
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8], tile_size: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(anyhow!("tile size must be greater than zero"));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() < expected {
            return Err(anyhow!(
                "image data too short for {}x{} RGBA : {} bytes, expected {}",
                width,
                height,
                rgba.len(),
                expected
            ));
        }

        let stride = width as usize * 4;
        let rows = (0..height)
            .step_by(tile_size as usize)
            .map(|y| {
                (0..width)
                    .step_by(tile_size as usize)
                    .map(|x| rgba[y as usize * stride + x as usize * 4])
                    .collect()
            })
            .collect();

        Ok(TileGrid { rows })
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.rows.get(row)?.get(col).copied()
    }

    /// Cell under a pixel coordinate, None when outside the grid
    pub fn tile_at(&self, x: i32, y: i32, tile_size: i32) -> Option<u8> {
        let col = usize::try_from(x.div_euclid(tile_size)).ok()?;
        let row = usize::try_from(y.div_euclid(tile_size)).ok()?;
        self.get(row, col)
    }

    /// Outside the grid counts as blocked
    pub fn is_passable(&self, x: i32, y: i32, tile_size: i32) -> bool {
        self.tile_at(x, y, tile_size) == Some(PASSABLE)
    }
}

/// Axis aligned box in pixel space, (x1, y1) top left and (x2, y2) bottom right
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        BoundingBox { x1, y1, x2, y2 }
    }

    pub fn corners(&self) -> [(i32, i32); 4] {
        [
            (self.x1, self.y1),
            (self.x2, self.y1),
            (self.x1, self.y2),
            (self.x2, self.y2),
        ]
    }
}

/// True when all four corners of `bbox` sit on passable tiles
/// - corners outside the grid fail closed
pub fn can_move(bbox: &BoundingBox, level: &TileGrid, tile_size: i32) -> bool {
    if tile_size <= 0 {
        return false;
    }
    bbox.corners()
        .iter()
        .all(|&(x, y)| level.is_passable(x, y, tile_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// width x height RGBA image, `fill(x, y)` gives the red channel, other
    /// channels copy it
    fn image(width: u32, height: u32, fill: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = fill(x, y);
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        data
    }

    fn open_grid(rows: usize, cols: usize) -> TileGrid {
        TileGrid::new(vec![vec![PASSABLE; cols]; rows])
    }

    #[test]
    fn samples_top_left_pixel_of_each_tile() {
        let data = image(40, 40, |x, y| if x < 20 && y < 20 { 255 } else { 0 });
        let grid = TileGrid::from_rgba(40, 40, &data, TILE_SIZE).unwrap();
        assert_eq!(grid, TileGrid::new(vec![vec![255, 0], vec![0, 0]]));
    }

    #[test]
    fn sample_ignores_rest_of_block() {
        // only pixel (0, 0) of the tile is white, the rest is black
        let data = image(20, 20, |x, y| if x == 0 && y == 0 { 255 } else { 0 });
        let grid = TileGrid::from_rgba(20, 20, &data, TILE_SIZE).unwrap();
        assert_eq!(grid.get(0, 0), Some(255));
    }

    #[test]
    fn samples_red_channel_only() {
        let mut data = vec![0u8; 20 * 20 * 4];
        data[0] = 7;
        data[1] = 255;
        data[2] = 255;
        let grid = TileGrid::from_rgba(20, 20, &data, TILE_SIZE).unwrap();
        assert_eq!(grid.get(0, 0), Some(7));
    }

    #[test]
    fn partial_tiles_round_up() {
        let data = image(45, 21, |_, _| 255);
        let grid = TileGrid::from_rgba(45, 21, &data, TILE_SIZE).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.columns(), 3);
    }

    #[test]
    fn rejects_short_buffer_and_zero_tile() {
        assert!(TileGrid::from_rgba(20, 20, &[0u8; 16], TILE_SIZE).is_err());
        assert!(TileGrid::from_rgba(20, 20, &image(20, 20, |_, _| 0), 0).is_err());
    }

    #[test]
    fn parses_level_json() {
        let grid: TileGrid = serde_json::from_str("[[255,255,0],[255,0,0]]").unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.get(1, 1), Some(0));
        assert_eq!(serde_json::to_string(&grid).unwrap(), "[[255,255,0],[255,0,0]]");
    }

    #[test]
    fn box_inside_one_open_tile_can_move() {
        let grid = open_grid(1, 1);
        let bbox = BoundingBox::new(2, 3, 15, 19);
        assert!(can_move(&bbox, &grid, 20));
    }

    #[test]
    fn any_blocked_corner_stops_movement() {
        // 2x2 grid, one blocked tile per case, box covers all four tiles
        let bbox = BoundingBox::new(10, 10, 30, 30);
        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            let mut grid = open_grid(2, 2);
            grid.rows[row][col] = 254;
            assert!(!can_move(&bbox, &grid, 20), "blocked tile ({row}, {col}) ignored");
        }
        assert!(can_move(&bbox, &open_grid(2, 2), 20));
    }

    #[test]
    fn tile_edge_belongs_to_next_tile() {
        let grid = TileGrid::new(vec![vec![PASSABLE, 0]]);
        assert!(can_move(&BoundingBox::new(0, 0, 19, 19), &grid, 20));
        assert!(!can_move(&BoundingBox::new(0, 0, 20, 19), &grid, 20));
    }

    #[test]
    fn outside_the_grid_is_blocked() {
        let grid = open_grid(3, 3);
        // negative coordinates floor to -1, never wrap to a valid index
        assert!(!can_move(&BoundingBox::new(-1, 0, 10, 10), &grid, 20));
        assert!(!can_move(&BoundingBox::new(0, -5, 10, 10), &grid, 20));
        // past the right and bottom edge
        assert!(!can_move(&BoundingBox::new(0, 0, 60, 10), &grid, 20));
        assert!(!can_move(&BoundingBox::new(0, 0, 10, 60), &grid, 20));
    }

    #[test]
    fn ragged_rows_fail_closed() {
        let grid = TileGrid::new(vec![vec![PASSABLE, PASSABLE], vec![PASSABLE]]);
        assert!(can_move(&BoundingBox::new(0, 0, 5, 25), &grid, 20));
        assert!(!can_move(&BoundingBox::new(0, 0, 25, 25), &grid, 20));
    }
}
