//! `make-level` : turns `level.png` into the tile grid JSON the game fetches.
//!
//! Run it next to the image and redirect stdout :
//! `make-level > level.json`

use anyhow::{Context, Result};
use image::DynamicImage;
use tiny_space_game::level::{TileGrid, TILE_SIZE};

const LEVEL_IMAGE: &str = "level.png";

fn main() -> Result<()> {
    let image = image::open(LEVEL_IMAGE)
        .with_context(|| format!("Could not decode {}", LEVEL_IMAGE))?;
    let grid = grid_from_image(&image)?;
    println!("{}", serde_json::to_string(&grid)?);
    Ok(())
}

/// One red channel sample per tile, see `TileGrid::from_rgba`
fn grid_from_image(image: &DynamicImage) -> Result<TileGrid> {
    let rgba = image.to_rgba8();
    TileGrid::from_rgba(rgba.width(), rgba.height(), rgba.as_raw(), TILE_SIZE)
        .context("Could not build tile grid")
}
