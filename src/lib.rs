// ==================== Imports ====================
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[macro_use]
mod browser;
pub mod config;
pub mod engine;
mod game;
pub mod level;
pub mod ship;

use config::GameConfig;
use engine::GameLoop;
use game::TinySpaceGame;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - loads level, atlas and sprite image
/// - starts the frame loop, which runs until the ship crashes
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        let game = TinySpaceGame::new(GameConfig::default());
        if let Err(err) = GameLoop::start(game).await {
            error!("Could not start game loop : {:#?}", err);
        }
    });

    Ok(())
}
