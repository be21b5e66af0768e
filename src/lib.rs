// ==================== Imports ====================
use wasm_bindgen::prelude::*;

#[macro_use]
mod browser;
pub mod config;
mod effects;
mod engine;
mod game;
pub mod sim;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs panic hook
/// - loads config, builds the world
/// - starts the fixed step game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // wasm has no threads, the loop runs as a local task
    browser::spawn_local(async move {
        let game = game::RailShooter::new();
        if let Err(err) = engine::GameLoop::start(game).await {
            error!("Could not start game loop : {:#?}", err);
        }
    });

    Ok(())
}
