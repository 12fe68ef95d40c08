//! Neonfield - floating neon shapes with live material controls.
//!
//! A field of randomly placed primitives drifts around centred portfolio
//! text. A control panel edits material, animation and light parameters,
//! and any shape can be grabbed and dragged across a camera-facing plane.

mod animation;
mod app;
mod assets;
mod config;
mod interaction;
mod params;
mod propagation;
mod render;
mod scene;
mod ui;

fn main() {
    if let Err(err) = app::run() {
        log::error!("Neonfield exited with an error: {err}");
        std::process::exit(1);
    }
}
