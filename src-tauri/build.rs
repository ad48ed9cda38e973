//! Build script for the Realtime Histogram Tauri app.
//!
//! Only the Tauri step: generates the context from tauri.conf.json and
//! validates capabilities. Pixel capture goes through xcap, which needs no
//! extra native build steps.

fn main() {
    tauri_build::build();
}
