//! Global keyboard shortcut: Ctrl+Shift+H toggles the capture loop
//! even while another application has focus.

use crate::commands;
use tauri::App;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};

pub fn setup_shortcut(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let toggle = Shortcut::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyH);
    let pressed = toggle;

    app.handle().plugin(
        tauri_plugin_global_shortcut::Builder::new()
            .with_handler(move |app, shortcut, event| {
                if shortcut == &pressed && event.state() == ShortcutState::Pressed {
                    log::info!("Shortcut pressed — toggling capture");
                    commands::in_background(app, commands::toggle);
                }
            })
            .build(),
    )?;

    app.global_shortcut().register(toggle)?;
    log::info!("Registered Ctrl+Shift+H");
    Ok(())
}
