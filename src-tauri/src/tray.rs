//! System tray setup and click handler.
//!
//! Left-click toggles the capture loop.
//! Right-click opens a menu with Start, Stop and Quit.

use crate::commands;
use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::{MouseButton, TrayIconBuilder, TrayIconEvent},
    AppHandle,
};

pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let start_item = MenuItemBuilder::with_id("start", "Start capture").build(app)?;
    let stop_item = MenuItemBuilder::with_id("stop", "Stop capture").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit Realtime Histogram").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&start_item)
        .item(&stop_item)
        .separator()
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("Realtime Histogram — Click to start/stop")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                ..
            } = event
            {
                log::info!("[TRAY] Icon clicked — toggling capture");
                commands::in_background(tray_icon.app_handle(), commands::toggle);
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "start" => {
                log::info!("[TRAY] Start requested");
                commands::in_background(app, |app| {
                    if let Err(e) = commands::start(app) {
                        log::warn!("[TRAY] Cannot start capture: {}", e);
                    }
                });
            }
            "stop" => {
                log::info!("[TRAY] Stop requested");
                commands::in_background(app, commands::stop);
            }
            "quit" => {
                log::info!("[TRAY] Quit requested");
                commands::in_background(app, |app| {
                    commands::stop(app);
                    app.exit(0);
                });
            }
            _ => {}
        })
        .build(app)?;

    Ok(())
}
