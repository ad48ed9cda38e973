//! Realtime Histogram — Tauri application entry point.
//!
//! This is the app shell that wires together:
//! - Capture domain: targets, geometry, frame source (capture/)
//! - The capture loop and its worker (capture_loop.rs)
//! - Luminance reduction (histogram.rs) and publication (publish.rs, events.rs)
//! - System tray (tray.rs), global shortcut (shortcut.rs) and the
//!   command surface (commands.rs)

pub mod capture;
pub mod capture_loop;
mod commands;
pub mod config;
mod events;
pub mod histogram;
pub mod import;
pub mod preview;
pub mod publish;
#[cfg(desktop)]
mod shortcut;
mod tray;

use capture::{GeometryModel, ScreenFrameSource, ScreenTargets};
use capture_loop::CaptureLoop;
use config::AppConfig;
use events::TauriSink;
use publish::{Publisher, ResultPublisher};
use std::sync::{Arc, Mutex};
use tauri::{DragDropEvent, Manager, WindowEvent};

/// Application state shared by commands, the tray and window events.
pub struct AppState {
    pub capture: CaptureLoop,
    pub publisher: Arc<Publisher<TauriSink>>,
    pub config: Mutex<AppConfig>,
}

/// Entry point — called by Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    dotenvy::dotenv().ok();
    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            commands::start_capture,
            commands::stop_capture,
            commands::get_loop_status,
            commands::list_targets,
            commands::refresh_targets,
            commands::select_target,
            commands::get_geometry,
            commands::set_offset,
            commands::set_width,
            commands::set_height,
            commands::set_capture_mode,
            commands::get_config,
            commands::set_scale_y,
            commands::set_interval,
            commands::get_snapshot,
            commands::import_image,
            commands::open_image,
        ])
        .setup(|app| {
            log::info!("Realtime Histogram starting up");

            let config = config::load_config();
            log::info!("[CONFIG] {:?}", config);

            let publisher = Arc::new(Publisher::new(
                TauriSink::new(app.handle().clone()),
                config.preview_format,
                config.scale_y,
                config.min_publish_interval(),
            ));
            let sink: Arc<dyn ResultPublisher> = publisher.clone();

            let capture = CaptureLoop::new(
                Arc::new(ScreenTargets),
                Arc::new(ScreenFrameSource),
                sink,
                GeometryModel::new(config.capture_mode),
            )
            .with_interval(config.interval());

            match capture.refresh() {
                Ok((targets, geometry)) => log::info!(
                    "[CAPTURE] {} targets, initial rect {:?}",
                    targets.len(),
                    geometry.rect
                ),
                Err(e) => log::warn!("[CAPTURE] Initial target refresh failed: {}", e),
            }

            events::forward_loop_state(app.handle().clone(), capture.subscribe());

            app.manage(AppState {
                capture,
                publisher,
                config: Mutex::new(config),
            });

            tray::setup_tray(app.handle())?;

            #[cfg(desktop)]
            {
                if let Err(e) = shortcut::setup_shortcut(app) {
                    log::warn!("Global shortcut unavailable: {}", e);
                }
            }

            log::info!("System tray initialized — ready to capture");
            Ok(())
        })
        .on_window_event(|window, event| {
            if window.label() != events::MAIN_WINDOW {
                return;
            }
            match event {
                WindowEvent::DragDrop(DragDropEvent::Drop { paths, .. }) => {
                    let app = window.app_handle().clone();
                    let paths = paths.clone();
                    tauri::async_runtime::spawn(async move {
                        if let Err(e) = commands::import_paths(&app, paths).await {
                            log::warn!("[IMPORT] {}", e);
                        }
                    });
                }
                WindowEvent::CloseRequested { .. } => {
                    if window.app_handle().try_state::<AppState>().is_some() {
                        commands::in_background(window.app_handle(), commands::stop);
                    }
                }
                _ => {}
            }
        })
        .run(tauri::generate_context!())
        .expect("Error running Realtime Histogram");
}
