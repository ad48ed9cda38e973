//! Tauri command surface for the frontend, plus the start/stop/import
//! actions shared with the tray, the global shortcut and window events.

use crate::capture::{CaptureMode, CaptureTarget, GeometrySnapshot, TargetInfo};
use crate::capture_loop::{LoopError, LoopStatus};
use crate::config::{self, AppConfig};
use crate::events;
use crate::import::{self, ImportError};
use crate::publish::{FrameOrigin, HistogramUpdate};
use crate::AppState;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::PoisonError;
use tauri::{AppHandle, Manager};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub targets: Vec<TargetInfo>,
    pub geometry: GeometrySnapshot,
}

// ── Lifecycle ───────────────────────────────────────────────────────

/// Starts the loop and opens the preview window.
pub fn start(app: &AppHandle) -> Result<(), LoopError> {
    let state = app.state::<AppState>();
    state.capture.start()?;
    if let Err(e) = events::open_preview(app) {
        log::warn!("Failed to open preview window: {}", e);
    }
    Ok(())
}

/// Stops the loop and closes the preview window. No-op when idle.
pub fn stop(app: &AppHandle) {
    app.state::<AppState>().capture.stop();
    events::close_preview(app);
}

/// Start when idle, stop when running.
pub fn toggle(app: &AppHandle) {
    if app.state::<AppState>().capture.is_running() {
        stop(app);
    } else if let Err(e) = start(app) {
        log::warn!("[CAPTURE] Cannot start: {}", e);
    }
}

/// Runs a lifecycle action on the blocking pool. `start` and `stop` may
/// wait out a capture, which must not happen on the main thread.
pub fn in_background(app: &AppHandle, action: impl FnOnce(&AppHandle) + Send + 'static) {
    let app = app.clone();
    tauri::async_runtime::spawn_blocking(move || action(&app));
}

/// Imports the first of `paths`: stops any live capture, reduces the
/// image off the presentation context and publishes it.
pub async fn import_paths(app: &AppHandle, paths: Vec<PathBuf>) -> Result<HistogramUpdate, String> {
    let path = paths
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::NoFile.to_string())?;

    let handle = app.clone();
    let update = tokio::task::spawn_blocking(move || {
        // Joins the worker, so no live frame can land after the import.
        stop(&handle);
        let (histogram, frame) = import::histogram_from_file(&path)?;
        handle
            .state::<AppState>()
            .publisher
            .publish_from(FrameOrigin::Import, histogram, frame)
            .ok_or_else(|| ImportError::Task("nothing was published".into()))
    })
    .await
    .map_err(|e| ImportError::Task(e.to_string()).to_string())?
    .map_err(|e| e.to_string())?;

    events::open_preview(app).map_err(|e| e.to_string())?;
    Ok(update)
}

#[tauri::command]
pub async fn start_capture(app: AppHandle) -> Result<(), String> {
    tokio::task::spawn_blocking(move || start(&app))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_capture(app: AppHandle) -> Result<(), String> {
    tokio::task::spawn_blocking(move || stop(&app))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_loop_status(state: tauri::State<'_, AppState>) -> LoopStatus {
    state.capture.status()
}

// ── Targets & geometry ──────────────────────────────────────────────

#[tauri::command]
pub fn list_targets(state: tauri::State<'_, AppState>) -> Vec<TargetInfo> {
    state.capture.list_targets()
}

#[tauri::command]
pub fn refresh_targets(state: tauri::State<'_, AppState>) -> Result<RefreshResponse, String> {
    let (targets, geometry) = state.capture.refresh().map_err(|e| e.to_string())?;
    Ok(RefreshResponse { targets, geometry })
}

#[tauri::command]
pub fn select_target(
    state: tauri::State<'_, AppState>,
    target: CaptureTarget,
) -> Result<GeometrySnapshot, String> {
    state.capture.select_target(target).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_geometry(state: tauri::State<'_, AppState>) -> GeometrySnapshot {
    state.capture.with_geometry(|model| model.snapshot())
}

#[tauri::command]
pub fn set_offset(
    state: tauri::State<'_, AppState>,
    x: Option<i32>,
    y: Option<i32>,
) -> GeometrySnapshot {
    state.capture.with_geometry(|model| {
        model.set_offset(x, y);
        model.snapshot()
    })
}

#[tauri::command]
pub fn set_width(state: tauri::State<'_, AppState>, width: u32) -> GeometrySnapshot {
    state.capture.with_geometry(|model| {
        model.set_width(width);
        model.snapshot()
    })
}

#[tauri::command]
pub fn set_height(state: tauri::State<'_, AppState>, height: u32) -> GeometrySnapshot {
    state.capture.with_geometry(|model| {
        model.set_height(height);
        model.snapshot()
    })
}

#[tauri::command]
pub fn set_capture_mode(
    state: tauri::State<'_, AppState>,
    mode: CaptureMode,
) -> Result<GeometrySnapshot, String> {
    if state.capture.is_running() {
        return Err(LoopError::AlreadyRunning.to_string());
    }
    let snapshot = state.capture.with_geometry(|model| {
        model.set_mode(mode);
        model.snapshot()
    });
    update_config(&state, |config| config.capture_mode = mode)?;
    Ok(snapshot)
}

// ── Settings & results ──────────────────────────────────────────────

#[tauri::command]
pub fn get_config(state: tauri::State<'_, AppState>) -> AppConfig {
    state
        .config
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[tauri::command]
pub fn set_scale_y(state: tauri::State<'_, AppState>, scale_y: u32) -> Result<(), String> {
    state.publisher.set_scale_y(scale_y);
    update_config(&state, |config| config.scale_y = scale_y)
}

/// Pacing interval; takes effect from the next start.
#[tauri::command]
pub fn set_interval(state: tauri::State<'_, AppState>, interval_ms: u64) -> Result<(), String> {
    let interval = update_config(&state, |config| config.interval_ms = interval_ms)?;
    state.capture.set_interval(interval);
    Ok(())
}

#[tauri::command]
pub fn get_snapshot(state: tauri::State<'_, AppState>) -> Option<HistogramUpdate> {
    state.publisher.latest()
}

#[tauri::command]
pub async fn import_image(app: AppHandle, path: String) -> Result<HistogramUpdate, String> {
    import_paths(&app, vec![PathBuf::from(path)]).await
}

/// Opens a native file picker and imports the chosen image.
#[tauri::command]
pub fn open_image(app: AppHandle) {
    use tauri_plugin_dialog::DialogExt;

    let handle = app.clone();
    app.dialog()
        .file()
        .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"])
        .pick_file(move |picked| {
            let Some(path) = picked.and_then(|p| p.into_path().ok()) else {
                return;
            };
            tauri::async_runtime::spawn(async move {
                if let Err(e) = import_paths(&handle, vec![path]).await {
                    log::warn!("[IMPORT] {}", e);
                }
            });
        });
}

/// Applies `change` to the in-memory config and persists it.
/// Returns the effective loop interval afterwards.
fn update_config(
    state: &AppState,
    change: impl FnOnce(&mut AppConfig),
) -> Result<std::time::Duration, String> {
    let mut config = state.config.lock().unwrap_or_else(PoisonError::into_inner);
    change(&mut config);
    config::save_config(&config).map_err(|e| e.to_string())?;
    Ok(config.interval())
}
