//! Presentation handoff — Tauri events and the preview window.
//!
//! Emitting is safe from any thread; Tauri marshals the payload onto the
//! webview's own context, so the capture worker never touches UI state.

use crate::capture_loop::{LoopState, LoopStatus};
use crate::publish::{HistogramUpdate, PreviewSink};
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindowBuilder};
use tokio::sync::watch;

pub const HISTOGRAM_UPDATED: &str = "histogram-updated";
pub const LOOP_STATE: &str = "loop-state";
pub const TARGET_LOST: &str = "target-lost";

pub const MAIN_WINDOW: &str = "main";
pub const PREVIEW_WINDOW: &str = "preview";

/// Forwards publications to every open webview.
pub struct TauriSink {
    app: AppHandle,
}

impl TauriSink {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl PreviewSink for TauriSink {
    fn histogram_updated(&self, update: &HistogramUpdate) {
        if let Err(e) = self.app.emit(HISTOGRAM_UPDATED, update) {
            log::warn!("[PUBLISH] Failed to emit histogram: {}", e);
        }
    }

    fn target_lost(&self) {
        close_preview(&self.app);
        if let Err(e) = self.app.emit(TARGET_LOST, ()) {
            log::warn!("[PUBLISH] Failed to emit target-lost: {}", e);
        }
    }
}

/// Shows the preview window, creating it on first use.
pub fn open_preview(app: &AppHandle) -> tauri::Result<()> {
    if let Some(window) = app.get_webview_window(PREVIEW_WINDOW) {
        return window.show();
    }

    WebviewWindowBuilder::new(app, PREVIEW_WINDOW, WebviewUrl::App("preview.html".into()))
        .title("Captured region")
        .inner_size(640.0, 360.0)
        .resizable(true)
        .build()?;

    Ok(())
}

pub fn close_preview(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(PREVIEW_WINDOW) {
        if let Err(e) = window.close() {
            log::warn!("Failed to close preview window: {}", e);
        }
    }
}

/// Emits a `loop-state` event on every transition of the capture loop.
pub fn forward_loop_state(app: AppHandle, mut states: watch::Receiver<LoopState>) {
    tauri::async_runtime::spawn(async move {
        while states.changed().await.is_ok() {
            let status = LoopStatus::from(*states.borrow_and_update());
            if let Err(e) = app.emit(LOOP_STATE, status) {
                log::warn!("Failed to emit loop state: {}", e);
            }
        }
    });
}
