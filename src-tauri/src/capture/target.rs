//! Capture targets: the windows and monitors whose bounds drive the
//! capture rectangle.
//!
//! `TargetProvider` is the seam between the loop and the OS. The screen
//! implementation talks to `xcap`; tests substitute an in-memory one.

use serde::{Deserialize, Serialize};
use xcap::{Monitor, Window};

/// A window handle or a monitor index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaptureTarget {
    Window { id: u32 },
    Monitor { index: usize },
}

/// Target rectangle in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A selectable target with its human-readable label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target: CaptureTarget,
    pub label: String,
    pub bounds: Bounds,
    pub is_primary: bool,
}

/// Supplies capturable targets and their live bounds.
pub trait TargetProvider: Send + Sync {
    fn list(&self) -> Vec<TargetInfo>;

    /// Fresh bounds of `target`, or `None` once it has gone away.
    ///
    /// Must not fail loudly: a closed window is an expected outcome.
    fn bounds(&self, target: &CaptureTarget) -> Option<Bounds>;
}

/// Enumerates real windows and monitors through `xcap`.
pub struct ScreenTargets;

impl ScreenTargets {
    fn window_bounds(window: &Window) -> Option<Bounds> {
        if window.is_minimized().unwrap_or(false) {
            return None;
        }
        let bounds = Bounds::new(
            window.x().ok()?,
            window.y().ok()?,
            window.width().ok()?,
            window.height().ok()?,
        );
        (!bounds.is_empty()).then_some(bounds)
    }

    fn monitor_bounds(monitor: &Monitor) -> Option<Bounds> {
        let bounds = Bounds::new(
            monitor.x().ok()?,
            monitor.y().ok()?,
            monitor.width().ok()?,
            monitor.height().ok()?,
        );
        (!bounds.is_empty()).then_some(bounds)
    }
}

impl TargetProvider for ScreenTargets {
    fn list(&self) -> Vec<TargetInfo> {
        let mut targets = Vec::new();

        match Window::all() {
            Ok(windows) => {
                for window in windows {
                    let title = window.title().unwrap_or_default();
                    if title.trim().is_empty() {
                        continue;
                    }
                    let (Ok(id), Some(bounds)) = (window.id(), Self::window_bounds(&window)) else {
                        continue;
                    };
                    let app = window.app_name().unwrap_or_default();
                    let label = if app.is_empty() {
                        title
                    } else {
                        format!("{} — {}", app, title)
                    };
                    targets.push(TargetInfo {
                        target: CaptureTarget::Window { id },
                        label,
                        bounds,
                        is_primary: false,
                    });
                }
            }
            Err(e) => log::warn!("[CAPTURE] Window enumeration failed: {}", e),
        }

        match Monitor::all() {
            Ok(monitors) => {
                for (index, monitor) in monitors.iter().enumerate() {
                    let Some(bounds) = Self::monitor_bounds(monitor) else {
                        continue;
                    };
                    let name = monitor.name().unwrap_or_default();
                    targets.push(TargetInfo {
                        target: CaptureTarget::Monitor { index },
                        label: format!(
                            "Monitor {}: {} ({}x{})",
                            index + 1,
                            name,
                            bounds.width,
                            bounds.height
                        ),
                        bounds,
                        is_primary: monitor.is_primary().unwrap_or(false),
                    });
                }
            }
            Err(e) => log::warn!("[CAPTURE] Monitor enumeration failed: {}", e),
        }

        targets
    }

    fn bounds(&self, target: &CaptureTarget) -> Option<Bounds> {
        match *target {
            CaptureTarget::Window { id } => Window::all()
                .ok()?
                .iter()
                .find(|w| w.id().map(|wid| wid == id).unwrap_or(false))
                .and_then(Self::window_bounds),
            CaptureTarget::Monitor { index } => Monitor::all()
                .ok()?
                .get(index)
                .and_then(Self::monitor_bounds),
        }
    }
}
