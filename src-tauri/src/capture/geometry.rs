//! Capture geometry: where inside the target the capture rectangle sits.
//!
//! Offsets are relative to the target's top-left corner. Every mutation
//! re-clamps so that `offset + size` never leaves the target bounds; when
//! the two disagree, the offset wins and the size shrinks.

use super::target::{Bounds, CaptureTarget};
use serde::{Deserialize, Serialize};

/// How the rectangle is derived from the target bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Full target width from the top-left corner; height follows as
    /// `width / 2` unless overridden with `set_height`.
    #[default]
    Window,
    /// Centered equirectangular crop: `width == 2 * height` always.
    Monitor,
}

/// Capture rectangle in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CaptureRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Result of reconciling the model against freshly queried bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryStatus {
    Valid(CaptureRect),
    /// The target is gone or has collapsed to nothing.
    Invalid,
}

/// Offset and size of the rectangle inside its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Serializable view of the model for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySnapshot {
    pub mode: CaptureMode,
    pub target: Option<CaptureTarget>,
    pub bounds: Bounds,
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    pub rect: CaptureRect,
}

/// Applies the clamp rules for `mode` to a placement inside `bounds`.
///
/// Idempotent: clamping an already clamped placement returns it unchanged.
pub fn clamp(mode: CaptureMode, placement: Placement, bounds: Bounds) -> Placement {
    if bounds.is_empty() {
        return Placement::default();
    }

    let offset_x = placement.offset_x.min(bounds.width - 1);
    let offset_y = placement.offset_y.min(bounds.height - 1);
    let room_x = bounds.width - offset_x;
    let room_y = bounds.height - offset_y;

    match mode {
        CaptureMode::Window => Placement {
            offset_x,
            offset_y,
            width: placement.width.min(room_x),
            height: placement.height.min(room_y),
        },
        CaptureMode::Monitor => {
            let width = placement
                .width
                .min(room_x)
                .min(room_y.saturating_mul(2));
            let width = width - width % 2;
            Placement {
                offset_x,
                offset_y,
                width,
                height: width / 2,
            }
        }
    }
}

/// Holds the selected target and the capture rectangle derived from it.
#[derive(Debug, Clone)]
pub struct GeometryModel {
    mode: CaptureMode,
    target: Option<CaptureTarget>,
    bounds: Bounds,
    placement: Placement,
}

impl GeometryModel {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            target: None,
            bounds: Bounds::default(),
            placement: Placement::default(),
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn target(&self) -> Option<CaptureTarget> {
        self.target
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Switches to a new target and derives a fresh rectangle for it.
    pub fn select_target(&mut self, target: CaptureTarget, bounds: Bounds) -> CaptureRect {
        self.target = Some(target);
        self.bounds = bounds;
        self.reset();
        log::debug!(
            "[GEOMETRY] Target {:?} selected, bounds {}x{}",
            target,
            bounds.width,
            bounds.height
        );
        self.current_rect()
    }

    /// Changes the derivation mode and re-derives the rectangle.
    pub fn set_mode(&mut self, mode: CaptureMode) -> CaptureRect {
        self.mode = mode;
        self.reset();
        self.current_rect()
    }

    /// Current rectangle in desktop coordinates.
    pub fn current_rect(&self) -> CaptureRect {
        CaptureRect {
            x: self.bounds.x.saturating_add(self.placement.offset_x as i32),
            y: self.bounds.y.saturating_add(self.placement.offset_y as i32),
            width: self.placement.width,
            height: self.placement.height,
        }
    }

    /// Moves the rectangle inside the target. Negative values clamp to 0.
    pub fn set_offset(&mut self, x: Option<i32>, y: Option<i32>) -> CaptureRect {
        if let Some(x) = x {
            self.placement.offset_x = x.max(0) as u32;
        }
        if let Some(y) = y {
            self.placement.offset_y = y.max(0) as u32;
        }
        self.apply_clamp();
        self.current_rect()
    }

    /// Sets the width and derives `height = width / 2`. Values of 0 or
    /// wider than the target are ignored.
    pub fn set_width(&mut self, width: u32) -> CaptureRect {
        if width == 0 || width > self.bounds.width {
            log::debug!(
                "[GEOMETRY] Ignoring width {} (target is {} wide)",
                width,
                self.bounds.width
            );
            return self.current_rect();
        }

        self.placement.width = width;
        self.placement.height = width / 2;
        self.apply_clamp();
        self.current_rect()
    }

    /// Overrides the derived height in window mode. In monitor mode this
    /// sets the width to `2 * height`.
    pub fn set_height(&mut self, height: u32) -> CaptureRect {
        if self.mode == CaptureMode::Monitor {
            return self.set_width(height.saturating_mul(2));
        }

        if height == 0 || height > self.bounds.height {
            log::debug!(
                "[GEOMETRY] Ignoring height {} (target is {} high)",
                height,
                self.bounds.height
            );
            return self.current_rect();
        }

        self.placement.height = height;
        self.apply_clamp();
        self.current_rect()
    }

    /// Reconciles the rectangle against freshly queried bounds.
    ///
    /// `None` means the target could not be found; the model keeps its last
    /// state and reports `Invalid` instead of failing.
    pub fn on_target_bounds_changed(&mut self, bounds: Option<Bounds>) -> GeometryStatus {
        let Some(bounds) = bounds.filter(|b| !b.is_empty()) else {
            return GeometryStatus::Invalid;
        };

        if bounds != self.bounds {
            log::debug!(
                "[GEOMETRY] Target bounds changed to {}x{} at ({},{})",
                bounds.width,
                bounds.height,
                bounds.x,
                bounds.y
            );
            self.bounds = bounds;
            self.apply_clamp();
        }

        GeometryStatus::Valid(self.current_rect())
    }

    pub fn snapshot(&self) -> GeometrySnapshot {
        GeometrySnapshot {
            mode: self.mode,
            target: self.target,
            bounds: self.bounds,
            offset_x: self.placement.offset_x,
            offset_y: self.placement.offset_y,
            width: self.placement.width,
            height: self.placement.height,
            rect: self.current_rect(),
        }
    }

    fn reset(&mut self) {
        let Bounds { width, height, .. } = self.bounds;
        self.placement = match self.mode {
            CaptureMode::Window => Placement {
                offset_x: 0,
                offset_y: 0,
                width,
                height: width / 2,
            },
            CaptureMode::Monitor => {
                let w = width.min(height.saturating_mul(2));
                let w = w - w % 2;
                let h = w / 2;
                Placement {
                    offset_x: (width - w) / 2,
                    offset_y: (height - h) / 2,
                    width: w,
                    height: h,
                }
            }
        };
        self.apply_clamp();
    }

    fn apply_clamp(&mut self) {
        let clamped = clamp(self.mode, self.placement, self.bounds);
        if clamped != self.placement {
            log::debug!("[GEOMETRY] Clamped {:?} to {:?}", self.placement, clamped);
            if clamped.width == 0 || clamped.height == 0 {
                log::debug!("[GEOMETRY] Offset leaves no room, rectangle is empty");
            }
        }
        self.placement = clamped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HD: Bounds = Bounds {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
    };

    fn window_model(bounds: Bounds) -> GeometryModel {
        let mut model = GeometryModel::new(CaptureMode::Window);
        model.select_target(CaptureTarget::Window { id: 1 }, bounds);
        model
    }

    fn monitor_model(bounds: Bounds) -> GeometryModel {
        let mut model = GeometryModel::new(CaptureMode::Monitor);
        model.select_target(CaptureTarget::Monitor { index: 0 }, bounds);
        model
    }

    #[test]
    fn window_selection_uses_full_width() {
        let model = window_model(FULL_HD);
        let rect = model.current_rect();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 1920, 960));
    }

    #[test]
    fn width_wider_than_target_is_ignored() {
        let mut model = window_model(FULL_HD);
        let rect = model.set_width(2000);
        assert_eq!(rect.width, 1920);
        assert_eq!(rect.height, 960);
    }

    #[test]
    fn zero_width_is_ignored() {
        let mut model = window_model(FULL_HD);
        assert_eq!(model.set_width(0).width, 1920);
    }

    #[test]
    fn offset_shrinks_width_not_offset() {
        let mut model = window_model(FULL_HD);
        let rect = model.set_offset(Some(500), None);
        assert_eq!(model.placement().offset_x, 500);
        assert_eq!(rect.width, 1420);
        assert_eq!(rect.x, 500);
    }

    #[test]
    fn offset_past_bounds_is_clamped_to_last_pixel() {
        let mut model = window_model(FULL_HD);
        model.set_offset(Some(5000), Some(-3));
        let p = model.placement();
        assert_eq!(p.offset_x, 1919);
        assert_eq!(p.offset_y, 0);
        assert_eq!(p.width, 1);
    }

    #[test]
    fn width_accepted_then_shrunk_by_offset() {
        let mut model = window_model(FULL_HD);
        model.set_offset(Some(100), None);
        let rect = model.set_width(1900);
        assert_eq!(rect.width, 1820);
    }

    #[test]
    fn offset_y_shrinks_height() {
        let mut model = window_model(FULL_HD);
        let rect = model.set_offset(None, Some(600));
        assert_eq!(rect.height, 480);
        assert_eq!(rect.width, 1920);
    }

    #[test]
    fn window_height_follows_width() {
        let mut model = window_model(FULL_HD);
        let rect = model.set_width(800);
        assert_eq!((rect.width, rect.height), (800, 400));
    }

    #[test]
    fn window_height_override_lasts_until_next_width() {
        let mut model = window_model(FULL_HD);
        model.set_width(800);
        let rect = model.set_height(300);
        assert_eq!((rect.width, rect.height), (800, 300));

        let rect = model.set_width(1000);
        assert_eq!((rect.width, rect.height), (1000, 500));
    }

    #[test]
    fn derived_window_height_is_clamped_by_offset() {
        let mut model = window_model(FULL_HD);
        model.set_offset(None, Some(900));
        let rect = model.set_width(1600);
        assert_eq!((rect.width, rect.height), (1600, 180));
    }

    #[test]
    fn monitor_offset_at_right_edge_collapses_rectangle() {
        let mut model = monitor_model(FULL_HD);
        let rect = model.set_offset(Some(1919), None);
        assert!(rect.is_empty());
        assert_eq!(model.placement().offset_x, 1919);
    }

    #[test]
    fn window_origin_follows_target() {
        let mut model = window_model(Bounds::new(-100, 50, 800, 600));
        model.set_offset(Some(10), Some(20));
        let rect = model.current_rect();
        assert_eq!((rect.x, rect.y), (-90, 70));
    }

    #[test]
    fn monitor_selection_is_centered_two_to_one() {
        let model = monitor_model(FULL_HD);
        let p = model.placement();
        assert_eq!((p.width, p.height), (1920, 960));
        assert_eq!((p.offset_x, p.offset_y), (0, 60));

        let tall = monitor_model(Bounds::new(0, 0, 1080, 1920));
        let p = tall.placement();
        assert_eq!((p.width, p.height), (1080, 540));
        assert_eq!((p.offset_x, p.offset_y), (0, 690));
    }

    #[test]
    fn monitor_mode_keeps_aspect_after_every_mutation() {
        let mut model = monitor_model(FULL_HD);
        let check = |m: &GeometryModel| {
            let p = m.placement();
            assert_eq!(p.width, 2 * p.height, "placement {:?}", p);
        };

        model.set_width(1001);
        check(&model);
        model.set_offset(Some(1500), None);
        check(&model);
        model.set_offset(Some(0), Some(1000));
        check(&model);
        model.set_height(200);
        check(&model);
        model.on_target_bounds_changed(Some(Bounds::new(0, 0, 333, 77)));
        check(&model);
    }

    #[test]
    fn monitor_set_height_drives_width() {
        let mut model = monitor_model(FULL_HD);
        model.set_offset(Some(0), Some(0));
        let rect = model.set_height(300);
        assert_eq!((rect.width, rect.height), (600, 300));
    }

    #[test]
    fn clamp_is_idempotent() {
        let cases = [
            (CaptureMode::Window, Placement { offset_x: 1800, offset_y: 900, width: 1920, height: 960 }),
            (CaptureMode::Monitor, Placement { offset_x: 1800, offset_y: 900, width: 1920, height: 960 }),
            (CaptureMode::Monitor, Placement { offset_x: 3, offset_y: 1079, width: 7, height: 3 }),
            (CaptureMode::Window, Placement { offset_x: 9999, offset_y: 9999, width: 0, height: 0 }),
        ];
        for (mode, placement) in cases {
            let once = clamp(mode, placement, FULL_HD);
            let twice = clamp(mode, once, FULL_HD);
            assert_eq!(once, twice, "mode {:?}", mode);
            assert!(once.offset_x + once.width <= FULL_HD.width);
            assert!(once.offset_y + once.height <= FULL_HD.height);
        }
    }

    #[test]
    fn shrinking_target_shrinks_rectangle() {
        let mut model = window_model(FULL_HD);
        model.set_offset(Some(200), Some(100));
        let status = model.on_target_bounds_changed(Some(Bounds::new(0, 0, 1000, 500)));
        let GeometryStatus::Valid(rect) = status else {
            panic!("expected valid geometry");
        };
        assert_eq!(rect.width, 800);
        assert_eq!(rect.height, 400);
    }

    #[test]
    fn growing_target_does_not_grow_rectangle() {
        let mut model = window_model(Bounds::new(0, 0, 800, 600));
        model.on_target_bounds_changed(Some(FULL_HD));
        assert_eq!(model.placement().width, 800);
    }

    #[test]
    fn missing_target_reports_invalid() {
        let mut model = window_model(FULL_HD);
        assert_eq!(model.on_target_bounds_changed(None), GeometryStatus::Invalid);
        assert_eq!(
            model.on_target_bounds_changed(Some(Bounds::new(0, 0, 0, 0))),
            GeometryStatus::Invalid
        );
        // Last good state is kept
        assert_eq!(model.current_rect().width, 1920);
    }

    #[test]
    fn switching_mode_rederives() {
        let mut model = window_model(FULL_HD);
        model.set_offset(Some(10), Some(10));
        let rect = model.set_mode(CaptureMode::Monitor);
        assert_eq!((rect.width, rect.height), (1920, 960));
        assert_eq!(rect.y, 60);
    }
}
