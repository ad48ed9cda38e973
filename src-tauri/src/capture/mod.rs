//! Screen capture domain — public API.
//!
//! This module owns targets, geometry and pixel acquisition.
//! External code should only use the items re-exported here.

mod frame;
mod geometry;
mod region;
mod screenshot;
mod target;

pub use frame::{FrameError, PixelFormat, RawFrame};
pub use geometry::{
    clamp, CaptureMode, CaptureRect, GeometryModel, GeometrySnapshot, GeometryStatus, Placement,
};
pub use region::{crop_region, CropError};
pub use screenshot::{CaptureError, FrameSource, ScreenFrameSource};
pub use target::{Bounds, CaptureTarget, ScreenTargets, TargetInfo, TargetProvider};
