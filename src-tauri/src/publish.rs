//! Result publication — hands histograms and previews to the display layer.
//!
//! The publisher is called from the capture worker. It encodes the preview
//! there, swaps the result into a mutex-guarded store in one step, and
//! notifies a `PreviewSink`. The sink is the only part that knows about the
//! presentation context; the Tauri one forwards to webview events.

use crate::capture::RawFrame;
use crate::histogram::Histogram;
use crate::preview::{encode_preview, PreviewFormat, PreviewImage};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Consumer side of the capture loop.
pub trait ResultPublisher: Send + Sync {
    /// Publishes one iteration's result. Takes the frame by value and
    /// drops it before returning.
    fn publish(&self, histogram: Histogram, frame: RawFrame);

    /// The loop ended because its target disappeared.
    fn notify_target_lost(&self);
}

/// Receives publications on behalf of the presentation layer.
pub trait PreviewSink: Send + Sync {
    fn histogram_updated(&self, update: &HistogramUpdate);
    fn target_lost(&self);
}

/// Where a published frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameOrigin {
    Capture,
    Import,
}

/// The observable state: last histogram plus its preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramUpdate {
    pub sequence: u64,
    pub histogram: Histogram,
    pub total: u64,
    pub peak: u32,
    /// Fixed y-axis ceiling for the chart, 0 = automatic.
    pub scale_y: u32,
    pub preview: Option<PreviewImage>,
    pub source: FrameOrigin,
}

#[derive(Debug, Clone, Copy)]
struct PublishSettings {
    format: PreviewFormat,
    scale_y: u32,
    min_interval: Duration,
}

#[derive(Default)]
struct Published {
    sequence: u64,
    latest: Option<HistogramUpdate>,
    last_capture_at: Option<Instant>,
}

/// Encodes, stores and forwards results to a sink.
pub struct Publisher<S: PreviewSink> {
    sink: S,
    settings: Mutex<PublishSettings>,
    state: Mutex<Published>,
}

impl<S: PreviewSink> Publisher<S> {
    pub fn new(sink: S, format: PreviewFormat, scale_y: u32, min_interval: Duration) -> Self {
        Self {
            sink,
            settings: Mutex::new(PublishSettings {
                format,
                scale_y,
                min_interval,
            }),
            state: Mutex::new(Published::default()),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Last successful publication, if any.
    pub fn latest(&self) -> Option<HistogramUpdate> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    pub fn scale_y(&self) -> u32 {
        self.settings().scale_y
    }

    pub fn set_scale_y(&self, scale_y: u32) {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scale_y = scale_y;
    }

    /// Publishes a result. Live captures arriving faster than the minimum
    /// interval are dropped; imports always go through.
    ///
    /// Returns the published update, or `None` if it was dropped.
    pub fn publish_from(
        &self,
        origin: FrameOrigin,
        histogram: Histogram,
        frame: RawFrame,
    ) -> Option<HistogramUpdate> {
        let settings = self.settings();

        if origin == FrameOrigin::Capture {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            if let Some(last) = state.last_capture_at {
                if now.duration_since(last) < settings.min_interval {
                    log::debug!("[PUBLISH] Dropping frame inside rate bound");
                    return None;
                }
            }
            state.last_capture_at = Some(now);
        }

        let start = Instant::now();
        let preview = match encode_preview(&frame, settings.format) {
            Ok(preview) => Some(preview),
            Err(e) => {
                log::warn!("[PUBLISH] {}", e);
                None
            }
        };
        drop(frame);

        let update = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.sequence += 1;
            let update = HistogramUpdate {
                sequence: state.sequence,
                total: histogram.total(),
                peak: histogram.peak(),
                histogram,
                scale_y: settings.scale_y,
                preview,
                source: origin,
            };
            state.latest = Some(update.clone());
            update
        };

        log::debug!(
            "[PUBLISH] #{} ({} px) encoded in {}ms",
            update.sequence,
            update.total,
            start.elapsed().as_millis()
        );

        self.sink.histogram_updated(&update);
        Some(update)
    }

    fn settings(&self) -> PublishSettings {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: PreviewSink> ResultPublisher for Publisher<S> {
    fn publish(&self, histogram: Histogram, frame: RawFrame) {
        self.publish_from(FrameOrigin::Capture, histogram, frame);
    }

    fn notify_target_lost(&self) {
        log::info!("[PUBLISH] Target lost, keeping last result");
        self.sink.target_lost();
    }
}
