// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback transport and timeline view state.
//!
//! The engine holds the playhead but never advances it: an external clock
//! drives progression by calling `seek_to`. All setters clamp.

use serde::{Deserialize, Serialize};

/// Minimum zoom factor
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum zoom factor
pub const MAX_ZOOM: f64 = 10.0;

/// Persisted playback settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Playhead position in seconds
    pub current_time: f64,
    /// Output volume in `[0, 1]`
    pub volume: f64,
    /// Whether playback loops at the end
    pub looping: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            volume: 1.0,
            looping: false,
        }
    }
}

impl PlaybackSettings {
    /// Move the playhead, clamped into `[0, duration]`
    pub fn seek(&mut self, time: f64, duration: f64) -> f64 {
        self.current_time = time.clamp(0.0, duration.max(0.0));
        self.current_time
    }

    /// Set the volume, clamped into `[0, 1]`
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }

    /// Convert the playhead to a frame number
    pub fn frame(&self, fps: f64) -> u64 {
        (self.current_time * fps).floor().max(0.0) as u64
    }
}

/// Persisted view settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Horizontal zoom factor
    pub zoom: f64,
    /// Horizontal scroll offset in pixels
    pub scroll_x: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            scroll_x: 0.0,
        }
    }
}

impl ViewSettings {
    /// Set the zoom, clamped into `[MIN_ZOOM, MAX_ZOOM]`
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom
    }

    /// Set the scroll offset, clamped to be non-negative
    pub fn set_scroll_x(&mut self, scroll_x: f64) -> f64 {
        self.scroll_x = scroll_x.max(0.0);
        self.scroll_x
    }

    /// Pixels per second at the current zoom
    pub fn pixels_per_second(&self, base_pixels_per_second: f64) -> f64 {
        base_pixels_per_second * self.zoom
    }

    /// Zoom level that fits `span` seconds into `viewport_width` pixels.
    /// A zero-length span yields the maximum zoom.
    pub fn fit_zoom(span: f64, viewport_width: f64, base_pixels_per_second: f64) -> f64 {
        if span <= 0.0 || base_pixels_per_second <= 0.0 {
            return MAX_ZOOM;
        }
        (viewport_width / (span * base_pixels_per_second)).clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// Convert a pixel offset to time
    pub fn pixel_to_time(&self, x: f64, base_pixels_per_second: f64) -> f64 {
        (x + self.scroll_x) / self.pixels_per_second(base_pixels_per_second)
    }

    /// Convert time to a pixel offset relative to the scrolled view
    pub fn time_to_pixel(&self, time: f64, base_pixels_per_second: f64) -> f64 {
        time * self.pixels_per_second(base_pixels_per_second) - self.scroll_x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_clamps() {
        let mut playback = PlaybackSettings::default();
        assert_eq!(playback.seek(-5.0, 30.0), 0.0);
        assert_eq!(playback.seek(45.0, 30.0), 30.0);
        assert_eq!(playback.seek(12.5, 30.0), 12.5);
    }

    #[test]
    fn test_volume_clamps() {
        let mut playback = PlaybackSettings::default();
        assert_eq!(playback.set_volume(-1.0), 0.0);
        assert_eq!(playback.set_volume(2.0), 1.0);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut view = ViewSettings::default();
        assert_eq!(view.set_zoom(0.0), 0.1);
        assert_eq!(view.set_zoom(1000.0), 10.0);
        assert_eq!(view.pixels_per_second(100.0), 1000.0);
        assert_eq!(view.set_scroll_x(-20.0), 0.0);
    }

    #[test]
    fn test_fit_zoom() {
        assert_eq!(ViewSettings::fit_zoom(12.0, 1200.0, 100.0), 1.0);
        assert_eq!(ViewSettings::fit_zoom(0.0, 1200.0, 100.0), MAX_ZOOM);
        assert_eq!(ViewSettings::fit_zoom(10_000.0, 1200.0, 100.0), MIN_ZOOM);
    }

    #[test]
    fn test_pixel_time_conversion() {
        let view = ViewSettings {
            zoom: 2.0,
            scroll_x: 100.0,
        };
        assert_eq!(view.time_to_pixel(1.0, 100.0), 100.0);
        assert_eq!(view.pixel_to_time(100.0, 100.0), 1.0);
    }

    #[test]
    fn test_frame() {
        let playback = PlaybackSettings {
            current_time: 2.5,
            ..Default::default()
        };
        assert_eq!(playback.frame(30.0), 75);
    }
}
