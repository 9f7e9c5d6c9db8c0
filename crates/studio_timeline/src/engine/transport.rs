// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback transport and view operations.
//!
//! These edit the live project's playback/view settings in place. They are
//! not document mutations: no history is recorded and the revision is left
//! alone.

use super::TimelineEngine;
use crate::error::{ensure_finite, Result};
use crate::events::TimelineEvent;
use crate::playback::{PlaybackSettings, ViewSettings};

impl TimelineEngine {
    fn edit_playback<T>(&mut self, f: impl FnOnce(&mut PlaybackSettings, f64) -> T) -> Result<T> {
        let project = self.live_mut()?;
        let duration = project.duration;
        let value = f(&mut project.playback, duration);
        self.emit(TimelineEvent::PlaybackChanged);
        Ok(value)
    }

    fn edit_view<T>(&mut self, f: impl FnOnce(&mut ViewSettings) -> T) -> Result<T> {
        let value = f(&mut self.live_mut()?.view);
        self.emit(TimelineEvent::ViewChanged);
        Ok(value)
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Start playback. The engine does not advance time itself; an external
    /// clock drives the playhead through [`seek_to`](Self::seek_to).
    pub fn play(&mut self) -> Result<()> {
        self.set_playing(true)
    }

    /// Pause playback
    pub fn pause(&mut self) -> Result<()> {
        self.set_playing(false)
    }

    /// Stop playback and rewind to zero
    pub fn stop(&mut self) -> Result<()> {
        self.live()?;
        self.is_playing = false;
        self.edit_playback(|playback, duration| {
            playback.seek(0.0, duration);
        })
    }

    /// Flip between playing and paused; returns the new state
    pub fn toggle_playback(&mut self) -> Result<bool> {
        let playing = !self.is_playing;
        self.set_playing(playing)?;
        Ok(playing)
    }

    fn set_playing(&mut self, playing: bool) -> Result<()> {
        self.live()?;
        if self.is_playing != playing {
            self.is_playing = playing;
            self.emit(TimelineEvent::PlaybackChanged);
        }
        Ok(())
    }

    /// Move the playhead, clamped into `[0, duration]`
    pub fn seek_to(&mut self, time: f64) -> Result<f64> {
        let time = ensure_finite("time", time)?;
        self.edit_playback(|playback, duration| playback.seek(time, duration))
    }

    /// Playhead position in seconds
    pub fn current_time(&self) -> Result<f64> {
        Ok(self.live()?.playback.current_time)
    }

    /// Playhead position in frames
    pub fn current_frame(&self) -> Result<u64> {
        let project = self.live()?;
        Ok(project.playback.frame(project.fps))
    }

    /// Enable or disable looping
    pub fn set_loop(&mut self, looping: bool) -> Result<()> {
        self.edit_playback(|playback, _| playback.looping = looping)
    }

    /// Set the volume, clamped into `[0, 1]`
    pub fn set_volume(&mut self, volume: f64) -> Result<f64> {
        let volume = ensure_finite("volume", volume)?;
        self.edit_playback(|playback, _| playback.set_volume(volume))
    }

    /// Set the zoom, clamped into `[0.1, 10]`
    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64> {
        let zoom = ensure_finite("zoom", zoom)?;
        self.edit_view(|view| view.set_zoom(zoom))
    }

    /// Set the horizontal scroll, clamped to be non-negative
    pub fn set_scroll_x(&mut self, scroll_x: f64) -> Result<f64> {
        let scroll_x = ensure_finite("scroll", scroll_x)?;
        self.edit_view(|view| view.set_scroll_x(scroll_x))
    }

    /// Pixels per second at the current zoom
    pub fn pixels_per_second(&self) -> Result<f64> {
        Ok(self
            .live()?
            .view
            .pixels_per_second(self.config.base_pixels_per_second))
    }

    /// Fit the whole project duration into the viewport and scroll to the start.
    /// Returns the applied zoom.
    pub fn zoom_to_fit(&mut self) -> Result<f64> {
        let duration = self.live()?.duration;
        let zoom = ViewSettings::fit_zoom(
            duration,
            self.config.viewport_width,
            self.config.base_pixels_per_second,
        );
        self.edit_view(|view| {
            view.set_scroll_x(0.0);
            view.set_zoom(zoom)
        })
    }

    /// Fit the time span of the selected elements into the viewport and
    /// scroll to its start. Returns `false` when no element is selected.
    pub fn zoom_to_selection(&mut self) -> Result<bool> {
        let project = self.live()?;
        let (start, end) = self
            .selection
            .elements
            .iter()
            .filter_map(|id| project.element(*id))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e.start_time), hi.max(e.end_time()))
            });
        if start > end {
            return Ok(false);
        }

        let base = self.config.base_pixels_per_second;
        let zoom = ViewSettings::fit_zoom(end - start, self.config.viewport_width, base);
        self.edit_view(|view| {
            view.set_zoom(zoom);
            let scroll = start * view.pixels_per_second(base);
            view.set_scroll_x(scroll);
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementDraft, ElementType};
    use crate::track::{LayerDraft, TrackDraft};

    fn engine() -> TimelineEngine {
        let mut engine = TimelineEngine::new();
        engine.new_project("Test", Some(30.0)).unwrap();
        engine
    }

    #[test]
    fn test_clamps() {
        let mut engine = engine();
        assert_eq!(engine.set_zoom(0.0).unwrap(), 0.1);
        assert_eq!(engine.set_zoom(1000.0).unwrap(), 10.0);
        assert_eq!(engine.set_volume(-1.0).unwrap(), 0.0);
        assert_eq!(engine.set_volume(2.0).unwrap(), 1.0);
        assert_eq!(engine.seek_to(-3.0).unwrap(), 0.0);
        assert_eq!(engine.seek_to(99.0).unwrap(), 30.0);
        assert_eq!(engine.set_scroll_x(-1.0).unwrap(), 0.0);
        assert!(engine.set_zoom(f64::NAN).is_err());
    }

    #[test]
    fn test_transport() {
        let mut engine = engine();
        engine.play().unwrap();
        assert!(engine.is_playing());
        engine.seek_to(2.0).unwrap();
        assert_eq!(engine.current_frame().unwrap(), 60);
        engine.pause().unwrap();
        assert!(!engine.is_playing());
        assert!(engine.toggle_playback().unwrap());
        engine.stop().unwrap();
        assert!(!engine.is_playing());
        assert_eq!(engine.current_time().unwrap(), 0.0);
        engine.set_loop(true).unwrap();
        assert!(engine.project().unwrap().playback.looping);
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_zoom_to_fit() {
        let mut engine = engine();
        engine.set_scroll_x(500.0).unwrap();
        assert_eq!(engine.zoom_to_fit().unwrap(), 0.4);
        assert_eq!(engine.project().unwrap().view.scroll_x, 0.0);
        assert_eq!(engine.pixels_per_second().unwrap(), 40.0);
    }

    #[test]
    fn test_zoom_to_selection() {
        let mut engine = engine();
        assert!(!engine.zoom_to_selection().unwrap());

        let track = engine.add_track(TrackDraft::default()).unwrap();
        let layer = engine.add_layer(track, LayerDraft::default()).unwrap();
        let a = engine
            .add_element(layer, ElementDraft::new(ElementType::Video, 4.0, 2.0))
            .unwrap();
        let b = engine
            .add_element(layer, ElementDraft::new(ElementType::Video, 6.0, 4.0))
            .unwrap();
        engine.select_element(a, false).unwrap();
        engine.select_element(b, true).unwrap();

        assert!(engine.zoom_to_selection().unwrap());
        let view = engine.project().unwrap().view;
        assert_eq!(view.zoom, 2.0);
        assert_eq!(view.scroll_x, 800.0);
    }
}
