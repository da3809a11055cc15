// SPDX-License-Identifier: MIT OR Apache-2.0
//! World/viewport coordinate transform.
//!
//! `viewport = world * scale + translate`. The world is a square with its
//! origin at the top-left corner.

use crate::config::CanvasConfig;
use egui::{pos2, Pos2, Rect, Vec2};

/// Pan/zoom snapshot, used for notifications
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Viewport offset in pixels
    pub translate: Vec2,
    /// Zoom factor
    pub scale: f32,
}

/// Clamp a top-left position so a rectangle of `size` stays inside the world.
///
/// When the rectangle is at least as large as the world on an axis, that
/// axis collapses to `0`.
pub fn clamp_to_world(position: Pos2, size: Vec2, world_size: f32) -> Pos2 {
    let max_x = (world_size - size.x).max(0.0);
    let max_y = (world_size - size.y).max(0.0);
    pos2(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

/// Pan/zoom state of the viewport over the world
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSystem {
    translate: Vec2,
    scale: f32,
    world_size: f32,
    min_scale: f32,
    max_scale: f32,
}

impl CoordinateSystem {
    /// Identity transform over a world of the given size
    pub fn new(world_size: f32, min_scale: f32, max_scale: f32) -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0_f32.clamp(min_scale, max_scale),
            world_size,
            min_scale,
            max_scale,
        }
    }

    /// Identity transform using the config's world size and scale range
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.world_size, config.min_scale, config.max_scale)
    }

    /// Viewport offset in pixels
    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    /// Current zoom factor
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Side length of the world
    pub fn world_size(&self) -> f32 {
        self.world_size
    }

    /// Current pan/zoom
    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            translate: self.translate,
            scale: self.scale,
        }
    }

    /// Convert a viewport position to world space
    pub fn viewport_to_world(&self, point: Pos2) -> Pos2 {
        ((point.to_vec2() - self.translate) / self.scale).to_pos2()
    }

    /// Convert a world position to viewport space
    pub fn world_to_viewport(&self, point: Pos2) -> Pos2 {
        (point.to_vec2() * self.scale + self.translate).to_pos2()
    }

    /// Convert a viewport-space distance to world space
    pub fn viewport_delta_to_world(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    /// Zoom by `factor` keeping the world point under `anchor` fixed.
    ///
    /// Returns whether the scale changed.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }

        let world = self.viewport_to_world(anchor);
        let scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if scale == self.scale {
            return false;
        }

        self.scale = scale;
        self.translate = anchor.to_vec2() - world.to_vec2() * scale;
        true
    }

    /// Move the viewport by a pixel delta
    pub fn pan(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Clamp a node position into the world
    pub fn clamp_to_world(&self, position: Pos2, size: Vec2) -> Pos2 {
        clamp_to_world(position, size, self.world_size)
    }

    /// Pan so `point` sits at the centre of a viewport of `viewport_size`
    pub fn center_on(&mut self, point: Pos2, viewport_size: Vec2) {
        self.translate = viewport_size / 2.0 - point.to_vec2() * self.scale;
    }

    /// World-space rectangle visible in a viewport of `viewport_size`
    pub fn visible_world_rect(&self, viewport_size: Vec2) -> Rect {
        Rect::from_min_max(
            self.viewport_to_world(Pos2::ZERO),
            self.viewport_to_world(viewport_size.to_pos2()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    const EPSILON: f32 = 1e-3;

    fn assert_close(a: Pos2, b: Pos2) {
        assert!(
            (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_clamp_to_world() {
        let coords = CoordinateSystem::new(100_000.0, 0.1, 4.0);
        assert_eq!(
            coords.clamp_to_world(pos2(-50.0, -50.0), vec2(160.0, 80.0)),
            pos2(0.0, 0.0)
        );
        assert_eq!(
            coords.clamp_to_world(pos2(99_990.0, 50.0), vec2(160.0, 80.0)),
            pos2(99_840.0, 50.0)
        );
    }

    #[test]
    fn test_clamp_oversized_collapses_to_zero() {
        assert_eq!(
            clamp_to_world(pos2(30.0, 30.0), vec2(200.0, 10.0), 100.0),
            pos2(0.0, 30.0)
        );
    }

    #[test]
    fn test_round_trip() {
        let mut coords = CoordinateSystem::new(100_000.0, 0.1, 4.0);
        coords.pan(vec2(-250.0, 40.0));
        coords.zoom_at(pos2(100.0, 100.0), 2.5);
        let world = pos2(1234.5, 678.0);
        assert_close(coords.viewport_to_world(coords.world_to_viewport(world)), world);
    }

    #[test]
    fn test_zoom_is_anchor_stable() {
        let mut coords = CoordinateSystem::new(100_000.0, 0.1, 4.0);
        coords.pan(vec2(-320.0, 75.0));
        let anchor = pos2(400.0, 300.0);

        for factor in [1.5, 0.5, 1.1, 0.9, 3.0] {
            let before = coords.viewport_to_world(anchor);
            coords.zoom_at(anchor, factor);
            assert_close(coords.viewport_to_world(anchor), before);
        }
    }

    #[test]
    fn test_zoom_clamps_scale() {
        let mut coords = CoordinateSystem::new(100_000.0, 0.1, 4.0);
        assert!(coords.zoom_at(pos2(0.0, 0.0), 100.0));
        assert_eq!(coords.scale(), 4.0);
        assert!(!coords.zoom_at(pos2(0.0, 0.0), 2.0));
        assert!(!coords.zoom_at(pos2(0.0, 0.0), -1.0));
    }

    #[test]
    fn test_pan_leaves_scale() {
        let mut coords = CoordinateSystem::new(100_000.0, 0.1, 4.0);
        coords.zoom_at(pos2(0.0, 0.0), 2.0);
        coords.pan(vec2(10.0, -5.0));
        assert_eq!(coords.scale(), 2.0);
        assert_eq!(coords.translate(), vec2(10.0, -5.0));
    }

    #[test]
    fn test_center_on() {
        let mut coords = CoordinateSystem::new(100_000.0, 0.1, 4.0);
        coords.center_on(pos2(50_000.0, 50_000.0), vec2(800.0, 600.0));
        assert_close(
            coords.world_to_viewport(pos2(50_000.0, 50_000.0)),
            pos2(400.0, 300.0),
        );
        let visible = coords.visible_world_rect(vec2(800.0, 600.0));
        assert_close(visible.center(), pos2(50_000.0, 50_000.0));
    }
}
