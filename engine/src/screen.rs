//! Virtual screen geometry: world-space points to pixels and back.
//!
//! The screen plane passes through the world origin (bottom-center of
//! the display). Tilt rotates the display about the x axis so that its
//! top leans away from the user; 0 degrees is upright. Pixel y grows
//! upward from the bottom edge.

use crate::math::{add3, dot3, scale3, sub3};

/// A world point expressed in screen terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Pixel position of the point projected onto the plane.
    pub pixel: [f32; 2],
    /// Signed distance from the plane in meters, positive in front.
    pub distance: f32,
}

/// Physical display description plus derived projection axes.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualScreen {
    pub width_px: u32,
    pub height_px: u32,
    pub height_m: f32,
    pub tilt_deg: f32,
    width_m: f32,
    pixels_per_meter: f32,
    /// Unit normal pointing out of the display toward the user.
    normal: [f32; 3],
    /// Unit in-plane axis pointing toward the top edge.
    up: [f32; 3],
}

impl VirtualScreen {
    /// Build a screen; dimensions are validated by the config layer.
    pub fn new(width_px: u32, height_px: u32, height_m: f32, tilt_deg: f32) -> Self {
        let tilt = tilt_deg.to_radians();
        let (sin, cos) = tilt.sin_cos();
        let pixels_per_meter = height_px as f32 / height_m;
        Self {
            width_px,
            height_px,
            height_m,
            tilt_deg,
            width_m: width_px as f32 / pixels_per_meter,
            pixels_per_meter,
            normal: [0.0, sin, cos],
            up: [0.0, cos, -sin],
        }
    }

    pub fn width_m(&self) -> f32 {
        self.width_m
    }

    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    /// Unit normal pointing out of the display toward the user.
    pub fn normal(&self) -> [f32; 3] {
        self.normal
    }

    /// Signed distance of a world point from the plane.
    pub fn distance_from_plane(&self, world: [f32; 3]) -> f32 {
        dot3(world, self.normal)
    }

    /// Project a world point along the plane normal.
    pub fn world_to_screen(&self, world: [f32; 3]) -> ScreenPoint {
        let distance = self.distance_from_plane(world);
        let on_plane = sub3(world, scale3(self.normal, distance));
        let meters = [on_plane[0] + self.width_m / 2.0, dot3(on_plane, self.up)];
        ScreenPoint {
            pixel: self.meters_to_pixels(meters),
            distance,
        }
    }

    /// Inverse of [`world_to_screen`](Self::world_to_screen).
    pub fn screen_to_world(&self, pixel: [f32; 2], distance: f32) -> [f32; 3] {
        let meters = self.pixels_to_meters(pixel);
        let across = [meters[0] - self.width_m / 2.0, 0.0, 0.0];
        let along = scale3(self.up, meters[1]);
        add3(add3(across, along), scale3(self.normal, distance))
    }

    pub fn pixels_to_meters(&self, pixel: [f32; 2]) -> [f32; 2] {
        [
            pixel[0] / self.pixels_per_meter,
            pixel[1] / self.pixels_per_meter,
        ]
    }

    pub fn meters_to_pixels(&self, meters: [f32; 2]) -> [f32; 2] {
        [
            meters[0] * self.pixels_per_meter,
            meters[1] * self.pixels_per_meter,
        ]
    }

    pub fn pixels_to_meters_scalar(&self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }

    pub fn meters_to_pixels_scalar(&self, meters: f32) -> f32 {
        meters * self.pixels_per_meter
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:width-px {} :height-px {} :height-m {:.4} :width-m {:.4} :tilt-deg {:.1})",
            self.width_px, self.height_px, self.height_m, self.width_m, self.tilt_deg,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
