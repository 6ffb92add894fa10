use glam::Vec3;

use super::Color;

/// Light arriving from infinitely far away along one direction.
///
/// Like a positional light it is placed with `position` and aimed at
/// `target`; only the direction between the two matters for shading.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::Y,
            target: Vec3::ZERO,
        }
    }

    /// Unit vector from a lit surface toward the light.
    ///
    /// Degenerate placements (position == target) light straight down.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target)
            .try_normalize()
            .unwrap_or(Vec3::Y)
    }

    /// Color premultiplied by intensity, as the shader consumes it.
    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}
