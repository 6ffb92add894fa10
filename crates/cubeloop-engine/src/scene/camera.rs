use glam::{Mat4, Vec3};

use crate::coords::Viewport;

/// Right-handed perspective camera looking down its local -Z axis.
///
/// The aspect ratio is not tied to any window; callers refresh it from the
/// current surface size before drawing (see [`update_aspect`](Self::update_aspect)).
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view, in degrees.
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Unit view direction.
    pub forward: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        debug_assert!(near > 0.0 && far > near);
        Self {
            fov_y_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    /// Turns the camera to face `target`. No-op when `target` is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(dir) = (target - self.position).try_normalize() {
            self.forward = dir;
        }
    }

    /// Recomputes the aspect ratio from the drawable size.
    ///
    /// Returns `false` and keeps the previous ratio for a zero-sized surface.
    pub fn update_aspect(&mut self, viewport: Viewport) -> bool {
        match viewport.aspect_ratio() {
            Some(aspect) => {
                self.aspect = aspect;
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    /// wgpu clip space (depth in `0..1`).
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn camera_at_z5() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 1000.0);
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let clip = camera_at_z5().view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn points_behind_the_camera_are_clipped() {
        let clip = camera_at_z5().view_projection() * Vec4::new(0.0, 0.0, 10.0, 1.0);
        assert!(clip.w < 0.0);
    }

    #[test]
    fn aspect_follows_surface_size() {
        let mut cam = camera_at_z5();
        assert!(cam.update_aspect(Viewport::new(800, 800)));
        assert_eq!(cam.aspect, 1.0);

        assert!(!cam.update_aspect(Viewport::new(0, 0)));
        assert_eq!(cam.aspect, 1.0);
    }

    #[test]
    fn look_at_own_position_keeps_direction() {
        let mut cam = camera_at_z5();
        cam.look_at(cam.position);
        assert_eq!(cam.forward, Vec3::NEG_Z);

        cam.look_at(Vec3::new(0.0, 0.0, 10.0));
        assert!((cam.forward - Vec3::Z).length() < 1e-6);
    }
}
