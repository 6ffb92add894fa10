use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Position, Euler rotation (radians, applied X then Y then Z) and scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.position)
    }

    /// Inverse-transpose of the upper 3x3, for transforming normals.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix()).inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_by_default() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn rotation_about_y_turns_x_into_negative_z() {
        let t = Transform {
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..Default::default()
        };
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let t = Transform {
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..Default::default()
        };
        let n = t.normal_matrix() * Vec3::X;
        assert!((n - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }
}
