//! The spinning cube: one green box lit by a white directional light.

use glam::Vec3;

use cubeloop_engine::scene::{
    Color, DirectionalLight, Geometry, Mesh, MeshId, PerspectiveCamera, PhongMaterial, Scene,
};

/// Euler rotation added to the cube every frame, in radians.
pub const ROTATION_STEP: Vec3 = Vec3::new(-0.005, 0.0075, 0.0);

pub struct CubeScene {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub cube: MeshId,
}

impl CubeScene {
    pub fn new(aspect: f32) -> Self {
        let mut scene = Scene::new();
        scene.background = Color::BLACK;

        let cube = scene.add_mesh(Mesh::new(
            Geometry::cuboid(1.0, 1.0, 1.0),
            PhongMaterial::new(Color::from_hex(0x00ff00)),
        ));

        let mut light = DirectionalLight::new(Color::from_hex(0xffffff), 1.0);
        light.position = Vec3::new(-1.0, 2.0, 4.0);
        scene.add_light(light);

        let mut camera = PerspectiveCamera::new(75.0, aspect, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.look_at(Vec3::ZERO);

        Self {
            scene,
            camera,
            cube,
        }
    }

    /// Advances the animation by one frame.
    pub fn step(&mut self) {
        if let Some(mesh) = self.scene.mesh_mut(self.cube) {
            mesh.transform.rotation += ROTATION_STEP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl CubeScene {
        fn cube_rotation(&self) -> Vec3 {
            self.scene
                .mesh(self.cube)
                .map_or(Vec3::ZERO, |m| m.transform.rotation)
        }
    }

    #[test]
    fn scene_holds_one_cube_and_one_light() {
        let cs = CubeScene::new(16.0 / 9.0);
        assert_eq!(cs.scene.meshes().len(), 1);
        assert_eq!(cs.scene.lights().len(), 1);
        assert_eq!(cs.camera.position, Vec3::new(0.0, 0.0, 5.0));
        assert!((cs.camera.forward - Vec3::NEG_Z).length() < 1e-6);
        assert_eq!(cs.cube_rotation(), Vec3::ZERO);
    }

    #[test]
    fn rotation_accumulates_per_step() {
        let mut cs = CubeScene::new(1.0);
        for _ in 0..200 {
            cs.step();
        }

        let r = cs.cube_rotation();
        assert!((r.x + 1.0).abs() < 1e-4, "x = {}", r.x);
        assert!((r.y - 1.5).abs() < 1e-4, "y = {}", r.y);
        assert_eq!(r.z, 0.0);
    }
}
