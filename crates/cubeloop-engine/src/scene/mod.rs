//! Scene description consumed by the mesh renderer.
//!
//! A flat list of meshes and lights owned by the caller. There is no
//! hierarchy; each mesh carries its own world transform.

mod camera;
mod color;
mod geometry;
mod light;
mod material;
mod transform;

pub use camera::PerspectiveCamera;
pub use color::Color;
pub use geometry::{Geometry, Vertex};
pub use light::DirectionalLight;
pub use material::PhongMaterial;
pub use transform::Transform;

/// Geometry + material + placement.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: PhongMaterial,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: PhongMaterial) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::default(),
        }
    }
}

/// Index of a mesh inside its [`Scene`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshId(usize);

/// Everything the renderer draws in one pass.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    /// Uniform light added to every surface regardless of orientation.
    pub ambient: Color,
    meshes: Vec<Mesh>,
    lights: Vec<DirectionalLight>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: Color::BLACK,
            ambient: Color::BLACK,
            meshes: Vec::new(),
            lights: Vec::new(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn lights(&self) -> &[DirectionalLight] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_ids_address_their_mesh() {
        let mut scene = Scene::new();
        let a = scene.add_mesh(Mesh::new(Geometry::cuboid(1.0, 1.0, 1.0), PhongMaterial::default()));
        let b = scene.add_mesh(Mesh::new(
            Geometry::cuboid(2.0, 2.0, 2.0),
            PhongMaterial::new(Color::from_hex(0xff0000)),
        ));

        assert_ne!(a, b);
        scene.mesh_mut(a).unwrap().transform.rotation.x = 1.0;
        assert_eq!(scene.mesh(a).unwrap().transform.rotation.x, 1.0);
        assert_eq!(scene.mesh(b).unwrap().transform.rotation.x, 0.0);
        assert_eq!(scene.meshes().len(), 2);
    }

    #[test]
    fn empty_scene_is_black() {
        let scene = Scene::default();
        assert_eq!(scene.background, Color::BLACK);
        assert!(scene.lights().is_empty());
    }
}
