//! Minimal 3D scene: solid-color meshes, a perspective camera, orbit
//! controls, and the renderer that draws them into an off-screen target.

mod camera;
mod geometry;
mod orbit;
mod renderer;

pub use camera::PerspectiveCamera;
pub use geometry::{Geometry, Vertex};
pub use orbit::OrbitControls;
pub use renderer::SceneRenderer;

use glam::Mat4;

use crate::paint::Color;

/// A drawable: geometry, an unlit color and a model transform.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub color: Color,
    pub transform: Mat4,
}

impl Mesh {
    pub fn new(geometry: Geometry, color: Color) -> Self {
        Self {
            geometry,
            color,
            transform: Mat4::IDENTITY,
        }
    }
}

/// Background color plus a flat list of meshes.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub background: Color,
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            meshes: Vec::new(),
        }
    }

    /// Adds a mesh and returns its index.
    pub fn add(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}

/// What a pass renders: the scene, the camera looking at it, and the GPU
/// cache that draws it. Owned by the application and lent per frame.
pub struct SceneView<'a> {
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
    pub renderer: &'a mut SceneRenderer,
}
