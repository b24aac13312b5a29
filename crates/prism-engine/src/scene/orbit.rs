use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::input::{InputFrame, InputState, MouseButton};

use super::PerspectiveCamera;

/// Orbits a camera around a target point.
///
/// Left drag rotates, right drag pans, the wheel dollies in and out.
/// Rotation is expressed in spherical coordinates around `target`
/// (`theta` around +Y, `phi` from +Y).
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub target: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
}

const PHI_EPS: f32 = 1e-4;

impl OrbitControls {
    /// Starts from wherever `camera` currently sits relative to its target.
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.length().max(1e-3);

        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 0.5,
            max_distance: 100.0,

            target: camera.target,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Applies this frame's input and writes the resulting pose to `camera`.
    ///
    /// `viewport_height` is in the same logical pixels as the pointer deltas.
    pub fn update(
        &mut self,
        camera: &mut PerspectiveCamera,
        input: &InputState,
        frame: &InputFrame,
        viewport_height: f32,
        dt: f32,
    ) {
        let screen_height = viewport_height.max(1.0);
        let (dx, dy) = frame.pointer_delta;

        if input.button_down(MouseButton::Left) {
            let per_pixel = 2.0 * PI / screen_height * self.rotate_speed;
            self.rotate_delta.x -= dx * per_pixel;
            self.rotate_delta.y -= dy * per_pixel;
        }

        if self.enable_damping {
            let retention = (1.0 - self.damping_factor).powf(dt * 60.0);
            let applied = self.rotate_delta * (1.0 - retention);
            self.theta += applied.x;
            self.phi += applied.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }
        self.phi = self.phi.clamp(PHI_EPS, PI - PHI_EPS);

        if frame.wheel_lines != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(frame.wheel_lines.abs());
            if frame.wheel_lines > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        }

        if input.button_down(MouseButton::Right) {
            let half_fov = camera.fov_y_degrees.to_radians() * 0.5;
            let world_per_pixel = 2.0 * self.radius * half_fov.tan() / screen_height;

            let forward = -self.offset_dir();
            let right = forward.cross(Vec3::Y).normalize();
            let up = right.cross(forward).normalize();

            self.target += (right * -dx + up * dy) * world_per_pixel * self.pan_speed;
        }

        camera.target = self.target;
        camera.position = self.target + self.offset_dir() * self.radius;
        camera.up = Vec3::Y;
    }

    fn offset_dir(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }
}
