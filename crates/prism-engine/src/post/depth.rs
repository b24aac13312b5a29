//! Depth linearization.
//!
//! The camera uses a right-handed perspective projection with a `[0, 1]` depth
//! range (`glam::Mat4::perspective_rh`, the wgpu convention): the near plane
//! stores 0, the far plane stores 1, and stored depth is hyperbolic in view
//! distance. The functions here invert that mapping exactly and remap view
//! depth onto a linear `[0, 1]` ramp. `shaders/linear_depth.wgsl` carries the
//! same two functions; this module is the reference for them.

/// Near/far clip distances captured from a camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

impl ClipPlanes {
    /// Taken as given. Linearization is only meaningful for `0 < near < far`.
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Stored depth `d` to linear depth in one step.
    #[inline]
    pub fn linearize(self, d: f32) -> f32 {
        let view_z = perspective_depth_to_view_z(d, self.near, self.far);
        view_z_to_orthographic_depth(view_z, self.near, self.far)
    }
}

/// Inverts the projection's depth term: stored depth `d` to view-space z.
///
/// View space looks down -Z, so the result is negative (`-near` at `d = 0`,
/// `-far` at `d = 1`).
#[inline]
pub fn perspective_depth_to_view_z(d: f32, near: f32, far: f32) -> f32 {
    (near * far) / ((far - near) * d - far)
}

/// Maps view-space z onto `[0, 1]`: 0 at the near plane, 1 at the far plane.
#[inline]
pub fn view_z_to_orthographic_depth(view_z: f32, near: f32, far: f32) -> f32 {
    (view_z + near) / (near - far)
}

/// The forward direction: view-space z to stored depth. Used to check the
/// inverse against the real projection matrix.
#[inline]
pub fn view_z_to_perspective_depth(view_z: f32, near: f32, far: f32) -> f32 {
    (far * (view_z + near)) / ((far - near) * view_z)
}

/// GPU layout of [`ClipPlanes`] (padded to 16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct ClipPlanesUniform {
    pub near: f32,
    pub far: f32,
    pub _pad: [f32; 2],
}

impl From<ClipPlanes> for ClipPlanesUniform {
    fn from(p: ClipPlanes) -> Self {
        Self {
            near: p.near,
            far: p.far,
            _pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec4};

    const NEAR: f32 = 0.1;
    const FAR: f32 = 8.0;

    fn planes() -> ClipPlanes {
        ClipPlanes::new(NEAR, FAR)
    }

    /// Stored depth for a point at `view_z`, via the actual projection matrix.
    fn project(view_z: f32) -> f32 {
        let proj = Mat4::perspective_rh(75f32.to_radians(), 16.0 / 9.0, NEAR, FAR);
        let clip = proj * Vec4::new(0.0, 0.0, view_z, 1.0);
        clip.z / clip.w
    }

    // ── boundaries ────────────────────────────────────────────────────────

    #[test]
    fn near_plane_is_zero() {
        assert!(planes().linearize(0.0).abs() < 1e-6);
        assert!((perspective_depth_to_view_z(0.0, NEAR, FAR) + NEAR).abs() < 1e-6);
    }

    #[test]
    fn far_plane_is_one() {
        assert!((planes().linearize(1.0) - 1.0).abs() < 1e-6);
        assert!((perspective_depth_to_view_z(1.0, NEAR, FAR) + FAR).abs() < 1e-4);
    }

    // ── inverse of the projection ─────────────────────────────────────────

    #[test]
    fn inverts_glam_perspective() {
        for view_z in [-0.1f32, -0.5, -1.0, -2.5, -5.0, -7.99] {
            let d = project(view_z);
            let back = perspective_depth_to_view_z(d, NEAR, FAR);
            assert!(
                (back - view_z).abs() < 1e-3 * view_z.abs(),
                "view_z {view_z} -> d {d} -> {back}"
            );
        }
    }

    #[test]
    fn forward_formula_matches_matrix() {
        for view_z in [-0.2f32, -1.0, -4.0] {
            let a = project(view_z);
            let b = view_z_to_perspective_depth(view_z, NEAR, FAR);
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn independent_of_fov_and_aspect() {
        let view_z = -3.0;
        for (fov, aspect) in [(30f32, 1.0f32), (75.0, 16.0 / 9.0), (110.0, 0.5)] {
            let proj = Mat4::perspective_rh(fov.to_radians(), aspect, NEAR, FAR);
            let clip = proj * Vec4::new(0.4, -0.7, view_z, 1.0);
            let l = planes().linearize(clip.z / clip.w);
            let expected = (view_z + NEAR) / (NEAR - FAR);
            assert!((l - expected).abs() < 1e-4);
        }
    }

    // ── shape ─────────────────────────────────────────────────────────────

    #[test]
    fn strictly_increasing_on_open_interval() {
        let p = planes();
        let mut prev = p.linearize(1e-4);
        for i in 2..10_000 {
            let d = i as f32 * 1e-4;
            let l = p.linearize(d);
            assert!(l > prev, "not increasing at d={d}: {prev} -> {l}");
            prev = l;
        }
    }

    #[test]
    fn linear_in_view_distance() {
        let p = planes();
        let a = p.linearize(project(-2.0));
        let b = p.linearize(project(-4.0));
        let c = p.linearize(project(-6.0));
        assert!(((b - a) - (c - b)).abs() < 1e-4);
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn one_unit_in_front_of_camera() {
        let l = planes().linearize(project(-1.0));
        assert!((l - 0.1139).abs() < 1e-3, "got {l}");
        assert!((l - (-1.0 + NEAR) / (NEAR - FAR)).abs() < 1e-4);
    }

    #[test]
    fn uniform_layout_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ClipPlanesUniform>(), 16);
    }

    // ── trusted parameters ───────────────────────────────────────────────

    #[test]
    fn inverted_planes_are_accepted_as_given() {
        let planes = ClipPlanes::new(8.0, 0.1);
        assert_eq!((planes.near, planes.far), (8.0, 0.1));

        let flat = ClipPlanes::new(1.0, 1.0);
        assert!(!flat.linearize(0.5).is_finite());
    }
}
