use crate::render::RenderCtx;
use crate::scene::{PerspectiveCamera, SceneView};

use super::composite::{Composite, CompositeOutput, CompositeSource};
use super::depth::ClipPlanes;
use super::target::{create_render_target, RenderTarget, COLOR_FORMAT};

/// Output size of a pass and the size it actually renders the scene at.
///
/// `render_resolution` is always `resolution / pixel_size` per axis,
/// rounded down.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassResolution {
    resolution: (u32, u32),
    pixel_size: u32,
    render_resolution: (u32, u32),
}

impl PassResolution {
    pub fn new(width: u32, height: u32, pixel_size: u32) -> Self {
        let mut out = Self {
            resolution: (width, height),
            pixel_size: pixel_size.max(1),
            render_resolution: (0, 0),
        };
        out.recompute();
        out
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn render_resolution(&self) -> (u32, u32) {
        self.render_resolution
    }

    /// Returns `true` if the render resolution changed.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        let before = self.render_resolution;
        self.resolution = (width, height);
        self.recompute();
        before != self.render_resolution
    }

    /// Clamped to at least 1. Returns `true` if the render resolution changed.
    pub fn set_pixel_size(&mut self, pixel_size: u32) -> bool {
        let before = self.render_resolution;
        self.pixel_size = pixel_size.max(1);
        self.recompute();
        before != self.render_resolution
    }

    fn recompute(&mut self) {
        let (w, h) = self.resolution;
        self.render_resolution = (w / self.pixel_size, h / self.pixel_size);
    }
}

/// Which pass a slot or key refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassKind {
    Color,
    Depth,
    Pixelation,
}

impl PassKind {
    pub const ALL: [PassKind; 3] = [PassKind::Color, PassKind::Depth, PassKind::Pixelation];

    /// Selection name, as used by `--pass` and by name-driven switching.
    pub fn name(self) -> &'static str {
        match self {
            PassKind::Color => "color",
            PassKind::Depth => "depth",
            PassKind::Pixelation => "pixelate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-variant payload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PassVariant {
    Color,
    /// Clip planes captured from the camera when the pass was built.
    Depth { planes: ClipPlanes },
    Pixelation,
}

/// Where a pass writes its result.
pub struct PassIo<'a> {
    /// The presentable surface view for this frame.
    pub screen: &'a wgpu::TextureView,
    pub screen_format: wgpu::TextureFormat,
    /// Hand-off buffer used when the pass does not render to screen.
    pub write_buffer: &'a RenderTarget,
}

/// A post-processing pass: renders the scene into a private target, then
/// composites that target into the screen or a hand-off buffer.
pub struct Pass {
    variant: PassVariant,
    resolution: PassResolution,
    pub render_to_screen: bool,
    pub clear: bool,
    target: RenderTarget,
    composite: Composite,
}

impl Pass {
    /// Opaque passthrough of the scene.
    pub fn color(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::build(device, PassVariant::Color, PassResolution::new(width, height, 1))
    }

    /// Linearized depth as grayscale. Near/far are read from `camera` now and
    /// not refreshed later.
    pub fn depth(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        camera: &PerspectiveCamera,
    ) -> Self {
        let planes = camera.clip_planes();
        Self::build(
            device,
            PassVariant::Depth { planes },
            PassResolution::new(width, height, 1),
        )
    }

    /// Scene rendered at `resolution / pixel_size` and upscaled with point
    /// sampling.
    pub fn pixelation(device: &wgpu::Device, width: u32, height: u32, pixel_size: u32) -> Self {
        Self::build(
            device,
            PassVariant::Pixelation,
            PassResolution::new(width, height, pixel_size),
        )
    }

    fn build(device: &wgpu::Device, variant: PassVariant, resolution: PassResolution) -> Self {
        let (w, h) = resolution.render_resolution();
        let source = match variant {
            PassVariant::Depth { planes } => CompositeSource::LinearDepth(planes),
            PassVariant::Color | PassVariant::Pixelation => CompositeSource::Color,
        };

        let pass = Self {
            variant,
            resolution,
            render_to_screen: true,
            clear: true,
            target: create_render_target(device, w, h, COLOR_FORMAT, true),
            composite: Composite::new(device, source),
        };

        log::debug!("created {} pass at {w}x{h}", pass.kind());
        pass
    }

    pub fn kind(&self) -> PassKind {
        match self.variant {
            PassVariant::Color => PassKind::Color,
            PassVariant::Depth { .. } => PassKind::Depth,
            PassVariant::Pixelation => PassKind::Pixelation,
        }
    }

    pub fn variant(&self) -> PassVariant {
        self.variant
    }

    pub fn resolution(&self) -> PassResolution {
        self.resolution
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Resizes the private target in place. Same size twice is a no-op.
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.resolution.set_size(width, height);
        self.sync_target(device);
    }

    pub fn set_pixel_size(&mut self, device: &wgpu::Device, pixel_size: u32) {
        self.resolution.set_pixel_size(pixel_size);
        self.sync_target(device);
    }

    fn sync_target(&mut self, device: &wgpu::Device) {
        let (w, h) = self.resolution.render_resolution();
        if self.target.set_size(device, w, h) {
            log::debug!("{} pass target resized to {w}x{h}", self.kind());
        }
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        view: SceneView<'_>,
        io: PassIo<'_>,
    ) {
        view.renderer
            .render(ctx, encoder, view.scene, view.camera, &self.target);

        let output = self.output(&io);
        self.composite.draw(ctx.device, encoder, &self.target, output);
    }

    /// The screen is always cleared; the hand-off buffer only if `clear`.
    fn output<'a>(&self, io: &PassIo<'a>) -> CompositeOutput<'a> {
        if self.render_to_screen {
            CompositeOutput {
                view: io.screen,
                format: io.screen_format,
                clear: true,
            }
        } else {
            CompositeOutput {
                view: io.write_buffer.color_view(),
                format: io.write_buffer.format(),
                clear: self.clear,
            }
        }
    }

    /// Releases the private target and composite resources.
    pub fn dispose(self) {
        log::debug!("disposing {} pass", self.kind());
        self.target.dispose();
        self.composite.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::post::noop_device;
    use crate::scene::{Geometry, Mesh, Scene, SceneRenderer};

    // ── resolution ───────────────────────────────────────────────────────

    #[test]
    fn render_resolution_is_floor_division() {
        let mut r = PassResolution::new(1280, 720, 1);
        assert_eq!(r.render_resolution(), (1280, 720));

        r.set_pixel_size(6);
        assert_eq!(r.render_resolution(), (213, 120));

        r.set_size(1001, 999);
        assert_eq!(r.render_resolution(), (166, 166));
        assert_eq!(r.resolution(), (1001, 999));
    }

    #[test]
    fn pixel_size_is_clamped_to_one() {
        let mut r = PassResolution::new(640, 480, 0);
        assert_eq!(r.pixel_size(), 1);
        assert_eq!(r.render_resolution(), (640, 480));

        r.set_pixel_size(0);
        assert_eq!(r.pixel_size(), 1);
    }

    #[test]
    fn same_size_twice_reports_no_change() {
        let mut r = PassResolution::new(800, 600, 4);
        assert!(r.set_size(1024, 768));
        assert!(!r.set_size(1024, 768));
        assert_eq!(r.render_resolution(), (256, 192));
    }

    #[test]
    fn pixel_size_larger_than_viewport_gives_zero() {
        let r = PassResolution::new(3, 5, 8);
        assert_eq!(r.render_resolution(), (0, 0));
    }

    #[test]
    fn invariant_holds_across_updates() {
        let mut r = PassResolution::new(1, 1, 1);
        for (w, h, p) in [(1920, 1080, 3), (7, 13, 2), (0, 0, 5), (4096, 17, 16)] {
            r.set_size(w, h);
            r.set_pixel_size(p);
            assert_eq!(r.render_resolution(), (w / p, h / p));
        }
    }

    // ── kind ─────────────────────────────────────────────────────────────

    #[test]
    fn kind_names() {
        for kind in PassKind::ALL {
            assert_eq!(PassKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PassKind::from_name("pixelate"), Some(PassKind::Pixelation));
        assert_eq!(PassKind::from_name("normal"), None);
        assert_eq!(PassKind::from_name("Color"), None);
    }

    // ── passes on a device ───────────────────────────────────────────────

    const SCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 4.0 / 3.0, 0.1, 8.0);
        camera.position = glam::Vec3::new(0.0, 0.0, 5.0);
        camera.target = glam::Vec3::ZERO;
        camera
    }

    fn scene() -> Scene {
        let mut scene = Scene::new(Color::from_hex(0x43476c));
        scene.add(Mesh::new(
            Geometry::cuboid(1.0, 1.0, 1.0),
            Color::from_hex(0xa5548a),
        ));
        scene
    }

    fn screen(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test screen"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[test]
    fn pixelation_target_follows_render_resolution() {
        let (device, _queue) = noop_device();
        let mut pass = Pass::pixelation(&device, 1001, 999, 6);

        assert_eq!(pass.kind(), PassKind::Pixelation);
        assert_eq!(pass.resolution().render_resolution(), (166, 166));
        assert_eq!((pass.target().width(), pass.target().height()), (166, 166));

        pass.set_pixel_size(&device, 2);
        assert_eq!((pass.target().width(), pass.target().height()), (500, 499));

        pass.dispose();
    }

    #[test]
    fn set_size_twice_keeps_allocation() {
        let (device, _queue) = noop_device();
        let mut pass = Pass::color(&device, 640, 480);

        pass.set_size(&device, 800, 600);
        let allocations = pass.target().allocations();
        pass.set_size(&device, 800, 600);

        assert_eq!(pass.target().allocations(), allocations);
        assert_eq!((pass.target().width(), pass.target().height()), (800, 600));
        pass.dispose();
    }

    #[test]
    fn depth_pass_keeps_planes_from_construction() {
        let (device, _queue) = noop_device();
        let mut cam = camera();
        let pass = Pass::depth(&device, 320, 240, &cam);

        cam.far = 100.0;
        assert_ne!(cam.clip_planes(), ClipPlanes::new(0.1, 8.0));

        assert_eq!(
            pass.variant(),
            PassVariant::Depth {
                planes: ClipPlanes::new(0.1, 8.0)
            }
        );
        assert!(pass.target().has_depth());
        pass.dispose();
    }

    #[test]
    fn offscreen_output_clears_only_when_asked() {
        let (device, _queue) = noop_device();
        let screen = screen(&device, 64, 64);
        let screen_view = screen.create_view(&wgpu::TextureViewDescriptor::default());
        let write_buffer = create_render_target(&device, 64, 64, COLOR_FORMAT, false);
        let io = PassIo {
            screen: &screen_view,
            screen_format: SCREEN_FORMAT,
            write_buffer: &write_buffer,
        };

        let mut pass = Pass::color(&device, 64, 64);

        let out = pass.output(&io);
        assert!(std::ptr::eq(out.view, &screen_view));
        assert_eq!(out.format, SCREEN_FORMAT);
        assert!(out.clear);

        pass.render_to_screen = false;
        pass.clear = false;
        let out = pass.output(&io);
        assert!(std::ptr::eq(out.view, write_buffer.color_view()));
        assert_eq!(out.format, COLOR_FORMAT);
        assert!(!out.clear);

        pass.clear = true;
        assert!(pass.output(&io).clear);

        pass.dispose();
        write_buffer.dispose();
    }

    #[test]
    fn every_variant_records_to_screen_and_hand_off_buffer() {
        let (device, queue) = noop_device();
        let scene = scene();
        let cam = camera();
        let mut renderer = SceneRenderer::new();

        let screen = screen(&device, 128, 96);
        let screen_view = screen.create_view(&wgpu::TextureViewDescriptor::default());
        let write_buffer = create_render_target(&device, 128, 96, COLOR_FORMAT, false);
        let ctx = RenderCtx::new(&device, &queue, SCREEN_FORMAT, (128, 96));

        let mut passes = [
            Pass::color(&device, 128, 96),
            Pass::depth(&device, 128, 96, &cam),
            Pass::pixelation(&device, 128, 96, 4),
        ];

        for to_screen in [true, false] {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("test encoder"),
            });
            for pass in passes.iter_mut() {
                pass.render_to_screen = to_screen;
                pass.render(
                    &ctx,
                    &mut encoder,
                    SceneView {
                        scene: &scene,
                        camera: &cam,
                        renderer: &mut renderer,
                    },
                    PassIo {
                        screen: &screen_view,
                        screen_format: SCREEN_FORMAT,
                        write_buffer: &write_buffer,
                    },
                );
            }
            queue.submit(std::iter::once(encoder.finish()));
        }

        for pass in passes {
            pass.dispose();
        }
        write_buffer.dispose();
    }
}
