use glam::Vec3;

use prism_engine::core::{App, AppControl, FrameCtx};
use prism_engine::input::{InputEvent, Key, KeyState};
use prism_engine::paint::Color;
use prism_engine::post::{Composer, Pass, PassKind};
use prism_engine::scene::{
    Geometry, Mesh, OrbitControls, PerspectiveCamera, Scene, SceneRenderer, SceneView,
};

use crate::config::DemoConfig;

const CUBE_COLOR: u32 = 0xa5548a;
const BACKGROUND: u32 = 0x43476c;

const FOV_Y_DEGREES: f32 = 75.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 8.0;

pub const MAX_PIXEL_SIZE: u32 = 64;

/// What a key press asks the controller to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Select(PassKind),
    PixelSize(i32),
    Exit,
}

pub fn command_for_key(key: Key) -> Option<Command> {
    match key {
        Key::Letter('C') | Key::Digit(1) => Some(Command::Select(PassKind::Color)),
        Key::Letter('D') | Key::Digit(2) => Some(Command::Select(PassKind::Depth)),
        Key::Letter('P') | Key::Digit(3) => Some(Command::Select(PassKind::Pixelation)),
        Key::BracketLeft | Key::Minus => Some(Command::PixelSize(-1)),
        Key::BracketRight | Key::Equal => Some(Command::PixelSize(1)),
        Key::Escape => Some(Command::Exit),
        _ => None,
    }
}

pub fn step_pixel_size(current: u32, delta: i32) -> u32 {
    current
        .saturating_add_signed(delta)
        .clamp(1, MAX_PIXEL_SIZE)
}

/// Owns the scene, the camera and its orbit controls, and the composer with
/// one pass per kind.
///
/// Passes need a device, so they are built on the first frame; selections
/// made before then are applied when they exist.
pub struct SceneController {
    scene: Scene,
    camera: PerspectiveCamera,
    orbit: OrbitControls,
    renderer: SceneRenderer,
    composer: Option<Composer>,
    active: PassKind,
    pixel_size: u32,
    size: (u32, u32),
}

impl SceneController {
    pub fn new(config: &DemoConfig) -> Self {
        let mut scene = Scene::new(Color::from_hex(BACKGROUND));
        scene.add(Mesh::new(
            Geometry::cuboid(1.0, 1.0, 1.0),
            Color::from_hex(CUBE_COLOR),
        ));

        let aspect = (config.width / config.height) as f32;
        let mut camera = PerspectiveCamera::new(FOV_Y_DEGREES, aspect, NEAR, FAR);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.target = Vec3::ZERO;

        let orbit = OrbitControls::from_camera(&camera);

        Self {
            scene,
            camera,
            orbit,
            renderer: SceneRenderer::new(),
            composer: None,
            active: config.initial_pass,
            pixel_size: config.pixel_size.max(1),
            size: (0, 0),
        }
    }

    pub fn active(&self) -> PassKind {
        self.active
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn select(&mut self, kind: PassKind) {
        self.active = kind;
        if let Some(composer) = self.composer.as_mut() {
            composer.set_active(kind);
        }
    }

    /// Name-driven selection. Unknown names are ignored and return `false`.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match PassKind::from_name(name) {
            Some(kind) => {
                self.select(kind);
                true
            }
            None => {
                log::warn!("ignoring unknown pass `{name}`");
                false
            }
        }
    }

    fn apply(&mut self, device: &wgpu::Device, command: Command) -> AppControl {
        match command {
            Command::Select(kind) => self.select(kind),
            Command::PixelSize(delta) => {
                let next = step_pixel_size(self.pixel_size, delta);
                if next != self.pixel_size {
                    self.pixel_size = next;
                    log::info!("pixel size {next}");
                    if let Some(pass) = self
                        .composer
                        .as_mut()
                        .and_then(|c| c.pass_mut(PassKind::Pixelation))
                    {
                        pass.set_pixel_size(device, next);
                    }
                }
            }
            Command::Exit => return AppControl::Exit,
        }
        AppControl::Continue
    }

    fn ensure_composer(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if let Some(composer) = self.composer.as_mut() {
            if self.size != (width, height) {
                self.size = (width, height);
                self.camera.set_viewport(width, height);
                composer.set_size(device, width, height);
                log::debug!("resized to {width}x{height}");
            }
            return;
        }

        self.size = (width, height);
        self.camera.set_viewport(width, height);

        let mut composer = Composer::new(device, width, height);
        composer.add_pass(Pass::color(device, width, height));
        composer.add_pass(Pass::depth(device, width, height, &self.camera));
        composer.add_pass(Pass::pixelation(device, width, height, self.pixel_size));
        composer.set_active(self.active);

        self.composer = Some(composer);
    }
}

impl App for SceneController {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let size = ctx.gpu.size();
        self.ensure_composer(ctx.gpu.device(), size.width, size.height);

        let commands: Vec<Command> = ctx
            .input_frame
            .events
            .iter()
            .filter_map(|ev| match ev {
                InputEvent::Key {
                    key,
                    state: KeyState::Pressed,
                    repeat: false,
                    ..
                } => command_for_key(*key),
                _ => None,
            })
            .collect();
        for command in commands {
            if self.apply(ctx.gpu.device(), command) == AppControl::Exit {
                return AppControl::Exit;
            }
        }

        let (_, logical_height) = ctx.logical_size();
        self.orbit.update(
            &mut self.camera,
            ctx.input,
            ctx.input_frame,
            logical_height,
            ctx.time.dt,
        );

        let Some(composer) = self.composer.as_mut() else {
            return AppControl::Continue;
        };
        let view = SceneView {
            scene: &self.scene,
            camera: &self.camera,
            renderer: &mut self.renderer,
        };

        ctx.render(|rctx, target| composer.render(rctx, target.encoder, view, target.view))
    }
}

impl Drop for SceneController {
    fn drop(&mut self) {
        if let Some(composer) = self.composer.take() {
            composer.dispose();
        }
    }
}
