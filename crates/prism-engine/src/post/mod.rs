//! Post-processing: off-screen render targets, the passes that render the
//! scene into them, and the composer that runs the active one.

mod composer;
mod composite;
pub mod depth;
mod pass;
mod target;

pub use composer::{ActivePassSlot, Composer, PassChain, Switch};
pub use depth::ClipPlanes;
pub use pass::{Pass, PassIo, PassKind, PassResolution, PassVariant};
pub use target::{
    color_texture_descriptor, create_render_target, depth_stencil_state,
    depth_texture_descriptor, sampler_descriptor, RenderTarget, RenderTargetSpec, COLOR_FORMAT,
    DEPTH_FORMAT,
};

/// Stub device for tests that allocate real targets and record passes
/// without a GPU.
#[cfg(test)]
pub(crate) fn noop_device() -> (wgpu::Device, wgpu::Queue) {
    wgpu::Device::noop(&wgpu::DeviceDescriptor::default())
}
