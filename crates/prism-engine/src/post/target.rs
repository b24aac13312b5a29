//! Off-screen render targets.
//!
//! Every target built here samples with nearest-neighbor filtering and has a
//! single mip level, so a low-resolution target stretched over the surface
//! keeps hard block edges.

/// Color format used by the passes for their private targets.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Format of the optional depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Requested shape of a render target.
///
/// `width`/`height` are recorded as requested, including zero. GPU
/// allocations are clamped to at least 1x1 (see [`RenderTargetSpec::extent`]).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RenderTargetSpec {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub has_depth: bool,
}

impl RenderTargetSpec {
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat, has_depth: bool) -> Self {
        Self {
            width,
            height,
            format,
            has_depth,
        }
    }

    /// Allocation extent. wgpu rejects zero-sized textures, so degenerate
    /// requests get a 1x1 texture instead of a validation panic.
    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width.max(1),
            height: self.height.max(1),
            depth_or_array_layers: 1,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Descriptor for the color attachment of `spec`.
pub fn color_texture_descriptor(spec: &RenderTargetSpec) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some("prism target color"),
        size: spec.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: spec.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    }
}

/// Descriptor for the depth attachment of `spec`, if it has one.
pub fn depth_texture_descriptor(
    spec: &RenderTargetSpec,
) -> Option<wgpu::TextureDescriptor<'static>> {
    spec.has_depth.then(|| wgpu::TextureDescriptor {
        label: Some("prism target depth"),
        size: spec.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

/// Point sampling, clamped at the edges, no mip blending.
pub fn sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("prism target sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    }
}

/// Depth state for pipelines drawing into a target of `spec`.
///
/// Depth writes on, less-than test, no stencil.
pub fn depth_stencil_state(spec: &RenderTargetSpec) -> Option<wgpu::DepthStencilState> {
    spec.has_depth.then(|| wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

struct Attachment {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Attachment {
    fn new(device: &wgpu::Device, desc: &wgpu::TextureDescriptor<'_>) -> Self {
        let texture = device.create_texture(desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// An off-screen color buffer with an optional depth buffer.
///
/// Owned exclusively by one pass (or the composer's hand-off buffer).
/// Release it with [`RenderTarget::dispose`].
pub struct RenderTarget {
    spec: RenderTargetSpec,
    color: Attachment,
    depth: Option<Attachment>,
    sampler: wgpu::Sampler,
    min_filter: wgpu::FilterMode,
    mag_filter: wgpu::FilterMode,
    mip_level_count: u32,
    allocations: u32,
}

/// Builds a render target of `width` x `height`.
///
/// No validation is done on `format`; it must be renderable.
pub fn create_render_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    use_depth_texture: bool,
) -> RenderTarget {
    let spec = RenderTargetSpec::new(width, height, format, use_depth_texture);
    let sampler_desc = sampler_descriptor();
    let color_desc = color_texture_descriptor(&spec);

    if spec.is_degenerate() {
        log::debug!("render target requested at {width}x{height}; allocating 1x1");
    }

    RenderTarget {
        spec,
        color: Attachment::new(device, &color_desc),
        depth: depth_texture_descriptor(&spec).map(|d| Attachment::new(device, &d)),
        sampler: device.create_sampler(&sampler_desc),
        min_filter: sampler_desc.min_filter,
        mag_filter: sampler_desc.mag_filter,
        mip_level_count: color_desc.mip_level_count,
        allocations: 1,
    }
}

impl RenderTarget {
    pub fn spec(&self) -> RenderTargetSpec {
        self.spec
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.spec.format
    }

    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color.view
    }

    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|d| &d.view)
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn min_filter(&self) -> wgpu::FilterMode {
        self.min_filter
    }

    pub fn mag_filter(&self) -> wgpu::FilterMode {
        self.mag_filter
    }

    pub fn generates_mipmaps(&self) -> bool {
        self.mip_level_count > 1
    }

    /// How many times the attachments have been (re)allocated.
    ///
    /// Bind groups referencing the views compare this to know when to rebuild.
    pub fn allocations(&self) -> u32 {
        self.allocations
    }

    /// Resizes in place. Returns `true` if the attachments were reallocated;
    /// an unchanged size is a no-op.
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if self.spec.width == width && self.spec.height == height {
            return false;
        }

        self.spec.width = width;
        self.spec.height = height;

        let color = Attachment::new(device, &color_texture_descriptor(&self.spec));
        let depth = depth_texture_descriptor(&self.spec).map(|d| Attachment::new(device, &d));

        let old_color = std::mem::replace(&mut self.color, color);
        old_color.texture.destroy();
        if let Some(old_depth) = std::mem::replace(&mut self.depth, depth) {
            old_depth.texture.destroy();
        }

        self.allocations = self.allocations.wrapping_add(1);
        true
    }

    /// Releases the GPU memory now rather than when the last view drops.
    pub fn dispose(self) {
        self.color.texture.destroy();
        if let Some(depth) = self.depth {
            depth.texture.destroy();
        }
    }
}
