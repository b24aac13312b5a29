use anyhow::{Context, Result};

/// Identity of the adapter wgpu handed out.
#[derive(Debug, Clone)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl From<wgpu::AdapterInfo> for AdapterSummary {
    fn from(info: wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name,
            backend: info.backend,
            device_type: info.device_type,
        }
    }
}

impl std::fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

pub(crate) fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Adapter request shared by [`check_adapter`] (no surface) and window setup.
pub(crate) async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .context("no suitable GPU adapter is available")
}

/// Checks that some adapter can be acquired before a window is opened.
///
/// Surface compatibility is checked again once the window exists; this only
/// answers whether there is a GPU backend at all, so callers can print a
/// warning instead of entering the frame loop.
pub fn check_adapter() -> Result<AdapterSummary> {
    let instance = new_instance();
    let adapter = pollster::block_on(request_adapter(&instance, None))?;
    Ok(adapter.get_info().into())
}
