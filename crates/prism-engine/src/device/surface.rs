use winit::dpi::PhysicalSize;

use super::GpuInit;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Builds the swapchain configuration for `size` from what the surface
/// supports and what `init` asks for.
///
/// Unsupported preferences fall back: the first reported format, the first
/// reported alpha mode, and `Fifo` (always available) for presentation.
/// Returns `None` when the surface reports no formats at all.
pub(crate) fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> Option<wgpu::SurfaceConfiguration> {
    let format = pick_format(&caps.formats, init.prefer_srgb)?;

    let present_mode = if caps.present_modes.contains(&init.present_mode) {
        init.present_mode
    } else {
        wgpu::PresentMode::Fifo
    };

    let alpha_mode = init
        .alpha_mode
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}

fn pick_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    let srgb = formats.iter().copied().find(|f| f.is_srgb());
    match (prefer_srgb, srgb) {
        (true, Some(f)) => Some(f),
        _ => formats.first().copied(),
    }
}

/// Records `new_size` in `config`. Returns `false` for a 0x0 size, which wgpu
/// refuses to configure; the caller keeps the old swapchain until a real size
/// arrives.
pub(crate) fn resize_config(
    config: &mut wgpu::SurfaceConfiguration,
    new_size: PhysicalSize<u32>,
) -> bool {
    if new_size.width == 0 || new_size.height == 0 {
        return false;
    }
    config.width = new_size.width;
    config.height = new_size.height;
    true
}

pub(crate) fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    fn caps(formats: Vec<F>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes: vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    // ── format ───────────────────────────────────────────────────────────

    #[test]
    fn pick_format_prefers_srgb() {
        let formats = [F::Bgra8Unorm, F::Bgra8UnormSrgb];
        assert_eq!(pick_format(&formats, true), Some(F::Bgra8UnormSrgb));
    }

    #[test]
    fn pick_format_falls_back_to_first() {
        let formats = [F::Rgba16Float, F::Bgra8Unorm];
        assert_eq!(pick_format(&formats, true), Some(F::Rgba16Float));
        assert_eq!(pick_format(&[F::Bgra8Unorm, F::Bgra8UnormSrgb], false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn no_formats_means_no_config() {
        let size = PhysicalSize::new(640, 480);
        assert!(surface_config(&caps(vec![]), &GpuInit::default(), size).is_none());
    }

    // ── configuration ────────────────────────────────────────────────────

    #[test]
    fn config_follows_size_and_init() {
        let init = GpuInit {
            present_mode: wgpu::PresentMode::Immediate,
            ..GpuInit::default()
        };
        let cfg = surface_config(&caps(vec![F::Bgra8UnormSrgb]), &init, PhysicalSize::new(800, 600))
            .expect("format available");

        assert_eq!((cfg.width, cfg.height), (800, 600));
        assert_eq!(cfg.format, F::Bgra8UnormSrgb);
        assert_eq!(cfg.present_mode, wgpu::PresentMode::Immediate);
        assert_eq!(cfg.desired_maximum_frame_latency, init.desired_maximum_frame_latency);
    }

    #[test]
    fn unsupported_preferences_fall_back() {
        let init = GpuInit {
            present_mode: wgpu::PresentMode::Mailbox,
            alpha_mode: Some(wgpu::CompositeAlphaMode::PreMultiplied),
            ..GpuInit::default()
        };
        let cfg = surface_config(&caps(vec![F::Bgra8Unorm]), &init, PhysicalSize::new(1, 1))
            .expect("format available");

        assert_eq!(cfg.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(cfg.alpha_mode, wgpu::CompositeAlphaMode::Opaque);
    }

    #[test]
    fn zero_resize_keeps_previous_extent() {
        let mut cfg = surface_config(&caps(vec![F::Bgra8Unorm]), &GpuInit::default(), PhysicalSize::new(320, 240))
            .expect("format available");

        assert!(!resize_config(&mut cfg, PhysicalSize::new(0, 240)));
        assert_eq!((cfg.width, cfg.height), (320, 240));

        assert!(resize_config(&mut cfg, PhysicalSize::new(1024, 768)));
        assert_eq!((cfg.width, cfg.height), (1024, 768));
    }

    #[test]
    fn surface_errors_map_to_actions() {
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Lost),
            SurfaceErrorAction::Reconfigured
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Timeout),
            SurfaceErrorAction::SkipFrame
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::OutOfMemory),
            SurfaceErrorAction::Fatal
        );
    }
}
