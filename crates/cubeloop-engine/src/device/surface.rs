use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;

    if prefer_srgb {
        if let Some(f) = caps.formats.iter().copied().find(|f| f.is_srgb()) {
            return Some(f);
        }
    }

    Some(first)
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Falls back to FIFO, which every surface must support.
pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        requested
    } else {
        log::warn!("present mode {requested:?} unsupported; using Fifo");
        wgpu::PresentMode::Fifo
    }
}

/// Highest power-of-two sample count `<= requested` accepted by `supported`.
pub(crate) fn choose_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    let mut count = requested.clamp(1, 16).next_power_of_two();
    if count > requested.max(1) {
        count /= 2;
    }
    while count > 1 && !supported(count) {
        count /= 2;
    }
    count
}

/// Extent to configure the surface with; wgpu rejects zero-sized surfaces.
pub(crate) fn configured_extent(size: PhysicalSize<u32>) -> (u32, u32) {
    (size.width.max(1), size.height.max(1))
}

pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;

    // wgpu rejects 0x0 configurations; defer until the window is visible again.
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat]) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: formats.to_vec(),
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            ..Default::default()
        }
    }

    #[test]
    fn no_formats_means_no_surface() {
        assert_eq!(choose_surface_format(&caps(&[]), true), None);
    }

    #[test]
    fn srgb_preferred_when_present() {
        let c = caps(&[
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ]);
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(
            choose_surface_format(&c, false),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn linear_format_used_when_srgb_missing() {
        let c = caps(&[wgpu::TextureFormat::Rgba16Float]);
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Rgba16Float)
        );
    }

    #[test]
    fn unsupported_alpha_mode_falls_back_to_first() {
        let c = caps(&[wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(choose_alpha_mode(&c, None), wgpu::CompositeAlphaMode::Opaque);
    }

    #[test]
    fn unsupported_present_mode_falls_back_to_fifo() {
        let c = caps(&[wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Fifo
        );
    }

    #[test]
    fn sample_count_steps_down_to_supported() {
        assert_eq!(choose_sample_count(4, |n| n <= 4), 4);
        assert_eq!(choose_sample_count(8, |n| n == 4), 4);
        assert_eq!(choose_sample_count(4, |_| false), 1);
        assert_eq!(choose_sample_count(0, |_| true), 1);
        assert_eq!(choose_sample_count(6, |_| true), 4);
    }

    #[test]
    fn minimized_window_still_gets_a_valid_extent() {
        assert_eq!(configured_extent(PhysicalSize::new(0, 0)), (1, 1));
        assert_eq!(configured_extent(PhysicalSize::new(0, 720)), (1, 720));
        assert_eq!(configured_extent(PhysicalSize::new(1280, 720)), (1280, 720));
    }
}
