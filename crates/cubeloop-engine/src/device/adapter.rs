use winit::window::Window;

use super::GpuInit;

pub(crate) fn create_instance(init: &GpuInit) -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: init.backends,
        ..Default::default()
    })
}

/// Creates a surface for `window`, borrowing it for `'w`.
pub(crate) fn create_surface<'w>(
    instance: &wgpu::Instance,
    window: &'w Window,
) -> Result<wgpu::Surface<'w>, wgpu::CreateSurfaceError> {
    instance.create_surface(window)
}

/// Picks the high-performance adapter able to present to `surface`.
pub(crate) async fn select_adapter(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
) -> Result<wgpu::Adapter, wgpu::RequestAdapterError> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
}
