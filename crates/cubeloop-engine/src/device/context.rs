use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::{GpuFrame, GpuInit, SurfaceErrorAction};
use super::{adapter, surface};

/// Window-bound GPU state: device, queue and the configured swapchain.
///
/// Created only after the backend probe succeeded, so failures here are
/// setup errors rather than "no GPU" conditions.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    config: wgpu::SurfaceConfiguration,

    /// Physical pixels. May be 0x0 while minimized; `config` keeps the last
    /// non-zero size.
    size: PhysicalSize<u32>,

    sample_count: u32,
}

impl<'w> Gpu<'w> {
    /// Opens a device for `window` and configures its surface.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        // May be 0x0 if the window starts minimized; frames are skipped until it grows.
        let size = window.inner_size();

        let instance = adapter::create_instance(&init);
        let surface = adapter::create_surface(&instance, window)
            .context("failed to create wgpu surface")?;
        let adapter = adapter::select_adapter(&instance, &surface)
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let (device, queue) = open_device(&adapter, &init).await?;
        let (config, sample_count) = surface_config(&surface, &adapter, &init, size)?;
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// MSAA sample count the surface format supports, at most the requested one.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Follows a window resize. Zero sizes are recorded but not applied.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Acquires the next swapchain image and an encoder to record into it.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cubeloop frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the image.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        // The view must not outlive the texture it was created from.
        drop(view);
        surface_texture.present();
    }

    /// Decides how the frame loop reacts to a failed image acquisition.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }
}

async fn open_device(adapter: &wgpu::Adapter, init: &GpuInit) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("cubeloop device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}

/// Builds the initial surface configuration and resolves the MSAA count.
fn surface_config(
    surface: &wgpu::Surface<'_>,
    adapter: &wgpu::Adapter,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> Result<(wgpu::SurfaceConfiguration, u32)> {
    let caps = surface.get_capabilities(adapter);
    let format = surface::choose_surface_format(&caps, init.prefer_srgb)
        .context("no supported surface formats")?;

    let format_flags = adapter.get_texture_format_features(format).flags;
    let sample_count =
        surface::choose_sample_count(init.sample_count, |n| format_flags.sample_count_supported(n));
    log::debug!("surface format {format:?}, {sample_count}x MSAA");

    let (width, height) = surface::configured_extent(size);
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: surface::choose_present_mode(&caps, init.present_mode),
        alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    };

    Ok((config, sample_count))
}
