use winit::window::Window;

use crate::render_loop::Capability;

use super::GpuInit;
use super::adapter;

/// Checks whether any enabled wgpu backend can present to `window`.
///
/// Only inspects the host: a throwaway instance and surface are created and
/// dropped again, and no device is opened. The returned diagnostic is meant to
/// be shown to the user as-is.
pub fn probe_backend(window: &Window, init: &GpuInit) -> Capability {
    let instance = adapter::create_instance(init);

    let surface = match adapter::create_surface(&instance, window) {
        Ok(surface) => surface,
        Err(err) => {
            return Capability::unavailable(format!(
                "this window cannot host a GPU drawing surface ({err})"
            ));
        }
    };

    match pollster::block_on(adapter::select_adapter(&instance, &surface)) {
        Ok(adapter) => {
            let info = adapter.get_info();
            log::debug!("probe found {} via {:?}", info.name, info.backend);
            Capability::Available
        }
        Err(err) => Capability::unavailable(format!(
            "your graphics card or driver does not support any of the enabled backends \
             ({:?}): {err}",
            init.backends
        )),
    }
}
