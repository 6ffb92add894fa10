use anyhow::Result;

use cubeloop_engine::core::{App, FrameCtx};
use cubeloop_engine::render::MeshRenderer;
use cubeloop_engine::render_loop::NextFrame;
use cubeloop_engine::time::FrameRateMeter;

use crate::scene::CubeScene;

/// Frame callback: rotate the cube, follow the window's aspect ratio, draw.
pub struct SpinningCube {
    cube: CubeScene,
    renderer: MeshRenderer,
    fps: FrameRateMeter,
    title: String,
    max_frames: Option<u64>,
}

impl SpinningCube {
    pub fn new(title: String, aspect: f32, max_frames: Option<u64>) -> Self {
        Self {
            cube: CubeScene::new(aspect),
            renderer: MeshRenderer::new(),
            fps: FrameRateMeter::default(),
            title,
            max_frames,
        }
    }
}

/// True when `frame_index` (zero-based) is the last frame allowed.
fn is_last_frame(frame_index: u64, max_frames: Option<u64>) -> bool {
    max_frames.is_some_and(|max| frame_index + 1 >= max)
}

impl App for SpinningCube {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>, next: &mut NextFrame) -> Result<()> {
        if is_last_frame(ctx.time.frame_index, self.max_frames) {
            log::info!(
                "reached {} frames after {:.2}s",
                ctx.time.frame_index + 1,
                ctx.time.elapsed
            );
            ctx.runtime.exit();
        } else {
            next.request();
        }

        self.cube.step();
        self.cube.camera.update_aspect(ctx.surface_size());

        let CubeScene { scene, camera, .. } = &self.cube;
        let renderer = &mut self.renderer;
        let presented = ctx.render(|rctx, target| renderer.render(rctx, target, scene, camera))?;

        if presented {
            if let Some(rate) = self.fps.record(ctx.time.now) {
                log::debug!(
                    "{rate:.1} fps at frame {} (dt {:.2} ms)",
                    ctx.time.frame_index,
                    ctx.time.dt * 1000.0
                );
                ctx.runtime.set_title(format!("{} ({rate:.0} fps)", self.title));
            }
        }

        Ok(())
    }
}
