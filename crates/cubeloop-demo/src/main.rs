mod app;
mod scene;

use anyhow::Result;
use clap::Parser;
use winit::dpi::LogicalSize;

use cubeloop_engine::device::{GpuInit, probe_backend};
use cubeloop_engine::logging::{LoggingConfig, init_logging};
use cubeloop_engine::render_loop::{Capability, Unavailable};
use cubeloop_engine::window::{Runtime, RuntimeConfig};

use app::SpinningCube;

#[derive(Parser, Debug)]
#[command(name = "cubeloop", about = "Spinning lit cube on a capability-gated render loop")]
struct Cli {
    /// Window title
    #[arg(long, default_value = "cubeloop")]
    title: String,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280.0, value_parser = parse_extent)]
    width: f64,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720.0, value_parser = parse_extent)]
    height: f64,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,

    /// Requested MSAA sample count (lowered if the surface cannot do it)
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=16))]
    msaa: u32,

    /// Log filter, env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,

    /// Stop after this many frames and exit
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_frames: Option<u64>,

    /// Report the GPU backend as unavailable and take the fallback path
    #[arg(long)]
    no_gpu: bool,
}

impl Cli {
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.width, self.height),
        }
    }

    fn gpu_init(&self) -> GpuInit {
        GpuInit {
            present_mode: if self.no_vsync {
                wgpu::PresentMode::AutoNoVsync
            } else {
                wgpu::PresentMode::Fifo
            },
            sample_count: self.msaa,
            ..GpuInit::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let app = SpinningCube::new(
        cli.title.clone(),
        (cli.width / cli.height) as f32,
        cli.max_frames,
    );

    let no_gpu = cli.no_gpu;
    let result = Runtime::run(
        cli.runtime_config(),
        cli.gpu_init(),
        |window, init| {
            if no_gpu {
                Capability::unavailable("GPU rendering disabled with --no-gpu")
            } else {
                probe_backend(window, init)
            }
        },
        |err| eprintln!("cubeloop: {err}. Nothing will be drawn."),
        app,
    );

    exit_result(result)
}

/// Window extents must be finite and at least one logical pixel.
fn parse_extent(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() && v >= 1.0 {
        Ok(v)
    } else {
        Err(format!("{v} is not a usable window extent (expected >= 1)"))
    }
}

/// Maps the runtime outcome to the process outcome.
///
/// An unavailable backend was already reported by the fallback handler and
/// is a clean exit. Frame faults and setup errors stay errors.
fn exit_result(result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is::<Unavailable>() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use cubeloop_engine::render_loop::{FrameFault, ManualScheduler, NextFrame, RenderLoop};

    fn frame_fault() -> FrameFault {
        let failing = |_: &mut (), _: &mut NextFrame| -> anyhow::Result<()> {
            anyhow::bail!("surface cannot be recovered")
        };
        let mut rl = RenderLoop::new(ManualScheduler::new());
        let handle = rl.start(|| Capability::Available, |_| {}, failing).unwrap();
        rl.dispatch(handle, &mut ()).unwrap_err()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn unavailable_backend_exits_cleanly() {
        let err = anyhow::Error::from(Unavailable {
            reason: "no adapter".into(),
        });
        assert!(exit_result(Err(err)).is_ok());
        assert!(exit_result(Ok(())).is_ok());
    }

    #[test]
    fn frame_fault_stays_an_error() {
        let res = exit_result(Err(frame_fault().into()));
        let err = res.unwrap_err();
        assert!(err.is::<FrameFault>());
        assert!(!err.is::<Unavailable>());
    }

    #[test]
    fn setup_errors_stay_errors() {
        let res = exit_result(Err(anyhow::anyhow!("failed to create window")));
        assert!(res.is_err());
    }

    #[test]
    fn window_extents_must_be_positive() {
        for bad in ["0", "-640", "0.5", "NaN", "inf", "wide"] {
            assert!(
                Cli::try_parse_from(["cubeloop", "--width", bad]).is_err(),
                "accepted --width {bad}"
            );
        }
        assert!(Cli::try_parse_from(["cubeloop", "--height", "0"]).is_err());

        let cli = Cli::try_parse_from(["cubeloop", "--width", "800", "--height", "600"]).unwrap();
        assert_eq!((cli.width, cli.height), (800.0, 600.0));
    }
}
