use thiserror::Error;

use super::LoopHandle;

/// The capability probe reported that the rendering backend cannot run here.
///
/// Not fatal to the hosting process. Resuming requires a fresh `start`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rendering backend unavailable: {reason}")]
pub struct Unavailable {
    /// Human-readable diagnostic, suitable for showing to a user.
    pub reason: String,
}

/// A scheduled frame returned an error.
///
/// The loop that produced the fault has already been torn down when this value
/// reaches the caller; no further frames run for `handle`.
#[derive(Debug, Error)]
#[error("frame {frame_index} of {handle} faulted")]
pub struct FrameFault {
    pub handle: LoopHandle,

    /// Zero-based index of the faulting invocation within its loop.
    pub frame_index: u64,

    #[source]
    pub error: anyhow::Error,
}
