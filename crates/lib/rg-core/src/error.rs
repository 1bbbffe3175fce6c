use crate::handle::RawHandle;

/// Failure modes of the render graph, from builder-time misuse through
/// executor-time device failure.
#[derive(thiserror::Error, Debug)]
pub enum RgError {
    #[error("handle {0:?} does not refer to a live resource in this frame")]
    UnknownHandle(RawHandle),

    #[error("invalid access on resource {handle:?}: {reason}")]
    InvalidAccess { handle: RawHandle, reason: String },

    #[error("pass dependency graph contains a cycle: {0}")]
    CyclicDependency(String),

    #[error("swapchain misuse: {0}")]
    SwapchainMisuse(String),

    #[error("device out of memory while allocating {name}")]
    OutOfMemory { name: String },

    #[error("timed out waiting on {0}")]
    Timeout(String),

    #[error("device lost during submission or presentation")]
    DeviceLost,
}

pub type RgResult<T> = std::result::Result<T, RgError>;
