use std::time::Duration;

/// Plain configuration struct, constructed with an owned-pattern builder —
/// not a file-driven layer, since the core has no CLI/file-format surface
/// of its own.
#[derive(Clone, Copy, Debug, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct RenderGraphConfig {
    /// How many frames the Executor allows the CPU to submit ahead of the
    /// GPU before blocking on `Device::wait_idle` — see
    /// [`crate::executor::Executor::execute`].
    #[builder(default = "2")]
    pub frames_in_flight: u32,

    /// Default acquire timeout `Executor::execute_with_default_timeout`
    /// applies, when the caller doesn't want to pick one per call.
    #[builder(default = "Duration::from_millis(16)")]
    pub default_wait_timeout: Duration,
}

impl RenderGraphConfig {
    pub fn builder() -> RenderGraphConfigBuilder {
        RenderGraphConfigBuilder::default()
    }
}

impl Default for RenderGraphConfig {
    fn default() -> Self {
        RenderGraphConfigBuilder::default().build().unwrap()
    }
}
