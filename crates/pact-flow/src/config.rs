//! Flow engine configuration.

use std::time::Duration;

/// Flow configuration shared by both roles.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Bound on every suspension point (message waits and sub-protocol
    /// waits). On expiry the flow fails with a timeout, distinct from a
    /// rejection; any soft locks it holds are left to the recovery sweep.
    pub exchange_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            exchange_timeout: Duration::from_secs(30),
        }
    }
}
