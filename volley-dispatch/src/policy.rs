//! Batch failure-handling policy.

use serde::{Deserialize, Serialize};

/// How the orchestrator reacts to send failures.
///
/// Retry and abort behavior are configuration rather than constants,
/// so deployments can tune them without touching the dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPolicy {
    /// Stop the batch at the first authentication failure. Credentials
    /// are shared across the batch, so further attempts cannot succeed.
    ///
    /// Default: true
    #[serde(default = "defaults::abort_on_auth_failure")]
    pub abort_on_auth_failure: bool,

    /// Immediate retries applied to a transient network failure before
    /// the outcome is recorded.
    ///
    /// Default: 1
    #[serde(default = "defaults::transient_retries")]
    pub transient_retries: u32,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            abort_on_auth_failure: defaults::abort_on_auth_failure(),
            transient_retries: defaults::transient_retries(),
        }
    }
}

mod defaults {
    pub const fn abort_on_auth_failure() -> bool {
        true
    }

    pub const fn transient_retries() -> u32 {
        1
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = DispatchPolicy::default();
        assert!(policy.abort_on_auth_failure);
        assert_eq!(policy.transient_retries, 1);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let policy: DispatchPolicy =
            serde_json::from_str(r#"{ "transient_retries": 0 }"#).unwrap();
        assert_eq!(policy.transient_retries, 0);
        assert!(policy.abort_on_auth_failure);
    }
}
