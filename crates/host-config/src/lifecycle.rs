//! Commission/deploy polling settings

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with a machine observed in a FAILED_* status while deploying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeployFailurePolicy {
    /// Record the machine as deploy-failed and stop polling it
    #[default]
    Fail,

    /// Keep polling until DEPLOYED (or the deploy timeout)
    Wait,
}

/// The optional `lifecycle` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LifecycleSettings {
    /// Seconds between two status polls
    pub poll_interval_secs: u64,

    /// Upper bound on the commissioning phase in seconds, 0 for none
    pub commission_timeout_secs: u64,

    /// Upper bound on the deployment phase in seconds, 0 for none
    pub deploy_timeout_secs: u64,

    pub deploy_failure: DeployFailurePolicy,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            commission_timeout_secs: 3600,
            deploy_timeout_secs: 3600,
            deploy_failure: DeployFailurePolicy::Fail,
        }
    }
}

fn bound(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl LifecycleSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn commission_timeout(&self) -> Option<Duration> {
        bound(self.commission_timeout_secs)
    }

    pub fn deploy_timeout(&self) -> Option<Duration> {
        bound(self.deploy_timeout_secs)
    }
}
