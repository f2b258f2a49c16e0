//! Run-scoped provisioning state
//!
//! One `ProvisionContext` lives for a single run: it owns the backend handle,
//! the lifecycle settings, the machine buckets and the VLAN catalog, and is
//! handed to every lifecycle and reconciliation step.

use crate::reconciler::network::VlanCatalog;
use host_config::LifecycleSettings;
use maas_client::{Machine, MaasClientTrait};
use std::sync::Arc;
use tracing::{info, warn};

/// Where each machine ended up during a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub commissioned: Vec<Machine>,
    pub commission_failed: Vec<Machine>,
    pub commission_timed_out: Vec<Machine>,
    /// Commissioned machines without IPMI settings
    pub unmatched: Vec<Machine>,
    /// Machines whose reconciliation hit a backend error
    pub reconcile_failed: Vec<(Machine, String)>,
    pub configured: Vec<Machine>,
    pub deployed: Vec<Machine>,
    pub deploy_failed: Vec<Machine>,
    pub deploy_timed_out: Vec<Machine>,
}

fn hostnames(machines: &[Machine]) -> String {
    machines
        .iter()
        .map(|m| m.hostname.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl RunSummary {
    /// Log the outcome of the run
    pub fn log(&self) {
        info!("Run summary:");
        info!("  Commissioned: {} [{}]", self.commissioned.len(), hostnames(&self.commissioned));
        info!("  Configured: {} [{}]", self.configured.len(), hostnames(&self.configured));
        info!("  Deployed: {} [{}]", self.deployed.len(), hostnames(&self.deployed));

        for machine in &self.commission_failed {
            warn!("  {} failed commissioning with {}", machine.hostname, machine.status_name);
        }
        for machine in &self.commission_timed_out {
            warn!("  {} timed out commissioning in {}", machine.hostname, machine.status_name);
        }
        for machine in &self.unmatched {
            warn!("  {} is missing IPMI settings and was not configured", machine.hostname);
        }
        for (machine, reason) in &self.reconcile_failed {
            warn!("  {} could not be configured: {}", machine.hostname, reason);
        }
        for machine in &self.deploy_failed {
            warn!("  {} failed deployment with {}", machine.hostname, machine.status_name);
        }
        for machine in &self.deploy_timed_out {
            warn!("  {} timed out deploying in {}", machine.hostname, machine.status_name);
        }
    }
}

/// State shared by the steps of one provisioning run
pub struct ProvisionContext {
    pub(crate) client: Arc<dyn MaasClientTrait>,
    pub(crate) settings: LifecycleSettings,
    pub(crate) summary: RunSummary,
    /// Built from the fabric list on first use, then reused for every machine
    pub(crate) vlans: Option<VlanCatalog>,
}

impl std::fmt::Debug for ProvisionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionContext")
            .field("maas_url", &self.client.base_url())
            .field("settings", &self.settings)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl ProvisionContext {
    pub fn new(client: Arc<dyn MaasClientTrait>, settings: LifecycleSettings) -> Self {
        Self {
            client,
            settings,
            summary: RunSummary::default(),
            vlans: None,
        }
    }

    /// Hand the buckets over at the end of the run
    pub fn take_summary(&mut self) -> RunSummary {
        std::mem::take(&mut self.summary)
    }
}
