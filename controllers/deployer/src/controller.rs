//! Main controller implementation.
//!
//! This module contains the `Controller` struct that drives one provisioning
//! run: candidate selection, commissioning, per-machine reconciliation and
//! deployment.

use crate::context::{ProvisionContext, RunSummary};
use crate::error::ProvisionError;
use crate::matcher::HostMatcher;
use host_config::{Document, HostConfig};
use maas_client::{Machine, MaasClientTrait, NodeStatus};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Machines in NEW carrying at least one of the filter tags, each at most once
pub fn select_candidates(machines: Vec<Machine>, tag_filter: &[String]) -> Vec<Machine> {
    let mut seen = HashSet::new();
    machines
        .into_iter()
        .filter(|m| m.status == NodeStatus::New)
        .filter(|m| tag_filter.iter().any(|tag| m.has_tag(tag)))
        .filter(|m| seen.insert(m.system_id.clone()))
        .collect()
}

/// Provisioning controller for one run
pub struct Controller {
    ctx: ProvisionContext,
    hosts: Vec<HostConfig>,
    tag_filter: Vec<String>,
    skip_deploy: bool,
}

impl Controller {
    /// Creates a controller after checking the backend accepts our credentials
    pub async fn new(
        client: Arc<dyn MaasClientTrait>,
        document: Document,
        skip_deploy: bool,
    ) -> Result<Self, ProvisionError> {
        info!("Validating MAAS API key and connectivity...");
        client.validate_credentials().await.map_err(|e| {
            error!("Failed to validate MAAS API key: {}", e);
            error!("Please ensure:");
            error!("  1. MAAS_APIKEY (or maas_apikey) holds a valid consumer:token:secret key");
            error!("  2. MAAS is reachable at {}", client.base_url());
            ProvisionError::Maas(e)
        })?;
        info!("MAAS API key validated");

        Ok(Self {
            ctx: ProvisionContext::new(client, document.lifecycle),
            hosts: document.hosts,
            tag_filter: document.tag_filter,
            skip_deploy,
        })
    }

    /// Runs the provisioning flow to completion
    ///
    /// Fatal errors abort the run and are returned; per-machine anomalies end
    /// up in the returned summary.
    pub async fn run(mut self) -> Result<RunSummary, ProvisionError> {
        let machines = self.ctx.client.list_machines().await?;
        let candidates = select_candidates(machines, &self.tag_filter);
        if candidates.is_empty() {
            return Err(ProvisionError::NoCandidates(self.tag_filter));
        }
        info!(
            "Found {} candidate machine(s): {}",
            candidates.len(),
            candidates.iter().map(|m| m.hostname.as_str()).collect::<Vec<_>>().join(", ")
        );

        let commissioned = self.ctx.commission(candidates).await;

        let mut matcher = HostMatcher::new(&self.hosts);
        let mut configured = Vec::new();
        for machine in commissioned {
            match self.ctx.provision(&mut matcher, machine.clone()).await {
                Ok(Some(machine)) => configured.push(machine),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Failed to configure {}: {}", machine.hostname, e);
                    self.ctx.summary.reconcile_failed.push((machine, e.to_string()));
                }
            }
        }
        let unclaimed: Vec<&str> = matcher.remaining().map(|h| h.name.as_str()).collect();
        if !unclaimed.is_empty() {
            info!("No machine bound to host entries: {}", unclaimed.join(", "));
        }
        self.ctx.summary.configured.extend(configured.iter().cloned());

        if self.skip_deploy {
            info!("Skipping deployment of {} machine(s)", configured.len());
        } else {
            self.ctx.deploy(configured).await;
        }

        Ok(self.ctx.take_summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_client::PowerState;

    fn machine(system_id: &str, status: NodeStatus, tags: &[&str]) -> Machine {
        Machine {
            system_id: system_id.to_string(),
            hostname: format!("host-{}", system_id),
            status,
            status_name: status.to_string(),
            power_state: PowerState::Off,
            power_type: "ipmi".to_string(),
            tag_names: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_select_candidates() {
        let machines = vec![
            machine("a", NodeStatus::New, &["rack-a"]),
            machine("b", NodeStatus::Ready, &["rack-a"]),
            machine("c", NodeStatus::New, &["rack-b"]),
            machine("d", NodeStatus::New, &[]),
            machine("e", NodeStatus::New, &["rack-b", "rack-c"]),
            machine("a", NodeStatus::New, &["rack-a"]),
        ];
        let filter = vec!["rack-a".to_string(), "rack-c".to_string()];

        let selected: Vec<String> = select_candidates(machines, &filter)
            .into_iter()
            .map(|m| m.system_id)
            .collect();
        assert_eq!(selected, vec!["a".to_string(), "e".to_string()]);
    }

    #[test]
    fn test_empty_filter_selects_nothing() {
        let machines = vec![machine("a", NodeStatus::New, &["rack-a"])];
        assert!(select_candidates(machines, &[]).is_empty());
    }
}
