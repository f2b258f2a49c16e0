//! Commission and deploy phases
//!
//! Both phases fire non-blocking requests at MAAS, then poll every pending
//! machine on a fixed cadence until the pending set drains or the phase times
//! out. Each tick snapshots the pending ids, refreshes them concurrently,
//! classifies every observation and applies the transitions in one batch.

use crate::context::ProvisionContext;
use crate::poll::PollSchedule;
use futures::future::join_all;
use host_config::DeployFailurePolicy;
use maas_client::{Machine, MaasClientTrait, MaasError, NodeStatus, PowerState};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Next state of a pending machine after one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still in a transient state, keep polling
    Pending,
    Succeeded,
    Failed,
}

/// COMMISSIONING and TESTING are transient, READY succeeds, anything else fails
pub fn classify_commission(status: NodeStatus) -> Transition {
    match status {
        NodeStatus::Commissioning | NodeStatus::Testing => Transition::Pending,
        NodeStatus::Ready => Transition::Succeeded,
        _ => Transition::Failed,
    }
}

/// Only DEPLOYED succeeds; FAILED_* statuses fail unless the policy is `wait`
pub fn classify_deploy(status: NodeStatus, policy: DeployFailurePolicy) -> Transition {
    match status {
        NodeStatus::Deployed => Transition::Succeeded,
        status if status.is_failed() && policy == DeployFailurePolicy::Fail => Transition::Failed,
        _ => Transition::Pending,
    }
}

/// Buckets produced by one phase
#[derive(Debug, Default)]
pub struct PhaseOutcome {
    pub succeeded: Vec<Machine>,
    pub failed: Vec<Machine>,
    pub timed_out: Vec<Machine>,
}

impl PhaseOutcome {
    /// Apply one tick's observations to the pending set
    fn apply(
        &mut self,
        pending: &mut BTreeMap<String, Machine>,
        observations: Vec<(String, Result<Machine, MaasError>)>,
        classify: impl Fn(NodeStatus) -> Transition,
    ) {
        for (system_id, observation) in observations {
            let machine = match observation {
                Ok(machine) => machine,
                Err(e) => {
                    warn!("Failed to refresh machine {} (will retry): {}", system_id, e);
                    continue;
                }
            };

            match classify(machine.status) {
                Transition::Pending => {
                    debug!("{} is {}", machine.hostname, machine.status_name);
                    pending.insert(system_id, machine);
                }
                Transition::Succeeded => {
                    pending.remove(&system_id);
                    self.succeeded.push(machine);
                }
                Transition::Failed => {
                    pending.remove(&system_id);
                    self.failed.push(machine);
                }
            }
        }
    }
}

/// Poll `pending` until it drains or `max_wait` runs out
async fn poll_until_settled<F, Fut>(
    phase: &str,
    interval: Duration,
    max_wait: Option<Duration>,
    mut pending: BTreeMap<String, Machine>,
    mut outcome: PhaseOutcome,
    observe: F,
    classify: impl Fn(NodeStatus) -> Transition,
) -> PhaseOutcome
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Machine, MaasError>>,
{
    let mut schedule = PollSchedule::new(interval, max_wait);

    while !pending.is_empty() {
        schedule.wait().await;

        let snapshot: Vec<String> = pending.keys().cloned().collect();
        let observations = join_all(snapshot.iter().map(|id| observe(id.clone()))).await;
        outcome.apply(&mut pending, snapshot.into_iter().zip(observations).collect(), &classify);

        if !pending.is_empty() && schedule.expired() {
            warn!(
                "{} timed out after {:?} with {} machine(s) pending",
                phase,
                schedule.elapsed(),
                pending.len()
            );
            outcome.timed_out.extend(pending.into_values());
            break;
        }
    }

    info!(
        "{} finished after {} poll(s): {} succeeded, {} failed, {} timed out",
        phase,
        schedule.polls(),
        outcome.succeeded.len(),
        outcome.failed.len(),
        outcome.timed_out.len()
    );
    outcome
}

/// Refresh a deploying machine, powering it back on if it stayed off
///
/// MAAS sometimes leaves a machine powered off after the reboot it performs
/// mid-deployment; the machine then never reaches DEPLOYED on its own.
async fn observe_deploying(client: &dyn MaasClientTrait, system_id: &str) -> Result<Machine, MaasError> {
    let machine = client.get_machine(system_id).await?;
    if machine.status == NodeStatus::Deploying
        && client.query_power_state(system_id).await? == PowerState::Off
    {
        warn!("Powering on {} (off while deploying)", machine.hostname);
        client.power_on_machine(system_id).await?;
    }
    Ok(machine)
}

impl ProvisionContext {
    /// Commission every candidate and wait until each is READY, failed or timed out
    ///
    /// Returns the commissioned machines; the other outcomes are recorded in
    /// the run summary.
    pub async fn commission(&mut self, candidates: Vec<Machine>) -> Vec<Machine> {
        let client: &dyn MaasClientTrait = self.client.as_ref();
        let mut outcome = PhaseOutcome::default();
        let mut pending = BTreeMap::new();

        for machine in candidates {
            info!("Commissioning {}", machine.hostname);
            match client.commission_machine(&machine.system_id).await {
                Ok(requested) => {
                    pending.insert(requested.system_id.clone(), requested);
                }
                Err(e) => {
                    warn!("Failed to commission {}: {}", machine.hostname, e);
                    outcome.failed.push(machine);
                }
            }
        }

        let outcome = poll_until_settled(
            "Commissioning",
            self.settings.poll_interval(),
            self.settings.commission_timeout(),
            pending,
            outcome,
            |id: String| async move { client.get_machine(&id).await },
            classify_commission,
        )
        .await;

        for machine in &outcome.failed {
            warn!("{} failed commissioning with {}", machine.hostname, machine.status_name);
        }
        self.summary.commissioned.extend(outcome.succeeded.iter().cloned());
        self.summary.commission_failed.extend(outcome.failed);
        self.summary.commission_timed_out.extend(outcome.timed_out);
        outcome.succeeded
    }

    /// Deploy the configured machines and wait until each is DEPLOYED, failed or timed out
    pub async fn deploy(&mut self, machines: Vec<Machine>) {
        let client: &dyn MaasClientTrait = self.client.as_ref();
        let policy = self.settings.deploy_failure;
        let mut outcome = PhaseOutcome::default();
        let mut pending = BTreeMap::new();

        for machine in machines {
            info!("Deploying {}", machine.hostname);
            match client.deploy_machine(&machine.system_id).await {
                Ok(requested) => {
                    pending.insert(requested.system_id.clone(), requested);
                }
                Err(e) => {
                    warn!("Failed to deploy {}: {}", machine.hostname, e);
                    outcome.failed.push(machine);
                }
            }
        }

        let outcome = poll_until_settled(
            "Deployment",
            self.settings.poll_interval(),
            self.settings.deploy_timeout(),
            pending,
            outcome,
            |id: String| async move { observe_deploying(client, &id).await },
            |status| classify_deploy(status, policy),
        )
        .await;

        for machine in &outcome.succeeded {
            info!("Machine {} deployed", machine.hostname);
        }
        self.summary.deployed.extend(outcome.succeeded);
        self.summary.deploy_failed.extend(outcome.failed);
        self.summary.deploy_timed_out.extend(outcome.timed_out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_commission() {
        assert_eq!(classify_commission(NodeStatus::Commissioning), Transition::Pending);
        assert_eq!(classify_commission(NodeStatus::Testing), Transition::Pending);
        assert_eq!(classify_commission(NodeStatus::Ready), Transition::Succeeded);
        assert_eq!(classify_commission(NodeStatus::FailedCommissioning), Transition::Failed);
        assert_eq!(classify_commission(NodeStatus::FailedTesting), Transition::Failed);
        assert_eq!(classify_commission(NodeStatus::New), Transition::Failed);
        assert_eq!(classify_commission(NodeStatus::Other(99)), Transition::Failed);
    }

    #[test]
    fn test_classify_deploy() {
        let fail = DeployFailurePolicy::Fail;
        let wait = DeployFailurePolicy::Wait;

        assert_eq!(classify_deploy(NodeStatus::Deploying, fail), Transition::Pending);
        assert_eq!(classify_deploy(NodeStatus::Deployed, fail), Transition::Succeeded);
        assert_eq!(classify_deploy(NodeStatus::FailedDeployment, fail), Transition::Failed);
        assert_eq!(classify_deploy(NodeStatus::FailedDeployment, wait), Transition::Pending);
        assert_eq!(classify_deploy(NodeStatus::Allocated, fail), Transition::Pending);
    }
}
