//! Per-machine reconciliation
//!
//! A commissioned machine is bound to its host entry, then its storage,
//! network and tags are brought in line with that entry. Storage and network
//! are destructive-then-constructive: the existing layout is wiped back to a
//! clean baseline before the declared one is built.

pub mod network;
pub mod storage;
pub mod tags;
#[cfg(test)]
mod tags_test;

use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::matcher::HostMatcher;
use maas_client::Machine;
use tracing::info;

impl ProvisionContext {
    /// Bind, then reconcile storage, network and tags of one machine
    ///
    /// Returns the configured machine, or `None` when it could not be bound
    /// to a host entry (already recorded as unmatched).
    pub async fn provision(
        &mut self,
        matcher: &mut HostMatcher<'_>,
        machine: Machine,
    ) -> Result<Option<Machine>, ProvisionError> {
        let Some((machine, host)) = self.bind(matcher, machine).await? else {
            return Ok(None);
        };

        info!("Configuring storage on {}", host.name);
        self.reconcile_storage(&machine, host).await?;

        info!("Configuring network on {}", host.name);
        self.reconcile_network(&machine, host).await?;

        info!("Configuring tags on {}", host.name);
        self.reconcile_tags(&machine, host).await?;

        Ok(Some(machine))
    }
}
