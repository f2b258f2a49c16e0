//! Tag reconciliation
//!
//! Tags are additive: declared tags are created fleet-wide when missing and
//! attached to the machine when it does not carry them yet. Tags the machine
//! already has are never removed.

use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use host_config::HostConfig;
use maas_client::Machine;
use std::collections::HashSet;
use tracing::{debug, info};

impl ProvisionContext {
    pub async fn reconcile_tags(&self, machine: &Machine, host: &HostConfig) -> Result<(), ProvisionError> {
        if host.tags.is_empty() {
            return Ok(());
        }

        let mut existing: HashSet<String> = self
            .client
            .list_tags()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        for tag in &host.tags {
            if !existing.contains(tag) {
                info!("Creating tag {}", tag);
                self.client.create_tag(tag, None).await?;
                existing.insert(tag.clone());
            }

            if machine.has_tag(tag) {
                debug!("{} already tagged {}", host.name, tag);
                continue;
            }
            info!("Tagging {} with {}", host.name, tag);
            self.client.add_tag_to_machine(tag, &machine.system_id).await?;
        }
        Ok(())
    }
}
