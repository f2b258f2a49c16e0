//! Network reconciliation
//!
//! Networking is restored to the commissioning baseline (physical interfaces
//! only, nothing linked), then the declared interfaces are resolved or created
//! in document order. Interfaces created earlier in the same host entry can be
//! used as parents by later ones (a VLAN on top of a bond).

use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use host_config::{AddressMode, HostConfig, InterfaceKind, InterfaceSpec, LinkSpec};
use maas_client::{Fabric, Interface, LinkMode, LinkSubnetRequest, MaasError, Machine, MaasClientTrait, Vlan};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// VLANs of every fabric, keyed by their 802.1Q id
#[derive(Debug, Clone, Default)]
pub struct VlanCatalog(HashMap<u16, Vlan>);

impl VlanCatalog {
    /// Index the VLANs of all fabrics; a vid present in several fabrics
    /// resolves to the first one listed
    pub fn from_fabrics(fabrics: Vec<Fabric>) -> Self {
        let mut vlans = HashMap::new();
        for fabric in fabrics {
            for vlan in fabric.vlans {
                vlans.entry(vlan.vid).or_insert(vlan);
            }
        }
        Self(vlans)
    }

    pub fn get(&self, vid: u16) -> Option<&Vlan> {
        self.0.get(&vid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn link_request(link: &LinkSpec, subnet_id: u64) -> LinkSubnetRequest {
    let (mode, ip_address) = match &link.address {
        AddressMode::Auto => (LinkMode::Auto, None),
        AddressMode::Dhcp => (LinkMode::Dhcp, None),
        AddressMode::Static(address) => (LinkMode::Static, Some(address.clone())),
    };
    LinkSubnetRequest {
        mode,
        subnet_id,
        ip_address,
    }
}

/// Network steps for one machine
struct NetworkReconciler<'c> {
    client: &'c dyn MaasClientTrait,
    vlans: &'c VlanCatalog,
    system_id: &'c str,
    hostname: &'c str,
    /// Current interfaces, including those created so far
    interfaces: Vec<Interface>,
}

impl NetworkReconciler<'_> {
    fn find(&self, name: &str) -> Result<&Interface, ProvisionError> {
        self.interfaces
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| ProvisionError::InterfaceNotFound {
                hostname: self.hostname.to_string(),
                interface: name.to_string(),
            })
    }

    /// Replace the local copy of an interface after the backend changed it
    fn remember(&mut self, interface: Interface) {
        match self.interfaces.iter_mut().find(|i| i.id == interface.id) {
            Some(existing) => *existing = interface,
            None => self.interfaces.push(interface),
        }
    }

    /// Resolve or create the interface an entry describes
    async fn interface(&mut self, spec: &InterfaceSpec) -> Result<Interface, ProvisionError> {
        match &spec.kind {
            InterfaceKind::Physical => self.find(&spec.name).cloned(),
            InterfaceKind::Bond { parents, mode } => {
                let parent_ids = parents
                    .iter()
                    .map(|p| self.find(p).map(|i| i.id))
                    .collect::<Result<Vec<_>, _>>()?;
                info!("Creating bond {} ({}) over {}", spec.name, mode, parents.join(", "));
                let bond = self
                    .client
                    .create_bond(self.system_id, &spec.name, &parent_ids, mode)
                    .await?;
                self.remember(bond.clone());
                Ok(bond)
            }
            InterfaceKind::Vlan { parent, vid } => {
                let parent_id = self.find(parent)?.id;
                let vlan_id = self
                    .vlans
                    .get(*vid)
                    .map(|v| v.id)
                    .ok_or(ProvisionError::VlanNotFound(*vid))?;

                info!("Moving {} to VLAN {}", parent, vid);
                let updated = self
                    .client
                    .update_interface_vlan(self.system_id, parent_id, vlan_id)
                    .await?;
                self.remember(updated);

                info!("Creating VLAN interface {} on {}", spec.name, parent);
                let mut interface = self
                    .client
                    .create_vlan_interface(self.system_id, parent_id, vlan_id)
                    .await?;
                if interface.name != spec.name {
                    debug!("Renaming {} to {}", interface.name, spec.name);
                    interface = self
                        .client
                        .rename_interface(self.system_id, interface.id, &spec.name)
                        .await?;
                }
                self.remember(interface.clone());
                Ok(interface)
            }
        }
    }

    async fn link(&mut self, interface: &Interface, link: &LinkSpec) -> Result<(), ProvisionError> {
        let subnet = match self.client.get_subnet(&link.subnet).await {
            Ok(subnet) => subnet,
            Err(MaasError::NotFound(_)) => return Err(ProvisionError::SubnetNotFound(link.subnet.clone())),
            Err(e) => return Err(e.into()),
        };

        let request = link_request(link, subnet.id);
        info!("Linking {} to {} ({})", interface.name, subnet.cidr, request.mode.as_str());
        let linked = self
            .client
            .link_subnet(self.system_id, interface.id, &request)
            .await?;

        if link.default_gateway {
            match gateway_link(&linked, subnet.id) {
                Some(link_id) => {
                    info!("Setting {} as default gateway interface", interface.name);
                    self.client
                        .set_default_gateway(self.system_id, interface.id, link_id)
                        .await?;
                }
                None => warn!(
                    "No link to {} on {} of {}, default gateway not set",
                    subnet.cidr, interface.name, self.hostname
                ),
            }
        }
        self.remember(linked);
        Ok(())
    }

    async fn apply(&mut self, spec: &InterfaceSpec) -> Result<(), ProvisionError> {
        let interface = self.interface(spec).await?;
        if let Some(link) = &spec.link {
            self.link(&interface, link).await?;
        }

        let saved = self.client.get_interface(self.system_id, interface.id).await?;
        debug!("Interface {} has {} link(s)", saved.name, saved.links.len());
        self.remember(saved);
        Ok(())
    }
}

/// Most recent link of `interface` on the given subnet
fn gateway_link(interface: &Interface, subnet_id: u64) -> Option<u64> {
    interface
        .links
        .iter()
        .rev()
        .find(|l| l.subnet.as_ref().is_some_and(|s| s.id == subnet_id))
        .map(|l| l.id)
}

impl ProvisionContext {
    /// Restore the machine's networking and build the declared interfaces
    pub async fn reconcile_network(&mut self, machine: &Machine, host: &HostConfig) -> Result<(), ProvisionError> {
        if self.client.list_interfaces(&machine.system_id).await?.is_empty() {
            return Err(ProvisionError::NoInterfaces(host.name.clone()));
        }

        if self.vlans.is_none() {
            let catalog = VlanCatalog::from_fabrics(self.client.list_fabrics().await?);
            debug!("Indexed {} VLAN(s)", catalog.len());
            self.vlans = Some(catalog);
        }
        let Self { client, vlans, .. } = self;
        let client: &dyn MaasClientTrait = &**client;
        let vlans: &VlanCatalog = vlans.get_or_insert_with(VlanCatalog::default);

        client.restore_networking_configuration(&machine.system_id).await?;
        let mut reconciler = NetworkReconciler {
            client,
            vlans,
            system_id: &machine.system_id,
            hostname: &host.name,
            interfaces: client.list_interfaces(&machine.system_id).await?,
        };

        for spec in &host.network {
            info!("Configuring interface {} on {}", spec.name, host.name);
            reconciler.apply(spec).await?;
        }
        Ok(())
    }
}
