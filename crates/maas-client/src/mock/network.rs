//! Network operations for MockMaasClient
//!
//! Handles interfaces, links, fabrics and subnets

use super::{MachineRecord, MockMaasClient};
use crate::error::MaasError;
use crate::models::*;

fn interface_mut(record: &mut MachineRecord, interface_id: u64) -> Result<&mut Interface, MaasError> {
    record
        .interfaces
        .iter_mut()
        .find(|i| i.id == interface_id)
        .ok_or_else(|| MaasError::NotFound(format!("Interface {} not found", interface_id)))
}

fn ensure_unique_name(record: &MachineRecord, name: &str) -> Result<(), MaasError> {
    if record.interfaces.iter().any(|i| i.name == name) {
        return Err(MaasError::InvalidRequest(format!("Interface {} already exists", name)));
    }
    Ok(())
}

fn find_vlan(client: &MockMaasClient, vlan_id: u64) -> Result<Vlan, MaasError> {
    client
        .fabrics
        .lock()
        .unwrap()
        .iter()
        .flat_map(|f| f.vlans.iter())
        .find(|v| v.id == vlan_id)
        .cloned()
        .ok_or_else(|| MaasError::NotFound(format!("VLAN {} not found", vlan_id)))
}

pub fn restore_networking_configuration(client: &MockMaasClient, system_id: &str) -> Result<Machine, MaasError> {
    client.with_machine("restore_networking", system_id, |record, _| {
        record.interfaces = record.pristine_interfaces.clone();
        record.default_gateway = None;
        Ok(record.machine.clone())
    })
}

pub fn list_interfaces(client: &MockMaasClient, system_id: &str) -> Result<Vec<Interface>, MaasError> {
    client.with_machine("list_interfaces", system_id, |record, _| {
        Ok(record.interfaces.clone())
    })
}

pub fn get_interface(client: &MockMaasClient, system_id: &str, interface_id: u64) -> Result<Interface, MaasError> {
    client.with_machine("get_interface", system_id, |record, _| {
        Ok(interface_mut(record, interface_id)?.clone())
    })
}

pub fn create_bond(
    client: &MockMaasClient,
    system_id: &str,
    name: &str,
    parents: &[u64],
    bond_mode: &str,
) -> Result<Interface, MaasError> {
    client.with_machine("create_bond", system_id, |record, client| {
        ensure_unique_name(record, name)?;
        if parents.is_empty() {
            return Err(MaasError::InvalidRequest(format!("Bond {} needs parents", name)));
        }
        let mut parent_names = Vec::with_capacity(parents.len());
        let mut vlan = None;
        for id in parents {
            let parent = interface_mut(record, *id)?;
            parent_names.push(parent.name.clone());
            if vlan.is_none() {
                vlan = parent.vlan.clone();
            }
        }

        tracing::debug!("mock bond {} ({}) over {:?}", name, bond_mode, parent_names);
        let bond = Interface {
            id: client.next_id(),
            name: name.to_string(),
            interface_type: InterfaceType::Bond,
            parents: parent_names,
            vlan,
            links: Vec::new(),
            mac_address: None,
        };
        record.interfaces.push(bond.clone());
        Ok(bond)
    })
}

pub fn create_vlan_interface(
    client: &MockMaasClient,
    system_id: &str,
    parent: u64,
    vlan_id: u64,
) -> Result<Interface, MaasError> {
    client.with_machine("create_vlan", system_id, |record, client| {
        let vlan = find_vlan(client, vlan_id)?;
        let parent_name = interface_mut(record, parent)?.name.clone();
        let name = format!("{}.{}", parent_name, vlan.vid);
        ensure_unique_name(record, &name)?;

        let interface = Interface {
            id: client.next_id(),
            name,
            interface_type: InterfaceType::Vlan,
            parents: vec![parent_name],
            vlan: Some(vlan),
            links: Vec::new(),
            mac_address: None,
        };
        record.interfaces.push(interface.clone());
        Ok(interface)
    })
}

pub fn rename_interface(
    client: &MockMaasClient,
    system_id: &str,
    interface_id: u64,
    name: &str,
) -> Result<Interface, MaasError> {
    client.with_machine("rename_interface", system_id, |record, _| {
        if record.interfaces.iter().any(|i| i.name == name && i.id != interface_id) {
            return Err(MaasError::InvalidRequest(format!("Interface {} already exists", name)));
        }
        let old_name = interface_mut(record, interface_id)?.name.clone();
        for interface in record.interfaces.iter_mut() {
            for parent in interface.parents.iter_mut().filter(|p| **p == old_name) {
                *parent = name.to_string();
            }
        }
        let interface = interface_mut(record, interface_id)?;
        interface.name = name.to_string();
        Ok(interface.clone())
    })
}

pub fn update_interface_vlan(
    client: &MockMaasClient,
    system_id: &str,
    interface_id: u64,
    vlan_id: u64,
) -> Result<Interface, MaasError> {
    client.with_machine("update_interface_vlan", system_id, |record, client| {
        let vlan = find_vlan(client, vlan_id)?;
        let interface = interface_mut(record, interface_id)?;
        interface.vlan = Some(vlan);
        Ok(interface.clone())
    })
}

pub fn link_subnet(
    client: &MockMaasClient,
    system_id: &str,
    interface_id: u64,
    request: &LinkSubnetRequest,
) -> Result<Interface, MaasError> {
    client.with_machine("link_subnet", system_id, |record, client| {
        let subnet = client
            .subnets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == request.subnet_id)
            .cloned()
            .ok_or_else(|| MaasError::NotFound(format!("Subnet {} not found", request.subnet_id)))?;
        if request.mode == LinkMode::Static && request.ip_address.is_none() {
            return Err(MaasError::InvalidRequest("STATIC links need an ip_address".to_string()));
        }

        let link = Link {
            id: client.next_id(),
            mode: request.mode,
            subnet: Some(subnet),
            ip_address: request.ip_address.clone(),
        };
        let interface = interface_mut(record, interface_id)?;
        interface.links.push(link);
        Ok(interface.clone())
    })
}

pub fn set_default_gateway(
    client: &MockMaasClient,
    system_id: &str,
    interface_id: u64,
    link_id: u64,
) -> Result<Interface, MaasError> {
    client.with_machine("set_default_gateway", system_id, |record, _| {
        let interface = interface_mut(record, interface_id)?.clone();
        if !interface.links.iter().any(|l| l.id == link_id) {
            return Err(MaasError::InvalidRequest(format!(
                "Link {} does not belong to {}",
                link_id, interface.name
            )));
        }
        record.default_gateway = Some((interface_id, link_id));
        Ok(interface)
    })
}

pub fn list_fabrics(client: &MockMaasClient) -> Result<Vec<Fabric>, MaasError> {
    client.journal("list_fabrics", "*");
    Ok(client.fabrics.lock().unwrap().clone())
}

/// Subnets are addressed by id, name, CIDR or `cidr:<CIDR>`
pub fn get_subnet(client: &MockMaasClient, identifier: &str) -> Result<Subnet, MaasError> {
    client.journal("get_subnet", identifier);
    let cidr = identifier.strip_prefix("cidr:").unwrap_or(identifier);
    client
        .subnets
        .lock()
        .unwrap()
        .iter()
        .find(|s| s.id.to_string() == identifier || s.cidr == cidr || s.name == identifier)
        .cloned()
        .ok_or_else(|| MaasError::NotFound(format!("Subnet {} not found", identifier)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maas_trait::MaasClientTrait;

    fn client_with_nics() -> (MockMaasClient, u64, u64) {
        let client = MockMaasClient::new("http://maas");
        client.add_machine(Machine {
            system_id: "m1".to_string(),
            hostname: "m1".to_string(),
            status: NodeStatus::Ready,
            status_name: "Ready".to_string(),
            power_state: PowerState::Off,
            power_type: "ipmi".to_string(),
            tag_names: Vec::new(),
        });
        let eth0 = client.add_physical_interface("m1", "eth0");
        let eth1 = client.add_physical_interface("m1", "eth1");
        (client, eth0, eth1)
    }

    #[tokio::test]
    async fn test_restore_drops_virtual_interfaces_and_links() {
        let (client, eth0, eth1) = client_with_nics();
        let subnet = client.add_subnet("10.0.0.0/24", None);
        client.create_bond("m1", "bond0", &[eth0, eth1], "802.3ad").await.unwrap();
        let request = LinkSubnetRequest {
            mode: LinkMode::Dhcp,
            subnet_id: subnet.id,
            ip_address: None,
        };
        client.link_subnet("m1", eth0, &request).await.unwrap();

        client.restore_networking_configuration("m1").await.unwrap();

        let interfaces = client.interfaces("m1");
        assert_eq!(interfaces.len(), 2);
        assert!(interfaces.iter().all(|i| i.links.is_empty()));
    }

    #[tokio::test]
    async fn test_vlan_interface_uses_catalog_vlan() {
        let (client, eth0, _) = client_with_nics();
        let vlans = client.add_fabric("fabric-0", &[100]);

        let vlan_if = client
            .create_vlan_interface("m1", eth0, vlans[0].id)
            .await
            .unwrap();
        assert_eq!(vlan_if.name, "eth0.100");
        assert_eq!(vlan_if.parents, vec!["eth0".to_string()]);
        assert_eq!(vlan_if.vlan.unwrap().vid, 100);

        assert!(client.create_vlan_interface("m1", eth0, 9999).await.is_err());
    }

    #[tokio::test]
    async fn test_rename_interface() {
        let (client, eth0, eth1) = client_with_nics();
        let vlans = client.add_fabric("fabric-0", &[100]);
        let vlan_if = client.create_vlan_interface("m1", eth0, vlans[0].id).await.unwrap();

        let renamed = client.rename_interface("m1", vlan_if.id, "mgmt").await.unwrap();
        assert_eq!(renamed.name, "mgmt");
        assert!(client.interfaces("m1").iter().any(|i| i.name == "mgmt"));

        let err = client.rename_interface("m1", eth1, "mgmt").await.unwrap_err();
        assert!(matches!(err, MaasError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_default_gateway_requires_link() {
        let (client, eth0, _) = client_with_nics();
        let subnet = client.add_subnet("10.0.0.0/24", None);
        assert!(client.set_default_gateway("m1", eth0, 42).await.is_err());

        let request = LinkSubnetRequest {
            mode: LinkMode::Static,
            subnet_id: subnet.id,
            ip_address: Some("10.0.0.5".to_string()),
        };
        let linked = client.link_subnet("m1", eth0, &request).await.unwrap();
        let link_id = linked.links[0].id;
        client.set_default_gateway("m1", eth0, link_id).await.unwrap();
        assert_eq!(client.default_gateway("m1"), Some((eth0, link_id)));
    }

    #[tokio::test]
    async fn test_get_subnet_by_cidr_or_id() {
        let client = MockMaasClient::new("http://maas");
        let subnet = client.add_subnet("192.168.1.0/24", None);

        assert_eq!(client.get_subnet("192.168.1.0/24").await.unwrap().id, subnet.id);
        assert_eq!(client.get_subnet("cidr:192.168.1.0/24").await.unwrap().id, subnet.id);
        assert_eq!(client.get_subnet(&subnet.id.to_string()).await.unwrap().id, subnet.id);
        assert!(client.get_subnet("10.9.9.0/24").await.unwrap_err().is_not_found());
    }
}
