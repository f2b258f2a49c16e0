//! MAAS API client
//!
//! Implements the MAAS 2.0 REST API client for the deployer.
//! Based on the MAAS API structure: /api/2.0/machines/, /api/2.0/nodes/{id}/...

use crate::common::query::{machine_path, node_object_path, node_path, with_op, API_PREFIX};
use crate::common::{ApiKey, HttpClient};
use crate::error::MaasError;
use crate::models::*;
use crate::maas_trait::MaasClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// MAAS API client
#[derive(Debug)]
pub struct MaasClient {
    http: HttpClient,
}

impl MaasClient {
    /// Create a new MAAS client
    ///
    /// # Arguments
    /// * `base_url` - MAAS base URL (e.g., "http://maas:5240/MAAS")
    /// * `api_key` - API key in `consumer_key:token_key:token_secret` form
    pub fn new(base_url: String, api_key: &str) -> Result<Self, MaasError> {
        let api_key = ApiKey::parse(api_key)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(MaasError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, base_url, api_key),
        })
    }

    fn partition_path(system_id: &str, device_id: u64, partition_id: u64) -> String {
        format!(
            "{}partition/{}/",
            node_object_path(system_id, "blockdevices", device_id),
            partition_id
        )
    }
}

#[async_trait::async_trait]
impl MaasClientTrait for MaasClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Validate the API key by asking MAAS who we are.
    ///
    /// # Returns
    /// * `Ok(())` - Key is valid and MAAS is reachable
    /// * `Err(MaasError)` - Key is invalid or MAAS is unreachable
    async fn validate_credentials(&self) -> Result<(), MaasError> {
        debug!("Validating MAAS API key and connectivity");
        let path = with_op(&format!("{}/users/", API_PREFIX), "whoami");
        let _user: serde_json::Value = self.http.get(&path).await?;
        debug!("API key validated successfully");
        Ok(())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, MaasError> {
        self.http.get(&format!("{}/machines/", API_PREFIX)).await
    }

    async fn get_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        self.http.get(&machine_path(system_id)).await
    }

    async fn commission_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        debug!("Requesting commissioning of {}", system_id);
        self.http
            .post(&with_op(&machine_path(system_id), "commission"), &[])
            .await
    }

    async fn deploy_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        debug!("Requesting deployment of {}", system_id);
        self.http
            .post(&with_op(&machine_path(system_id), "deploy"), &[])
            .await
    }

    async fn query_power_state(&self, system_id: &str) -> Result<PowerState, MaasError> {
        let response: PowerStateResponse = self
            .http
            .get(&with_op(&machine_path(system_id), "query_power_state"))
            .await?;
        Ok(response.state)
    }

    async fn power_on_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        self.http
            .post(&with_op(&machine_path(system_id), "power_on"), &[])
            .await
    }

    async fn get_power_parameters(&self, system_id: &str) -> Result<PowerParameters, MaasError> {
        self.http
            .get(&with_op(&machine_path(system_id), "power_parameters"))
            .await
    }

    async fn set_hostname(&self, system_id: &str, hostname: &str) -> Result<Machine, MaasError> {
        self.http
            .put(&machine_path(system_id), &[("hostname", hostname.to_string())])
            .await
    }

    async fn restore_storage_configuration(&self, system_id: &str) -> Result<Machine, MaasError> {
        self.http
            .post(
                &with_op(&machine_path(system_id), "restore_storage_configuration"),
                &[],
            )
            .await
    }

    async fn list_block_devices(&self, system_id: &str) -> Result<Vec<BlockDevice>, MaasError> {
        self.http.get(&node_path(system_id, "blockdevices")).await
    }

    async fn set_boot_disk(&self, system_id: &str, device_id: u64) -> Result<(), MaasError> {
        self.http
            .post_unit(
                &with_op(
                    &node_object_path(system_id, "blockdevices", device_id),
                    "set_boot_disk",
                ),
                &[],
            )
            .await
    }

    async fn format_block_device(&self, system_id: &str, device_id: u64, fstype: &str) -> Result<BlockDevice, MaasError> {
        self.http
            .post(
                &with_op(&node_object_path(system_id, "blockdevices", device_id), "format"),
                &[("fstype", fstype.to_string())],
            )
            .await
    }

    async fn mount_block_device(&self, system_id: &str, device_id: u64, mount_point: &str) -> Result<BlockDevice, MaasError> {
        self.http
            .post(
                &with_op(&node_object_path(system_id, "blockdevices", device_id), "mount"),
                &[("mount_point", mount_point.to_string())],
            )
            .await
    }

    async fn create_partition(&self, system_id: &str, device_id: u64, size: u64) -> Result<Partition, MaasError> {
        let path = format!(
            "{}partitions/",
            node_object_path(system_id, "blockdevices", device_id)
        );
        self.http.post(&path, &[("size", size.to_string())]).await
    }

    async fn delete_partition(&self, system_id: &str, device_id: u64, partition_id: u64) -> Result<(), MaasError> {
        self.http
            .delete(&Self::partition_path(system_id, device_id, partition_id))
            .await
    }

    async fn format_partition(&self, system_id: &str, device_id: u64, partition_id: u64, fstype: &str) -> Result<Partition, MaasError> {
        self.http
            .post(
                &with_op(&Self::partition_path(system_id, device_id, partition_id), "format"),
                &[("fstype", fstype.to_string())],
            )
            .await
    }

    async fn mount_partition(&self, system_id: &str, device_id: u64, partition_id: u64, mount_point: &str) -> Result<Partition, MaasError> {
        self.http
            .post(
                &with_op(&Self::partition_path(system_id, device_id, partition_id), "mount"),
                &[("mount_point", mount_point.to_string())],
            )
            .await
    }

    async fn list_volume_groups(&self, system_id: &str) -> Result<Vec<VolumeGroup>, MaasError> {
        self.http.get(&node_path(system_id, "volume-groups")).await
    }

    async fn get_volume_group(&self, system_id: &str, volume_group_id: u64) -> Result<VolumeGroup, MaasError> {
        self.http
            .get(&node_object_path(system_id, "volume-group", volume_group_id))
            .await
    }

    async fn create_volume_group(&self, system_id: &str, name: &str, block_devices: &[u64], partitions: &[u64]) -> Result<VolumeGroup, MaasError> {
        let mut form = vec![("name", name.to_string())];
        form.extend(block_devices.iter().map(|id| ("block_devices", id.to_string())));
        form.extend(partitions.iter().map(|id| ("partitions", id.to_string())));
        self.http
            .post(&node_path(system_id, "volume-groups"), &form)
            .await
    }

    async fn delete_volume_group(&self, system_id: &str, volume_group_id: u64) -> Result<(), MaasError> {
        self.http
            .delete(&node_object_path(system_id, "volume-group", volume_group_id))
            .await
    }

    async fn create_logical_volume(&self, system_id: &str, volume_group_id: u64, name: &str, size: u64) -> Result<BlockDevice, MaasError> {
        self.http
            .post(
                &with_op(
                    &node_object_path(system_id, "volume-group", volume_group_id),
                    "create_logical_volume",
                ),
                &[("name", name.to_string()), ("size", size.to_string())],
            )
            .await
    }

    async fn delete_logical_volume(&self, system_id: &str, volume_group_id: u64, logical_volume_id: u64) -> Result<(), MaasError> {
        self.http
            .post_unit(
                &with_op(
                    &node_object_path(system_id, "volume-group", volume_group_id),
                    "delete_logical_volume",
                ),
                &[("id", logical_volume_id.to_string())],
            )
            .await
    }

    async fn restore_networking_configuration(&self, system_id: &str) -> Result<Machine, MaasError> {
        self.http
            .post(
                &with_op(&machine_path(system_id), "restore_networking_configuration"),
                &[],
            )
            .await
    }

    async fn list_interfaces(&self, system_id: &str) -> Result<Vec<Interface>, MaasError> {
        self.http.get(&node_path(system_id, "interfaces")).await
    }

    async fn get_interface(&self, system_id: &str, interface_id: u64) -> Result<Interface, MaasError> {
        self.http
            .get(&node_object_path(system_id, "interfaces", interface_id))
            .await
    }

    async fn create_bond(&self, system_id: &str, name: &str, parents: &[u64], bond_mode: &str) -> Result<Interface, MaasError> {
        let mut form = vec![
            ("name", name.to_string()),
            ("bond_mode", bond_mode.to_string()),
        ];
        form.extend(parents.iter().map(|id| ("parents", id.to_string())));
        self.http
            .post(&with_op(&node_path(system_id, "interfaces"), "create_bond"), &form)
            .await
    }

    async fn create_vlan_interface(&self, system_id: &str, parent: u64, vlan_id: u64) -> Result<Interface, MaasError> {
        self.http
            .post(
                &with_op(&node_path(system_id, "interfaces"), "create_vlan"),
                &[("parent", parent.to_string()), ("vlan", vlan_id.to_string())],
            )
            .await
    }

    async fn rename_interface(&self, system_id: &str, interface_id: u64, name: &str) -> Result<Interface, MaasError> {
        self.http
            .put(
                &node_object_path(system_id, "interfaces", interface_id),
                &[("name", name.to_string())],
            )
            .await
    }

    async fn update_interface_vlan(&self, system_id: &str, interface_id: u64, vlan_id: u64) -> Result<Interface, MaasError> {
        self.http
            .put(
                &node_object_path(system_id, "interfaces", interface_id),
                &[("vlan", vlan_id.to_string())],
            )
            .await
    }

    async fn link_subnet(&self, system_id: &str, interface_id: u64, request: &LinkSubnetRequest) -> Result<Interface, MaasError> {
        let mut form = vec![
            ("mode", request.mode.as_str().to_string()),
            ("subnet", request.subnet_id.to_string()),
        ];
        if let Some(ip) = &request.ip_address {
            form.push(("ip_address", ip.clone()));
        }
        self.http
            .post(
                &with_op(&node_object_path(system_id, "interfaces", interface_id), "link_subnet"),
                &form,
            )
            .await
    }

    async fn set_default_gateway(&self, system_id: &str, interface_id: u64, link_id: u64) -> Result<Interface, MaasError> {
        self.http
            .post(
                &with_op(
                    &node_object_path(system_id, "interfaces", interface_id),
                    "set_default_gateway",
                ),
                &[("link_id", link_id.to_string())],
            )
            .await
    }

    async fn list_fabrics(&self) -> Result<Vec<Fabric>, MaasError> {
        self.http.get(&format!("{}/fabrics/", API_PREFIX)).await
    }

    /// Get a subnet by id or by specifier (e.g. `cidr:10.0.0.0/24`)
    async fn get_subnet(&self, identifier: &str) -> Result<Subnet, MaasError> {
        self.http
            .get(&format!(
                "{}/subnets/{}/",
                API_PREFIX,
                urlencoding::encode(identifier)
            ))
            .await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, MaasError> {
        self.http.get(&format!("{}/tags/", API_PREFIX)).await
    }

    async fn get_tag(&self, name: &str) -> Result<Tag, MaasError> {
        self.http
            .get(&format!("{}/tags/{}/", API_PREFIX, urlencoding::encode(name)))
            .await
    }

    async fn create_tag(&self, name: &str, comment: Option<&str>) -> Result<Tag, MaasError> {
        let mut form = vec![("name", name.to_string())];
        if let Some(comment) = comment {
            form.push(("comment", comment.to_string()));
        }
        self.http.post(&format!("{}/tags/", API_PREFIX), &form).await
    }

    async fn add_tag_to_machine(&self, tag: &str, system_id: &str) -> Result<(), MaasError> {
        let path = with_op(
            &format!("{}/tags/{}/", API_PREFIX, urlencoding::encode(tag)),
            "update_nodes",
        );
        self.http
            .post_unit(&path, &[("add", system_id.to_string())])
            .await
    }
}
