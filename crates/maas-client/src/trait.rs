//! MaasClient trait for mocking
//!
//! This trait abstracts the fleet backend so the deployer can be driven by
//! the concrete MaasClient in production and by the mock in unit tests.

use crate::error::MaasError;
use crate::models::*;

/// Trait for MAAS API client operations
///
/// Machines are addressed by `system_id`; block devices, partitions, volume
/// groups and interfaces by their numeric ids within that machine.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait MaasClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Validate the API key
    async fn validate_credentials(&self) -> Result<(), MaasError>;

    // Machine Operations
    async fn list_machines(&self) -> Result<Vec<Machine>, MaasError>;
    async fn get_machine(&self, system_id: &str) -> Result<Machine, MaasError>;
    async fn commission_machine(&self, system_id: &str) -> Result<Machine, MaasError>;
    async fn deploy_machine(&self, system_id: &str) -> Result<Machine, MaasError>;
    async fn query_power_state(&self, system_id: &str) -> Result<PowerState, MaasError>;
    async fn power_on_machine(&self, system_id: &str) -> Result<Machine, MaasError>;
    async fn get_power_parameters(&self, system_id: &str) -> Result<PowerParameters, MaasError>;
    async fn set_hostname(&self, system_id: &str, hostname: &str) -> Result<Machine, MaasError>;

    // Storage Operations
    async fn restore_storage_configuration(&self, system_id: &str) -> Result<Machine, MaasError>;
    async fn list_block_devices(&self, system_id: &str) -> Result<Vec<BlockDevice>, MaasError>;
    async fn set_boot_disk(&self, system_id: &str, device_id: u64) -> Result<(), MaasError>;
    async fn format_block_device(&self, system_id: &str, device_id: u64, fstype: &str) -> Result<BlockDevice, MaasError>;
    async fn mount_block_device(&self, system_id: &str, device_id: u64, mount_point: &str) -> Result<BlockDevice, MaasError>;
    async fn create_partition(&self, system_id: &str, device_id: u64, size: u64) -> Result<Partition, MaasError>;
    async fn delete_partition(&self, system_id: &str, device_id: u64, partition_id: u64) -> Result<(), MaasError>;
    async fn format_partition(&self, system_id: &str, device_id: u64, partition_id: u64, fstype: &str) -> Result<Partition, MaasError>;
    async fn mount_partition(&self, system_id: &str, device_id: u64, partition_id: u64, mount_point: &str) -> Result<Partition, MaasError>;
    async fn list_volume_groups(&self, system_id: &str) -> Result<Vec<VolumeGroup>, MaasError>;
    async fn get_volume_group(&self, system_id: &str, volume_group_id: u64) -> Result<VolumeGroup, MaasError>;
    async fn create_volume_group(&self, system_id: &str, name: &str, block_devices: &[u64], partitions: &[u64]) -> Result<VolumeGroup, MaasError>;
    async fn delete_volume_group(&self, system_id: &str, volume_group_id: u64) -> Result<(), MaasError>;
    async fn create_logical_volume(&self, system_id: &str, volume_group_id: u64, name: &str, size: u64) -> Result<BlockDevice, MaasError>;
    async fn delete_logical_volume(&self, system_id: &str, volume_group_id: u64, logical_volume_id: u64) -> Result<(), MaasError>;

    // Network Operations
    async fn restore_networking_configuration(&self, system_id: &str) -> Result<Machine, MaasError>;
    async fn list_interfaces(&self, system_id: &str) -> Result<Vec<Interface>, MaasError>;
    async fn get_interface(&self, system_id: &str, interface_id: u64) -> Result<Interface, MaasError>;
    async fn create_bond(&self, system_id: &str, name: &str, parents: &[u64], bond_mode: &str) -> Result<Interface, MaasError>;
    /// The backend names the new interface `<parent>.<vid>`
    async fn create_vlan_interface(&self, system_id: &str, parent: u64, vlan_id: u64) -> Result<Interface, MaasError>;
    async fn rename_interface(&self, system_id: &str, interface_id: u64, name: &str) -> Result<Interface, MaasError>;
    async fn update_interface_vlan(&self, system_id: &str, interface_id: u64, vlan_id: u64) -> Result<Interface, MaasError>;
    async fn link_subnet(&self, system_id: &str, interface_id: u64, request: &LinkSubnetRequest) -> Result<Interface, MaasError>;
    async fn set_default_gateway(&self, system_id: &str, interface_id: u64, link_id: u64) -> Result<Interface, MaasError>;
    async fn list_fabrics(&self) -> Result<Vec<Fabric>, MaasError>;
    async fn get_subnet(&self, identifier: &str) -> Result<Subnet, MaasError>;

    // Tag Operations
    async fn list_tags(&self) -> Result<Vec<Tag>, MaasError>;
    async fn get_tag(&self, name: &str) -> Result<Tag, MaasError>;
    async fn create_tag(&self, name: &str, comment: Option<&str>) -> Result<Tag, MaasError>;
    async fn add_tag_to_machine(&self, tag: &str, system_id: &str) -> Result<(), MaasError>;
}
