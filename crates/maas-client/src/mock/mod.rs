//! Mock MaasClient for unit testing
//!
//! This module provides a mock implementation of MaasClientTrait that can be used
//! in unit tests without requiring a running MAAS region controller.
//!
//! The mock is organized into domain-specific modules:
//! - `machines.rs` - lifecycle, power and hostname operations
//! - `storage.rs` - block devices, partitions, volume groups, logical volumes
//! - `network.rs` - interfaces, links, fabrics and subnets
//! - `tags.rs` - tag operations

mod machines;
mod network;
mod storage;
mod tags;

use crate::error::MaasError;
use crate::models::*;
use crate::maas_trait::MaasClientTrait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Everything the mock knows about one machine
#[derive(Debug, Clone)]
pub(crate) struct MachineRecord {
    pub(crate) machine: Machine,
    /// Statuses returned by successive refreshes; the last one sticks
    pub(crate) status_script: VecDeque<NodeStatus>,
    /// Scripts installed when a lifecycle request ("commission", "deploy") is accepted
    pub(crate) request_scripts: HashMap<String, VecDeque<NodeStatus>>,
    /// Power states returned by successive power queries; the last one sticks
    pub(crate) power_script: VecDeque<PowerState>,
    pub(crate) power_parameters: PowerParameters,
    /// Physical disks as enlisted, without any layout
    pub(crate) pristine_disks: Vec<BlockDevice>,
    /// Physical disks and logical volumes
    pub(crate) block_devices: Vec<BlockDevice>,
    pub(crate) volume_groups: Vec<VolumeGroup>,
    pub(crate) boot_disk: Option<u64>,
    /// Physical interfaces as discovered during commissioning
    pub(crate) pristine_interfaces: Vec<Interface>,
    pub(crate) interfaces: Vec<Interface>,
    /// (interface id, link id) of the default gateway link
    pub(crate) default_gateway: Option<(u64, u64)>,
}

impl MachineRecord {
    fn new(machine: Machine) -> Self {
        Self {
            machine,
            status_script: VecDeque::new(),
            request_scripts: HashMap::new(),
            power_script: VecDeque::new(),
            power_parameters: PowerParameters::default(),
            pristine_disks: Vec::new(),
            block_devices: Vec::new(),
            volume_groups: Vec::new(),
            boot_disk: None,
            pristine_interfaces: Vec::new(),
            interfaces: Vec::new(),
            default_gateway: None,
        }
    }
}

/// Mock MaasClient for testing
///
/// This mock stores machines and fleet-wide objects in memory and can be
/// scripted to return specific status sequences for lifecycle tests.
/// Every trait call is journaled as `<operation>:<target>` so tests can
/// assert on which remote operations were issued.
#[derive(Clone, Debug)]
pub struct MockMaasClient {
    pub(crate) base_url: String,
    // In-memory storage for resources
    pub(crate) machines: Arc<Mutex<BTreeMap<String, MachineRecord>>>,
    pub(crate) fabrics: Arc<Mutex<Vec<Fabric>>>,
    pub(crate) subnets: Arc<Mutex<Vec<Subnet>>>,
    pub(crate) tags: Arc<Mutex<BTreeMap<String, Tag>>>,
    /// (system_id, operation) pairs that fail with an API error
    pub(crate) failures: Arc<Mutex<HashSet<(String, String)>>>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    // Counter for generating IDs
    pub(crate) next_id: Arc<Mutex<u64>>,
}

impl MockMaasClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            machines: Arc::new(Mutex::new(BTreeMap::new())),
            fabrics: Arc::new(Mutex::new(Vec::new())),
            subnets: Arc::new(Mutex::new(Vec::new())),
            tags: Arc::new(Mutex::new(BTreeMap::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Add a machine to the mock store (for test setup)
    pub fn add_machine(&self, machine: Machine) {
        self.machines
            .lock()
            .unwrap()
            .insert(machine.system_id.clone(), MachineRecord::new(machine));
    }

    /// Set the power parameters reported for a machine (for test setup)
    pub fn set_power_parameters(&self, system_id: &str, params: &[(&str, &str)]) {
        let params = PowerParameters(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect::<HashMap<_, _>>(),
        );
        self.record_mut(system_id, |record| record.power_parameters = params);
    }

    /// Add a physical disk to a machine (for test setup)
    pub fn add_physical_disk(&self, system_id: &str, name: &str, size: u64) -> u64 {
        let id = self.next_id();
        let disk = BlockDevice {
            id,
            name: name.to_string(),
            device_type: BlockDeviceType::Physical,
            size,
            partitions: Vec::new(),
            filesystem: None,
        };
        self.record_mut(system_id, |record| {
            record.pristine_disks.push(disk.clone());
            record.block_devices.push(disk);
        });
        id
    }

    /// Add a physical interface to a machine (for test setup)
    pub fn add_physical_interface(&self, system_id: &str, name: &str) -> u64 {
        let id = self.next_id();
        let interface = Interface {
            id,
            name: name.to_string(),
            interface_type: InterfaceType::Physical,
            parents: Vec::new(),
            vlan: None,
            links: Vec::new(),
            mac_address: Some(format!("52:54:00:00:{:02x}:{:02x}", (id >> 8) & 0xff, id & 0xff)),
        };
        self.record_mut(system_id, |record| {
            record.pristine_interfaces.push(interface.clone());
            record.interfaces.push(interface);
        });
        id
    }

    /// Add a fabric with the given VLAN ids (for test setup)
    pub fn add_fabric(&self, name: &str, vids: &[u16]) -> Vec<Vlan> {
        let fabric_id = self.next_id();
        let vlans: Vec<Vlan> = vids
            .iter()
            .map(|vid| Vlan {
                id: self.next_id(),
                vid: *vid,
                name: format!("vlan-{}", vid),
                fabric_id,
            })
            .collect();
        self.fabrics.lock().unwrap().push(Fabric {
            id: fabric_id,
            name: name.to_string(),
            vlans: vlans.clone(),
        });
        vlans
    }

    /// Add a subnet (for test setup)
    pub fn add_subnet(&self, cidr: &str, vlan: Option<Vlan>) -> Subnet {
        let subnet = Subnet {
            id: self.next_id(),
            name: cidr.to_string(),
            cidr: cidr.to_string(),
            vlan,
        };
        self.subnets.lock().unwrap().push(subnet.clone());
        subnet
    }

    /// Add a tag to the mock store (for test setup)
    pub fn add_tag(&self, name: &str) {
        self.tags.lock().unwrap().insert(
            name.to_string(),
            Tag {
                name: name.to_string(),
                definition: String::new(),
                comment: String::new(),
            },
        );
    }

    /// Statuses returned by successive refreshes of a machine
    pub fn script_statuses(&self, system_id: &str, statuses: &[NodeStatus]) {
        self.record_mut(system_id, |record| {
            record.status_script = statuses.iter().copied().collect();
        });
    }

    /// Statuses returned by refreshes once `operation` ("commission" or "deploy")
    /// has been requested
    pub fn script_statuses_after(&self, system_id: &str, operation: &str, statuses: &[NodeStatus]) {
        self.record_mut(system_id, |record| {
            record
                .request_scripts
                .insert(operation.to_string(), statuses.iter().copied().collect());
        });
    }

    /// Power states returned by successive power queries of a machine
    pub fn script_power_states(&self, system_id: &str, states: &[PowerState]) {
        self.record_mut(system_id, |record| {
            record.power_script = states.iter().copied().collect();
        });
    }

    /// Make an operation fail for one machine (e.g. `"create_partition"`)
    pub fn fail_operation(&self, system_id: &str, operation: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((system_id.to_string(), operation.to_string()));
    }

    /// Journal of issued operations, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of journaled calls of one operation against one target
    pub fn call_count(&self, operation: &str, target: &str) -> usize {
        let entry = format!("{}:{}", operation, target);
        self.calls.lock().unwrap().iter().filter(|c| **c == entry).count()
    }

    /// Current machine state without advancing any script
    pub fn machine(&self, system_id: &str) -> Option<Machine> {
        self.machines
            .lock()
            .unwrap()
            .get(system_id)
            .map(|r| r.machine.clone())
    }

    /// Current block devices of a machine
    pub fn block_devices(&self, system_id: &str) -> Vec<BlockDevice> {
        self.read_record(system_id, |r| r.block_devices.clone())
    }

    /// Current volume groups of a machine
    pub fn volume_groups(&self, system_id: &str) -> Vec<VolumeGroup> {
        self.read_record(system_id, |r| r.volume_groups.clone())
    }

    /// Current interfaces of a machine
    pub fn interfaces(&self, system_id: &str) -> Vec<Interface> {
        self.read_record(system_id, |r| r.interfaces.clone())
    }

    /// Boot disk id of a machine
    pub fn boot_disk(&self, system_id: &str) -> Option<u64> {
        self.read_record(system_id, |r| r.boot_disk)
    }

    /// (interface id, link id) marked as default gateway
    pub fn default_gateway(&self, system_id: &str) -> Option<(u64, u64)> {
        self.read_record(system_id, |r| r.default_gateway)
    }

    /// Generate next ID
    pub(crate) fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    pub(crate) fn journal(&self, operation: &str, target: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, target));
    }

    fn record_mut(&self, system_id: &str, f: impl FnOnce(&mut MachineRecord)) {
        if let Some(record) = self.machines.lock().unwrap().get_mut(system_id) {
            f(record);
        }
    }

    fn read_record<R: Default>(&self, system_id: &str, f: impl FnOnce(&MachineRecord) -> R) -> R {
        self.machines
            .lock()
            .unwrap()
            .get(system_id)
            .map(f)
            .unwrap_or_default()
    }

    /// Journal the call, honour injected failures, then run `f` on the machine
    pub(crate) fn with_machine<R>(
        &self,
        operation: &str,
        system_id: &str,
        f: impl FnOnce(&mut MachineRecord, &MockMaasClient) -> Result<R, MaasError>,
    ) -> Result<R, MaasError> {
        self.journal(operation, system_id);
        if self
            .failures
            .lock()
            .unwrap()
            .contains(&(system_id.to_string(), operation.to_string()))
        {
            return Err(MaasError::Api(format!(
                "{} failed for {} (injected)",
                operation, system_id
            )));
        }

        let mut machines = self.machines.lock().unwrap();
        let record = machines
            .get_mut(system_id)
            .ok_or_else(|| MaasError::NotFound(format!("Machine {} not found", system_id)))?;
        f(record, self)
    }
}

#[async_trait::async_trait]
impl MaasClientTrait for MockMaasClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_credentials(&self) -> Result<(), MaasError> {
        Ok(())
    }

    // Machine Operations - delegated to machines module
    async fn list_machines(&self) -> Result<Vec<Machine>, MaasError> {
        machines::list_machines(self)
    }

    async fn get_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        machines::get_machine(self, system_id)
    }

    async fn commission_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        machines::commission_machine(self, system_id)
    }

    async fn deploy_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        machines::deploy_machine(self, system_id)
    }

    async fn query_power_state(&self, system_id: &str) -> Result<PowerState, MaasError> {
        machines::query_power_state(self, system_id)
    }

    async fn power_on_machine(&self, system_id: &str) -> Result<Machine, MaasError> {
        machines::power_on_machine(self, system_id)
    }

    async fn get_power_parameters(&self, system_id: &str) -> Result<PowerParameters, MaasError> {
        machines::get_power_parameters(self, system_id)
    }

    async fn set_hostname(&self, system_id: &str, hostname: &str) -> Result<Machine, MaasError> {
        machines::set_hostname(self, system_id, hostname)
    }

    // Storage Operations - delegated to storage module
    async fn restore_storage_configuration(&self, system_id: &str) -> Result<Machine, MaasError> {
        storage::restore_storage_configuration(self, system_id)
    }

    async fn list_block_devices(&self, system_id: &str) -> Result<Vec<BlockDevice>, MaasError> {
        storage::list_block_devices(self, system_id)
    }

    async fn set_boot_disk(&self, system_id: &str, device_id: u64) -> Result<(), MaasError> {
        storage::set_boot_disk(self, system_id, device_id)
    }

    async fn format_block_device(&self, system_id: &str, device_id: u64, fstype: &str) -> Result<BlockDevice, MaasError> {
        storage::format_block_device(self, system_id, device_id, fstype)
    }

    async fn mount_block_device(&self, system_id: &str, device_id: u64, mount_point: &str) -> Result<BlockDevice, MaasError> {
        storage::mount_block_device(self, system_id, device_id, mount_point)
    }

    async fn create_partition(&self, system_id: &str, device_id: u64, size: u64) -> Result<Partition, MaasError> {
        storage::create_partition(self, system_id, device_id, size)
    }

    async fn delete_partition(&self, system_id: &str, device_id: u64, partition_id: u64) -> Result<(), MaasError> {
        storage::delete_partition(self, system_id, device_id, partition_id)
    }

    async fn format_partition(&self, system_id: &str, device_id: u64, partition_id: u64, fstype: &str) -> Result<Partition, MaasError> {
        storage::format_partition(self, system_id, device_id, partition_id, fstype)
    }

    async fn mount_partition(&self, system_id: &str, device_id: u64, partition_id: u64, mount_point: &str) -> Result<Partition, MaasError> {
        storage::mount_partition(self, system_id, device_id, partition_id, mount_point)
    }

    async fn list_volume_groups(&self, system_id: &str) -> Result<Vec<VolumeGroup>, MaasError> {
        storage::list_volume_groups(self, system_id)
    }

    async fn get_volume_group(&self, system_id: &str, volume_group_id: u64) -> Result<VolumeGroup, MaasError> {
        storage::get_volume_group(self, system_id, volume_group_id)
    }

    async fn create_volume_group(&self, system_id: &str, name: &str, block_devices: &[u64], partitions: &[u64]) -> Result<VolumeGroup, MaasError> {
        storage::create_volume_group(self, system_id, name, block_devices, partitions)
    }

    async fn delete_volume_group(&self, system_id: &str, volume_group_id: u64) -> Result<(), MaasError> {
        storage::delete_volume_group(self, system_id, volume_group_id)
    }

    async fn create_logical_volume(&self, system_id: &str, volume_group_id: u64, name: &str, size: u64) -> Result<BlockDevice, MaasError> {
        storage::create_logical_volume(self, system_id, volume_group_id, name, size)
    }

    async fn delete_logical_volume(&self, system_id: &str, volume_group_id: u64, logical_volume_id: u64) -> Result<(), MaasError> {
        storage::delete_logical_volume(self, system_id, volume_group_id, logical_volume_id)
    }

    // Network Operations - delegated to network module
    async fn restore_networking_configuration(&self, system_id: &str) -> Result<Machine, MaasError> {
        network::restore_networking_configuration(self, system_id)
    }

    async fn list_interfaces(&self, system_id: &str) -> Result<Vec<Interface>, MaasError> {
        network::list_interfaces(self, system_id)
    }

    async fn get_interface(&self, system_id: &str, interface_id: u64) -> Result<Interface, MaasError> {
        network::get_interface(self, system_id, interface_id)
    }

    async fn create_bond(&self, system_id: &str, name: &str, parents: &[u64], bond_mode: &str) -> Result<Interface, MaasError> {
        network::create_bond(self, system_id, name, parents, bond_mode)
    }

    async fn create_vlan_interface(&self, system_id: &str, parent: u64, vlan_id: u64) -> Result<Interface, MaasError> {
        network::create_vlan_interface(self, system_id, parent, vlan_id)
    }

    async fn rename_interface(&self, system_id: &str, interface_id: u64, name: &str) -> Result<Interface, MaasError> {
        network::rename_interface(self, system_id, interface_id, name)
    }

    async fn update_interface_vlan(&self, system_id: &str, interface_id: u64, vlan_id: u64) -> Result<Interface, MaasError> {
        network::update_interface_vlan(self, system_id, interface_id, vlan_id)
    }

    async fn link_subnet(&self, system_id: &str, interface_id: u64, request: &LinkSubnetRequest) -> Result<Interface, MaasError> {
        network::link_subnet(self, system_id, interface_id, request)
    }

    async fn set_default_gateway(&self, system_id: &str, interface_id: u64, link_id: u64) -> Result<Interface, MaasError> {
        network::set_default_gateway(self, system_id, interface_id, link_id)
    }

    async fn list_fabrics(&self) -> Result<Vec<Fabric>, MaasError> {
        network::list_fabrics(self)
    }

    async fn get_subnet(&self, identifier: &str) -> Result<Subnet, MaasError> {
        network::get_subnet(self, identifier)
    }

    // Tag Operations - delegated to tags module
    async fn list_tags(&self) -> Result<Vec<Tag>, MaasError> {
        tags::list_tags(self)
    }

    async fn get_tag(&self, name: &str) -> Result<Tag, MaasError> {
        tags::get_tag(self, name)
    }

    async fn create_tag(&self, name: &str, comment: Option<&str>) -> Result<Tag, MaasError> {
        tags::create_tag(self, name, comment)
    }

    async fn add_tag_to_machine(&self, tag: &str, system_id: &str) -> Result<(), MaasError> {
        tags::add_tag_to_machine(self, tag, system_id)
    }
}
