//! MAAS API models
//!
//! These models match the JSON returned by the MAAS 2.0 API handlers.
//! See: src/maasserver/api/machines.py and friends in the MAAS tree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Machine lifecycle status as reported in the numeric `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum NodeStatus {
    New,
    Commissioning,
    FailedCommissioning,
    Missing,
    Ready,
    Reserved,
    Deployed,
    Retired,
    Broken,
    Deploying,
    Allocated,
    FailedDeployment,
    Releasing,
    FailedReleasing,
    DiskErasing,
    FailedDiskErasing,
    RescueMode,
    EnteringRescueMode,
    FailedEnteringRescueMode,
    ExitingRescueMode,
    FailedExitingRescueMode,
    Testing,
    FailedTesting,
    /// Status code this client does not know about
    Other(u8),
}

impl NodeStatus {
    /// Whether the status is one of the FAILED_* states
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            NodeStatus::FailedCommissioning
                | NodeStatus::FailedDeployment
                | NodeStatus::FailedReleasing
                | NodeStatus::FailedDiskErasing
                | NodeStatus::FailedEnteringRescueMode
                | NodeStatus::FailedExitingRescueMode
                | NodeStatus::FailedTesting
        )
    }
}

impl From<u8> for NodeStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => NodeStatus::New,
            1 => NodeStatus::Commissioning,
            2 => NodeStatus::FailedCommissioning,
            3 => NodeStatus::Missing,
            4 => NodeStatus::Ready,
            5 => NodeStatus::Reserved,
            6 => NodeStatus::Deployed,
            7 => NodeStatus::Retired,
            8 => NodeStatus::Broken,
            9 => NodeStatus::Deploying,
            10 => NodeStatus::Allocated,
            11 => NodeStatus::FailedDeployment,
            12 => NodeStatus::Releasing,
            13 => NodeStatus::FailedReleasing,
            14 => NodeStatus::DiskErasing,
            15 => NodeStatus::FailedDiskErasing,
            16 => NodeStatus::RescueMode,
            17 => NodeStatus::EnteringRescueMode,
            18 => NodeStatus::FailedEnteringRescueMode,
            19 => NodeStatus::ExitingRescueMode,
            20 => NodeStatus::FailedExitingRescueMode,
            21 => NodeStatus::Testing,
            22 => NodeStatus::FailedTesting,
            other => NodeStatus::Other(other),
        }
    }
}

impl From<NodeStatus> for u8 {
    fn from(status: NodeStatus) -> Self {
        match status {
            NodeStatus::New => 0,
            NodeStatus::Commissioning => 1,
            NodeStatus::FailedCommissioning => 2,
            NodeStatus::Missing => 3,
            NodeStatus::Ready => 4,
            NodeStatus::Reserved => 5,
            NodeStatus::Deployed => 6,
            NodeStatus::Retired => 7,
            NodeStatus::Broken => 8,
            NodeStatus::Deploying => 9,
            NodeStatus::Allocated => 10,
            NodeStatus::FailedDeployment => 11,
            NodeStatus::Releasing => 12,
            NodeStatus::FailedReleasing => 13,
            NodeStatus::DiskErasing => 14,
            NodeStatus::FailedDiskErasing => 15,
            NodeStatus::RescueMode => 16,
            NodeStatus::EnteringRescueMode => 17,
            NodeStatus::FailedEnteringRescueMode => 18,
            NodeStatus::ExitingRescueMode => 19,
            NodeStatus::FailedExitingRescueMode => 20,
            NodeStatus::Testing => 21,
            NodeStatus::FailedTesting => 22,
            NodeStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Other(code) => write!(f, "Unknown({code})"),
            known => write!(f, "{known:?}"),
        }
    }
}

/// Power state as reported by the BMC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Machine model (from the machines handler)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub system_id: String,
    pub hostname: String,
    pub status: NodeStatus,
    #[serde(default)]
    pub status_name: String,
    #[serde(default)]
    pub power_state: PowerState,
    #[serde(default)]
    pub power_type: String,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

impl Machine {
    /// Whether the machine already carries the named tag
    pub fn has_tag(&self, name: &str) -> bool {
        self.tag_names.iter().any(|t| t == name)
    }
}

/// Response of `?op=query_power_state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerStateResponse {
    pub state: PowerState,
}

/// Power parameters of a machine (`?op=power_parameters`)
///
/// The keys depend on the power driver; IPMI, Redfish and most BMC drivers
/// expose the management address as `power_address`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerParameters(pub HashMap<String, serde_json::Value>);

impl PowerParameters {
    /// Management (BMC) address, if the driver reports one
    pub fn power_address(&self) -> Option<&str> {
        self.0.get("power_address").and_then(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Block device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockDeviceType {
    Physical,
    #[default]
    #[serde(other)]
    Virtual,
}

/// Filesystem placed on a block device or partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    pub fstype: String,
    #[serde(default)]
    pub mount_point: Option<String>,
}

/// Partition model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    pub id: u64,
    pub size: u64,
    #[serde(default)]
    pub device_id: u64,
    #[serde(default)]
    pub filesystem: Option<Filesystem>,
}

/// Block device model (physical disks and logical volumes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDevice {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: BlockDeviceType,
    pub size: u64,
    #[serde(default)]
    pub partitions: Vec<Partition>,
    #[serde(default)]
    pub filesystem: Option<Filesystem>,
}

/// Logical volume as listed inside a volume group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalVolume {
    pub id: u64,
    pub name: String,
    pub size: u64,
}

/// Volume group model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeGroup {
    pub id: u64,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub available_size: u64,
    #[serde(default)]
    pub logical_volumes: Vec<LogicalVolume>,
}

/// Interface type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    Physical,
    Bond,
    Vlan,
    Bridge,
    Alias,
    #[default]
    #[serde(other)]
    Unknown,
}

/// How an interface link acquires its address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    Auto,
    Dhcp,
    Static,
    LinkUp,
}

impl LinkMode {
    /// Value expected by the `mode` parameter of `?op=link_subnet`
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::Auto => "AUTO",
            LinkMode::Dhcp => "DHCP",
            LinkMode::Static => "STATIC",
            LinkMode::LinkUp => "LINK_UP",
        }
    }
}

/// VLAN model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u64,
    pub vid: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fabric_id: u64,
}

/// Fabric model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fabric {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
}

/// Subnet model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub vlan: Option<Vlan>,
}

/// Link between an interface and a subnet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,
    pub mode: LinkMode,
    #[serde(default)]
    pub subnet: Option<Subnet>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Network interface model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub interface_type: InterfaceType,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub vlan: Option<Vlan>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub mac_address: Option<String>,
}

/// Request body for `?op=link_subnet`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSubnetRequest {
    pub mode: LinkMode,
    pub subnet_id: u64,
    /// Only meaningful for `LinkMode::Static`
    pub ip_address: Option<String>,
}

/// Tag model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub comment: String,
}
