//! Deployer-specific error types.
//!
//! This module defines the errors a provisioning run can end with that are
//! not covered by the client or configuration crates.

use host_config::HostConfigError;
use maas_client::MaasError;
use thiserror::Error;

/// Errors that can occur while provisioning machines.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Configuration document error
    #[error("Configuration error: {0}")]
    Config(#[from] HostConfigError),

    /// MAAS API error
    #[error("MAAS error: {0}")]
    Maas(#[from] MaasError),

    /// Invalid runtime configuration (missing URL or API key)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nothing to provision
    #[error("No NEW machines found carrying any of the tags {0:?}")]
    NoCandidates(Vec<String>),

    /// A commissioned machine reports an IPMI address no host entry declares
    #[error("No configuration found for {hostname} (IPMI address {address})")]
    NoHostConfig { hostname: String, address: String },

    #[error("No block devices on {0}")]
    NoBlockDevices(String),

    #[error("No network interfaces on {0}")]
    NoInterfaces(String),

    #[error("Disk {disk} not found on {hostname}")]
    DiskNotFound { hostname: String, disk: String },

    #[error("Volume group {volume_group} not found on {hostname}")]
    VolumeGroupNotFound { hostname: String, volume_group: String },

    #[error("Interface {interface} not found on {hostname}")]
    InterfaceNotFound { hostname: String, interface: String },

    /// Filesystem or mount point declared before any partition was created
    #[error("Disk {disk} on {hostname} has no partition to format or mount")]
    NoPartition { hostname: String, disk: String },

    #[error("VLAN {0} not found in any fabric")]
    VlanNotFound(u16),

    #[error("Subnet {0} not found")]
    SubnetNotFound(String),
}

impl ProvisionError {
    /// Whether the error aborts the whole run
    ///
    /// Authoring errors cannot be fixed by retrying and abort the run; backend
    /// errors only fail the machine being reconciled.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProvisionError::Maas(_))
    }
}
