//! Per-host configuration entries

use crate::disk::{DiskEntry, DiskSpec};
use crate::error::HostConfigError;
use crate::interface::{InterfaceEntry, InterfaceSpec};
use crate::ordered::OrderedMap;
use schemars::JsonSchema;
use serde::Deserialize;

/// A `machines_config` entry as written in the document
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct HostEntry {
    /// IPMI (BMC) address, matched against the machine's power address
    #[serde(default)]
    pub ipmi_ip: Option<String>,

    /// Disk layout, applied in document order
    #[serde(default)]
    pub disks: OrderedMap<DiskEntry>,

    /// Interface layout, applied in document order
    #[serde(default)]
    pub network: OrderedMap<InterfaceEntry>,

    /// Tags to attach to the machine
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Desired state of one named host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub name: String,
    pub ipmi_address: Option<String>,
    pub disks: Vec<DiskSpec>,
    pub network: Vec<InterfaceSpec>,
    pub tags: Vec<String>,
}

impl HostConfig {
    /// Convert a document entry into its closed variant form
    pub fn from_entry(name: &str, entry: HostEntry) -> Result<Self, HostConfigError> {
        let mut disks = Vec::with_capacity(entry.disks.len());
        for (disk_name, disk) in entry.disks {
            if let Some(spec) = DiskSpec::from_entry(&disk_name, disk)? {
                disks.push(spec);
            }
        }

        let network = entry
            .network
            .into_iter()
            .map(|(if_name, interface)| InterfaceSpec::from_entry(&if_name, interface))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HostConfig {
            name: name.to_string(),
            ipmi_address: entry.ipmi_ip.map(|ip| ip.trim().to_string()),
            disks,
            network,
            tags: entry.tags,
        })
    }

    /// The IPMI address; hosts without one cannot be matched to any machine
    pub fn ipmi_address(&self) -> Result<&str, HostConfigError> {
        self.ipmi_address
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| HostConfigError::MissingIpmiAddress {
                host: self.name.clone(),
            })
    }

    /// Pre-flight the authoring errors that would abort a run
    pub fn validate(&self) -> Result<(), HostConfigError> {
        self.ipmi_address()?;
        for disk in &self.disks {
            disk.validate_sizes()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ipmi_address() {
        let host = HostConfig::from_entry("node1", HostEntry::default()).unwrap();
        let err = host.validate().unwrap_err();
        assert!(matches!(err, HostConfigError::MissingIpmiAddress { ref host } if host == "node1"));
    }

    #[test]
    fn test_unknown_disk_type_is_dropped() {
        let entry: HostEntry = serde_yaml::from_str(
            "ipmi_ip: 10.1.1.1\ndisks:\n  md0:\n    type: raid\n  sda:\n    partitions: []\n",
        )
        .unwrap();
        let host = HostConfig::from_entry("node1", entry).unwrap();
        assert_eq!(host.disks.len(), 1);
        assert_eq!(host.disks[0].name(), "sda");
        host.validate().unwrap();
    }

    #[test]
    fn test_validate_reports_bad_size() {
        let entry: HostEntry = serde_yaml::from_str(
            "ipmi_ip: 10.1.1.1\ndisks:\n  sda:\n    partitions:\n      - size: half\n",
        )
        .unwrap();
        let host = HostConfig::from_entry("node1", entry).unwrap();
        assert!(matches!(host.validate(), Err(HostConfigError::InvalidSize { .. })));
    }
}
