//! The configuration document
//!
//! ```yaml
//! maas_url: http://maas:5240/MAAS
//! maas_apikey: consumer:token:secret
//! tag_filter: [rack-a]
//! machines_config:
//!   node1:
//!     ipmi_ip: 10.0.0.11
//!     disks:
//!       sda:
//!         boot: true
//!         partitions:
//!           - size: 100%
//!             fstype: ext4
//!             mount: /
//!     network:
//!       eth0:
//!         address: dhcp
//!         subnet: 10.0.0.0/24
//!         default_gw_if: true
//!     tags: [compute]
//! ```

use crate::error::HostConfigError;
use crate::host::{HostConfig, HostEntry};
use crate::lifecycle::LifecycleSettings;
use crate::ordered::OrderedMap;
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// The document as written on disk
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DocumentFile {
    /// MAAS region API URL, e.g. `http://maas:5240/MAAS`
    #[serde(default)]
    pub maas_url: Option<String>,

    /// MAAS API key (`consumer_key:token_key:token_secret`)
    #[serde(default)]
    pub maas_apikey: Option<String>,

    /// A NEW machine is provisioned when it carries at least one of these tags
    #[serde(default)]
    pub tag_filter: Vec<String>,

    /// Host name to host configuration
    #[serde(default)]
    pub machines_config: OrderedMap<HostEntry>,

    #[serde(default)]
    pub lifecycle: LifecycleSettings,
}

/// A loaded and converted configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub maas_url: Option<String>,
    pub maas_apikey: Option<String>,
    pub tag_filter: Vec<String>,
    /// Hosts in document order
    pub hosts: Vec<HostConfig>,
    pub lifecycle: LifecycleSettings,
}

impl Document {
    /// Read and convert the document at `path`
    pub fn load(path: &Path) -> Result<Self, HostConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| HostConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_yaml(&contents)
    }

    /// Parse and convert a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, HostConfigError> {
        let file: DocumentFile = serde_yaml::from_str(contents)?;
        Self::from_file(file)
    }

    pub fn from_file(file: DocumentFile) -> Result<Self, HostConfigError> {
        let hosts = file
            .machines_config
            .into_iter()
            .map(|(name, entry)| HostConfig::from_entry(&name, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Document {
            maas_url: file.maas_url,
            maas_apikey: file.maas_apikey,
            tag_filter: file.tag_filter,
            hosts,
            lifecycle: file.lifecycle,
        })
    }

    /// Pre-flight every host: fatal authoring errors surface before any
    /// machine is touched
    pub fn validate(&self) -> Result<(), HostConfigError> {
        for host in &self.hosts {
            host.validate()?;
        }
        Ok(())
    }

    pub fn host(&self, name: &str) -> Option<&HostConfig> {
        self.hosts.iter().find(|h| h.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::DiskSpec;
    use crate::interface::{AddressMode, InterfaceKind};
    use crate::lifecycle::DeployFailurePolicy;
    use std::io::Write;

    const DOCUMENT: &str = r#"
maas_url: http://maas:5240/MAAS
maas_apikey: ck:tk:ts
tag_filter:
  - rack-a
  - rack-b
machines_config:
  storage2:
    ipmi_ip: 10.0.0.12
    disks:
      sda:
        boot:
        partitions:
          - size: 10%
            fstype: ext4
            mount: /
      vg0:
        type: vg
        parents:
          sdb: {}
          sdc:
            partitions:
              - size: 50%
      data:
        type: lv
        parents: [vg0]
        size: 90%
        fstype: xfs
        mount: /srv
    network:
      bond0:
        type: bond
        parents: [eth0, eth1]
        mode: 802.3ad
      bond0.100:
        type: vlan
        parents: [bond0]
        vid: 100
        address: 10.100.0.12
        subnet: 10.100.0.0/24
        default_gw_if: yes
    tags: [storage]
  storage1:
    ipmi_ip: 10.0.0.11
lifecycle:
  poll_interval_secs: 10
  deploy_failure: wait
"#;

    #[test]
    fn test_document_order_and_variants() {
        let document = Document::from_yaml(DOCUMENT).unwrap();
        document.validate().unwrap();

        let names: Vec<&str> = document.hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["storage2", "storage1"]);
        assert_eq!(document.tag_filter, vec!["rack-a", "rack-b"]);
        assert_eq!(document.lifecycle.poll_interval_secs, 10);
        assert_eq!(document.lifecycle.deploy_failure, DeployFailurePolicy::Wait);

        let host = document.host("storage2").unwrap();
        let disk_names: Vec<&str> = host.disks.iter().map(DiskSpec::name).collect();
        assert_eq!(disk_names, vec!["sda", "vg0", "data"]);
        assert!(matches!(host.disks[0], DiskSpec::Plain { boot: true, .. }));

        let vlan = &host.network[1];
        assert_eq!(
            vlan.kind,
            InterfaceKind::Vlan {
                parent: "bond0".to_string(),
                vid: 100,
            }
        );
        let link = vlan.link.as_ref().unwrap();
        assert_eq!(link.address, AddressMode::Static("10.100.0.12".to_string()));
        assert!(link.default_gateway);
        assert_eq!(host.tags, vec!["storage"]);
    }

    #[test]
    fn test_missing_ipmi_address_fails_validation() {
        let document = Document::from_yaml("machines_config:\n  node1:\n    tags: [a]\n").unwrap();
        assert!(matches!(
            document.validate(),
            Err(HostConfigError::MissingIpmiAddress { .. })
        ));
    }

    #[test]
    fn test_unknown_interface_type_fails_load() {
        let result = Document::from_yaml(
            "machines_config:\n  node1:\n    ipmi_ip: 10.0.0.1\n    network:\n      br0:\n        type: bridge\n",
        );
        assert!(matches!(result, Err(HostConfigError::InvalidEntry { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let document = Document::load(file.path()).unwrap();
        assert_eq!(document.maas_url.as_deref(), Some("http://maas:5240/MAAS"));
        assert_eq!(document.hosts.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Document::load(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(HostConfigError::Io { .. })));
    }
}
