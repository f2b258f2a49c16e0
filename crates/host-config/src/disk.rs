//! Disk entries: plain disks, volume groups and logical volumes

use crate::error::HostConfigError;
use crate::flags;
use crate::ordered::OrderedMap;
use crate::size::Percentage;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

/// One `partitions` item as written in the document
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PartitionEntry {
    /// Size as a percentage of the usable capacity, e.g. `"50%"`
    #[serde(default)]
    pub size: Option<String>,

    /// Filesystem to format the partition with
    #[serde(default)]
    pub fstype: Option<String>,

    /// Mount point
    #[serde(default)]
    pub mount: Option<String>,
}

/// Parent disk of a volume group as written in the document
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ParentDiskEntry {
    /// Mark this disk as the boot disk
    #[serde(default, deserialize_with = "flags::presence")]
    pub boot: bool,

    /// Partitions to create and add to the group instead of the whole disk
    #[serde(default)]
    pub partitions: Vec<PartitionEntry>,
}

/// `parents` is a mapping for volume groups and a list for logical volumes
///
/// A bare `sda:` parent carries no settings and joins the group whole.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DiskParents {
    Disks(OrderedMap<Option<ParentDiskEntry>>),
    Names(Vec<String>),
}

/// A `disks` entry as written in the document
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DiskEntry {
    /// `vg`, `lv`, or absent for a plain physical disk
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Mark the disk as the boot disk (plain disks)
    #[serde(default, deserialize_with = "flags::presence")]
    pub boot: bool,

    /// Partitions of a plain disk, applied in order
    #[serde(default)]
    pub partitions: Vec<PartitionEntry>,

    /// Parent disks (`vg`) or parent volume group (`lv`)
    #[serde(default)]
    pub parents: Option<DiskParents>,

    /// Logical volume size
    #[serde(default)]
    pub size: Option<String>,

    /// Logical volume filesystem
    #[serde(default)]
    pub fstype: Option<String>,

    /// Logical volume mount point
    #[serde(default)]
    pub mount: Option<String>,
}

/// Partition of a plain disk; every step is optional and applied in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    pub size: Option<String>,
    pub fstype: Option<String>,
    pub mount: Option<String>,
}

/// Physical disk contributing to a volume group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDisk {
    pub name: String,
    pub boot: bool,
    /// Sizes of the partitions to carve; empty means the whole disk joins the group
    pub partition_sizes: Vec<String>,
}

/// Desired layout of one disk entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskSpec {
    Plain {
        name: String,
        boot: bool,
        partitions: Vec<PartitionSpec>,
    },
    VolumeGroup {
        name: String,
        parents: Vec<ParentDisk>,
    },
    LogicalVolume {
        name: String,
        volume_group: String,
        size: String,
        fstype: String,
        mount: String,
    },
}

impl DiskSpec {
    pub fn name(&self) -> &str {
        match self {
            DiskSpec::Plain { name, .. }
            | DiskSpec::VolumeGroup { name, .. }
            | DiskSpec::LogicalVolume { name, .. } => name,
        }
    }

    /// Every size string declared by this entry
    pub fn sizes(&self) -> Vec<&str> {
        match self {
            DiskSpec::Plain { partitions, .. } => {
                partitions.iter().filter_map(|p| p.size.as_deref()).collect()
            }
            DiskSpec::VolumeGroup { parents, .. } => parents
                .iter()
                .flat_map(|p| p.partition_sizes.iter().map(String::as_str))
                .collect(),
            DiskSpec::LogicalVolume { size, .. } => vec![size.as_str()],
        }
    }

    /// Check every declared size against the percentage pattern
    pub fn validate_sizes(&self) -> Result<(), HostConfigError> {
        for size in self.sizes() {
            Percentage::parse(self.name(), size)?;
        }
        Ok(())
    }

    /// Convert a document entry
    ///
    /// Returns `Ok(None)` for an unknown `type`: the entry is reported and skipped.
    pub fn from_entry(name: &str, entry: DiskEntry) -> Result<Option<Self>, HostConfigError> {
        match entry.kind.as_deref() {
            None => Ok(Some(DiskSpec::Plain {
                name: name.to_string(),
                boot: entry.boot,
                partitions: entry
                    .partitions
                    .into_iter()
                    .map(|p| PartitionSpec {
                        size: p.size,
                        fstype: p.fstype,
                        mount: p.mount,
                    })
                    .collect(),
            })),
            Some("vg") => volume_group(name, entry).map(Some),
            Some("lv") => logical_volume(name, entry).map(Some),
            Some(other) => {
                warn!("Invalid type {:?} specified for disk {}, skipping", other, name);
                Ok(None)
            }
        }
    }
}

fn volume_group(name: &str, entry: DiskEntry) -> Result<DiskSpec, HostConfigError> {
    let parents = match entry.parents {
        Some(DiskParents::Disks(parents)) if !parents.is_empty() => parents,
        _ => {
            return Err(HostConfigError::invalid_entry(
                name,
                "volume group needs a `parents` mapping of disk names",
            ));
        }
    };

    let parents = parents
        .into_iter()
        .map(|(disk, parent)| {
            let parent = parent.unwrap_or_default();
            let partition_sizes = parent
                .partitions
                .into_iter()
                .map(|p| {
                    p.size.ok_or_else(|| {
                        HostConfigError::invalid_entry(
                            name,
                            format!("partition on parent {} has no size", disk),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ParentDisk {
                name: disk,
                boot: parent.boot,
                partition_sizes,
            })
        })
        .collect::<Result<Vec<_>, HostConfigError>>()?;

    Ok(DiskSpec::VolumeGroup {
        name: name.to_string(),
        parents,
    })
}

fn logical_volume(name: &str, entry: DiskEntry) -> Result<DiskSpec, HostConfigError> {
    let volume_group = match entry.parents {
        Some(DiskParents::Names(names)) => names.into_iter().next(),
        _ => None,
    }
    .ok_or_else(|| HostConfigError::invalid_entry(name, "logical volume needs a parent volume group"))?;

    let required = |value: Option<String>, key: &str| {
        value.ok_or_else(|| HostConfigError::invalid_entry(name, format!("logical volume needs `{}`", key)))
    };

    Ok(DiskSpec::LogicalVolume {
        name: name.to_string(),
        volume_group,
        size: required(entry.size, "size")?,
        fstype: required(entry.fstype, "fstype")?,
        mount: required(entry.mount, "mount")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(name: &str, yaml: &str) -> Result<Option<DiskSpec>, HostConfigError> {
        let entry: DiskEntry = serde_yaml::from_str(yaml).unwrap();
        DiskSpec::from_entry(name, entry)
    }

    #[test]
    fn test_plain_disk() {
        let spec = convert(
            "sda",
            "boot: true\npartitions:\n  - size: 20%\n    fstype: ext4\n    mount: /\n  - fstype: xfs\n",
        )
        .unwrap()
        .unwrap();

        match spec {
            DiskSpec::Plain { name, boot, partitions } => {
                assert_eq!(name, "sda");
                assert!(boot);
                assert_eq!(partitions.len(), 2);
                assert_eq!(partitions[0].size.as_deref(), Some("20%"));
                assert_eq!(partitions[1].size, None);
                assert_eq!(partitions[1].fstype.as_deref(), Some("xfs"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_volume_group_keeps_parent_order() {
        let spec = convert(
            "vg0",
            "type: vg\nparents:\n  sdb:\n    partitions:\n      - size: 50%\n  sda:\n    boot:\n",
        )
        .unwrap()
        .unwrap();

        let DiskSpec::VolumeGroup { parents, .. } = spec else {
            panic!("expected a volume group");
        };
        assert_eq!(parents[0].name, "sdb");
        assert_eq!(parents[0].partition_sizes, vec!["50%".to_string()]);
        assert!(!parents[0].boot);
        assert_eq!(parents[1].name, "sda");
        assert!(parents[1].boot);
        assert!(parents[1].partition_sizes.is_empty());
    }

    #[test]
    fn test_volume_group_bare_parent_joins_whole() {
        let spec = convert("vg0", "type: vg\nparents:\n  sda:\n  sdb:\n    boot:\n")
            .unwrap()
            .unwrap();

        assert_eq!(
            spec,
            DiskSpec::VolumeGroup {
                name: "vg0".to_string(),
                parents: vec![
                    ParentDisk {
                        name: "sda".to_string(),
                        boot: false,
                        partition_sizes: Vec::new(),
                    },
                    ParentDisk {
                        name: "sdb".to_string(),
                        boot: true,
                        partition_sizes: Vec::new(),
                    },
                ],
            }
        );
    }

    #[test]
    fn test_volume_group_partition_needs_size() {
        let result = convert("vg0", "type: vg\nparents:\n  sda:\n    partitions:\n      - fstype: ext4\n");
        assert!(matches!(result, Err(HostConfigError::InvalidEntry { .. })));
    }

    #[test]
    fn test_logical_volume_requires_all_fields() {
        let spec = convert("root", "type: lv\nparents: [vg0]\nsize: 40%\nfstype: ext4\nmount: /\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            spec,
            DiskSpec::LogicalVolume {
                name: "root".to_string(),
                volume_group: "vg0".to_string(),
                size: "40%".to_string(),
                fstype: "ext4".to_string(),
                mount: "/".to_string(),
            }
        );

        let missing = convert("root", "type: lv\nparents: [vg0]\nsize: 40%\nfstype: ext4\n");
        assert!(matches!(missing, Err(HostConfigError::InvalidEntry { .. })));
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        assert_eq!(convert("md0", "type: raid\n").unwrap(), None);
    }

    #[test]
    fn test_validate_sizes() {
        let spec = convert("sda", "partitions:\n  - size: 20GB\n").unwrap().unwrap();
        assert!(matches!(
            spec.validate_sizes(),
            Err(HostConfigError::InvalidSize { .. })
        ));
    }
}
