//! Storage operations for MockMaasClient
//!
//! Handles block devices, partitions, volume groups and logical volumes

use super::{MachineRecord, MockMaasClient};
use crate::error::MaasError;
use crate::models::*;

/// Space MAAS keeps free on a disk for the partition table
const PARTITION_TABLE_EXTRA_SPACE: u64 = 15 * 1024 * 1024;

fn device_mut(record: &mut MachineRecord, device_id: u64) -> Result<&mut BlockDevice, MaasError> {
    record
        .block_devices
        .iter_mut()
        .find(|d| d.id == device_id)
        .ok_or_else(|| MaasError::NotFound(format!("Block device {} not found", device_id)))
}

fn partition_mut(
    record: &mut MachineRecord,
    device_id: u64,
    partition_id: u64,
) -> Result<&mut Partition, MaasError> {
    device_mut(record, device_id)?
        .partitions
        .iter_mut()
        .find(|p| p.id == partition_id)
        .ok_or_else(|| MaasError::NotFound(format!("Partition {} not found", partition_id)))
}

fn volume_group_mut(record: &mut MachineRecord, volume_group_id: u64) -> Result<&mut VolumeGroup, MaasError> {
    record
        .volume_groups
        .iter_mut()
        .find(|vg| vg.id == volume_group_id)
        .ok_or_else(|| MaasError::NotFound(format!("Volume group {} not found", volume_group_id)))
}

fn mount(filesystem: &mut Option<Filesystem>, mount_point: &str) -> Result<(), MaasError> {
    match filesystem {
        Some(fs) => {
            fs.mount_point = Some(mount_point.to_string());
            Ok(())
        }
        None => Err(MaasError::InvalidRequest(format!(
            "Cannot mount at {}: not formatted",
            mount_point
        ))),
    }
}

pub fn restore_storage_configuration(client: &MockMaasClient, system_id: &str) -> Result<Machine, MaasError> {
    client.with_machine("restore_storage", system_id, |record, client| {
        record.volume_groups.clear();
        record.block_devices = record.pristine_disks.clone();
        record.boot_disk = None;

        // Default layout: a single ext4 root partition on the first physical disk
        if let Some(disk) = record
            .block_devices
            .iter_mut()
            .find(|d| d.device_type == BlockDeviceType::Physical)
        {
            disk.partitions.push(Partition {
                id: client.next_id(),
                size: disk.size.saturating_sub(PARTITION_TABLE_EXTRA_SPACE),
                device_id: disk.id,
                filesystem: Some(Filesystem {
                    fstype: "ext4".to_string(),
                    mount_point: Some("/".to_string()),
                }),
            });
            record.boot_disk = Some(disk.id);
        }
        Ok(record.machine.clone())
    })
}

pub fn list_block_devices(client: &MockMaasClient, system_id: &str) -> Result<Vec<BlockDevice>, MaasError> {
    client.with_machine("list_block_devices", system_id, |record, _| {
        Ok(record.block_devices.clone())
    })
}

pub fn set_boot_disk(client: &MockMaasClient, system_id: &str, device_id: u64) -> Result<(), MaasError> {
    client.with_machine("set_boot_disk", system_id, |record, _| {
        let device = device_mut(record, device_id)?;
        if device.device_type != BlockDeviceType::Physical {
            return Err(MaasError::InvalidRequest(format!(
                "Block device {} is not a physical disk",
                device_id
            )));
        }
        record.boot_disk = Some(device_id);
        Ok(())
    })
}

pub fn format_block_device(
    client: &MockMaasClient,
    system_id: &str,
    device_id: u64,
    fstype: &str,
) -> Result<BlockDevice, MaasError> {
    client.with_machine("format_block_device", system_id, |record, _| {
        let device = device_mut(record, device_id)?;
        device.filesystem = Some(Filesystem {
            fstype: fstype.to_string(),
            mount_point: None,
        });
        Ok(device.clone())
    })
}

pub fn mount_block_device(
    client: &MockMaasClient,
    system_id: &str,
    device_id: u64,
    mount_point: &str,
) -> Result<BlockDevice, MaasError> {
    client.with_machine("mount_block_device", system_id, |record, _| {
        let device = device_mut(record, device_id)?;
        mount(&mut device.filesystem, mount_point)?;
        Ok(device.clone())
    })
}

pub fn create_partition(
    client: &MockMaasClient,
    system_id: &str,
    device_id: u64,
    size: u64,
) -> Result<Partition, MaasError> {
    client.with_machine("create_partition", system_id, |record, client| {
        let device = device_mut(record, device_id)?;
        let used: u64 = device.partitions.iter().map(|p| p.size).sum();
        let usable = device.size.saturating_sub(PARTITION_TABLE_EXTRA_SPACE);
        if size == 0 || used + size > usable {
            return Err(MaasError::InvalidRequest(format!(
                "Partition of {} bytes does not fit on {} ({} of {} bytes used)",
                size, device.name, used, usable
            )));
        }
        let partition = Partition {
            id: client.next_id(),
            size,
            device_id,
            filesystem: None,
        };
        device.partitions.push(partition.clone());
        Ok(partition)
    })
}

pub fn delete_partition(
    client: &MockMaasClient,
    system_id: &str,
    device_id: u64,
    partition_id: u64,
) -> Result<(), MaasError> {
    client.with_machine("delete_partition", system_id, |record, _| {
        let device = device_mut(record, device_id)?;
        let before = device.partitions.len();
        device.partitions.retain(|p| p.id != partition_id);
        if device.partitions.len() == before {
            return Err(MaasError::NotFound(format!("Partition {} not found", partition_id)));
        }
        Ok(())
    })
}

pub fn format_partition(
    client: &MockMaasClient,
    system_id: &str,
    device_id: u64,
    partition_id: u64,
    fstype: &str,
) -> Result<Partition, MaasError> {
    client.with_machine("format_partition", system_id, |record, _| {
        let partition = partition_mut(record, device_id, partition_id)?;
        partition.filesystem = Some(Filesystem {
            fstype: fstype.to_string(),
            mount_point: None,
        });
        Ok(partition.clone())
    })
}

pub fn mount_partition(
    client: &MockMaasClient,
    system_id: &str,
    device_id: u64,
    partition_id: u64,
    mount_point: &str,
) -> Result<Partition, MaasError> {
    client.with_machine("mount_partition", system_id, |record, _| {
        let partition = partition_mut(record, device_id, partition_id)?;
        mount(&mut partition.filesystem, mount_point)?;
        Ok(partition.clone())
    })
}

pub fn list_volume_groups(client: &MockMaasClient, system_id: &str) -> Result<Vec<VolumeGroup>, MaasError> {
    client.with_machine("list_volume_groups", system_id, |record, _| {
        Ok(record.volume_groups.clone())
    })
}

pub fn get_volume_group(
    client: &MockMaasClient,
    system_id: &str,
    volume_group_id: u64,
) -> Result<VolumeGroup, MaasError> {
    client.with_machine("get_volume_group", system_id, |record, _| {
        Ok(volume_group_mut(record, volume_group_id)?.clone())
    })
}

pub fn create_volume_group(
    client: &MockMaasClient,
    system_id: &str,
    name: &str,
    block_devices: &[u64],
    partitions: &[u64],
) -> Result<VolumeGroup, MaasError> {
    client.with_machine("create_volume_group", system_id, |record, client| {
        if block_devices.is_empty() && partitions.is_empty() {
            return Err(MaasError::InvalidRequest(format!(
                "Volume group {} needs at least one member",
                name
            )));
        }
        if record.volume_groups.iter().any(|vg| vg.name == name) {
            return Err(MaasError::InvalidRequest(format!("Volume group {} already exists", name)));
        }

        let mut size = 0u64;
        for id in block_devices {
            let device = device_mut(record, *id)?;
            size += device.size;
        }
        for id in partitions {
            let partition = record
                .block_devices
                .iter()
                .flat_map(|d| d.partitions.iter())
                .find(|p| p.id == *id)
                .ok_or_else(|| MaasError::NotFound(format!("Partition {} not found", id)))?;
            size += partition.size;
        }

        let volume_group = VolumeGroup {
            id: client.next_id(),
            name: name.to_string(),
            size,
            available_size: size,
            logical_volumes: Vec::new(),
        };
        record.volume_groups.push(volume_group.clone());
        Ok(volume_group)
    })
}

pub fn delete_volume_group(client: &MockMaasClient, system_id: &str, volume_group_id: u64) -> Result<(), MaasError> {
    client.with_machine("delete_volume_group", system_id, |record, _| {
        let volume_group = volume_group_mut(record, volume_group_id)?;
        if !volume_group.logical_volumes.is_empty() {
            return Err(MaasError::InvalidRequest(format!(
                "Volume group {} still holds logical volumes",
                volume_group.name
            )));
        }
        record.volume_groups.retain(|vg| vg.id != volume_group_id);
        Ok(())
    })
}

pub fn create_logical_volume(
    client: &MockMaasClient,
    system_id: &str,
    volume_group_id: u64,
    name: &str,
    size: u64,
) -> Result<BlockDevice, MaasError> {
    client.with_machine("create_logical_volume", system_id, |record, client| {
        let volume_group = volume_group_mut(record, volume_group_id)?;
        if size == 0 || size > volume_group.available_size {
            return Err(MaasError::InvalidRequest(format!(
                "Logical volume of {} bytes does not fit in {} ({} bytes available)",
                size, volume_group.name, volume_group.available_size
            )));
        }

        let id = client.next_id();
        volume_group.available_size -= size;
        volume_group.logical_volumes.push(LogicalVolume {
            id,
            name: name.to_string(),
            size,
        });
        let device = BlockDevice {
            id,
            name: format!("{}-{}", volume_group.name, name),
            device_type: BlockDeviceType::Virtual,
            size,
            partitions: Vec::new(),
            filesystem: None,
        };
        record.block_devices.push(device.clone());
        Ok(device)
    })
}

pub fn delete_logical_volume(
    client: &MockMaasClient,
    system_id: &str,
    volume_group_id: u64,
    logical_volume_id: u64,
) -> Result<(), MaasError> {
    client.with_machine("delete_logical_volume", system_id, |record, _| {
        let volume_group = volume_group_mut(record, volume_group_id)?;
        let position = volume_group
            .logical_volumes
            .iter()
            .position(|lv| lv.id == logical_volume_id)
            .ok_or_else(|| MaasError::NotFound(format!("Logical volume {} not found", logical_volume_id)))?;
        let removed = volume_group.logical_volumes.remove(position);
        volume_group.available_size += removed.size;
        record.block_devices.retain(|d| d.id != logical_volume_id);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maas_trait::MaasClientTrait;

    const TB: u64 = 1_000_000_000_000;

    fn client_with_disks() -> (MockMaasClient, u64, u64) {
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
        let sda = client.add_physical_disk("m1", "sda", TB);
        let sdb = client.add_physical_disk("m1", "sdb", TB);
        (client, sda, sdb)
    }

    #[tokio::test]
    async fn test_restore_creates_root_partition_on_first_disk() {
        let (client, sda, sdb) = client_with_disks();
        client.create_partition("m1", sdb, 1024 * 1024).await.unwrap();

        client.restore_storage_configuration("m1").await.unwrap();

        let devices = client.block_devices("m1");
        let first = devices.iter().find(|d| d.id == sda).unwrap();
        assert_eq!(first.partitions.len(), 1);
        assert_eq!(first.partitions[0].size, TB - 15_728_640);
        assert!(devices.iter().find(|d| d.id == sdb).unwrap().partitions.is_empty());
        assert_eq!(client.boot_disk("m1"), Some(sda));
    }

    #[tokio::test]
    async fn test_partition_must_fit() {
        let (client, sda, _) = client_with_disks();
        let result = client.create_partition("m1", sda, TB).await;
        assert!(matches!(result, Err(MaasError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_logical_volume_lifecycle() {
        let (client, sda, sdb) = client_with_disks();
        let part = client.create_partition("m1", sda, 1000).await.unwrap();
        let vg = client
            .create_volume_group("m1", "vg0", &[sdb], &[part.id])
            .await
            .unwrap();
        assert_eq!(vg.size, TB + 1000);

        let lv = client.create_logical_volume("m1", vg.id, "root", 500).await.unwrap();
        assert_eq!(lv.name, "vg0-root");
        assert_eq!(client.get_volume_group("m1", vg.id).await.unwrap().available_size, TB + 500);

        // Groups with volumes cannot be removed
        assert!(client.delete_volume_group("m1", vg.id).await.is_err());

        client.delete_logical_volume("m1", vg.id, lv.id).await.unwrap();
        client.delete_volume_group("m1", vg.id).await.unwrap();
        assert!(client.volume_groups("m1").is_empty());
        assert!(client.block_devices("m1").iter().all(|d| d.id != lv.id));
    }

    #[tokio::test]
    async fn test_mount_requires_filesystem() {
        let (client, sda, _) = client_with_disks();
        let part = client.create_partition("m1", sda, 1000).await.unwrap();
        assert!(client.mount_partition("m1", sda, part.id, "/srv").await.is_err());

        client.format_partition("m1", sda, part.id, "xfs").await.unwrap();
        let mounted = client.mount_partition("m1", sda, part.id, "/srv").await.unwrap();
        assert_eq!(mounted.filesystem.unwrap().mount_point.as_deref(), Some("/srv"));
    }
}
