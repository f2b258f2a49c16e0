//! Storage reconciliation
//!
//! The layout MAAS builds during commissioning (one root partition on the
//! first disk) is restored, then every logical volume, volume group and
//! partition is deleted. The declared disks are then built in document order:
//! plain disks with their partitions, volume groups from whole disks or sized
//! partitions, and logical volumes carved out of those groups.

use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::sizing::size_for;
use host_config::{DiskSpec, HostConfig, ParentDisk, PartitionSpec};
use maas_client::{BlockDevice, BlockDeviceType, Machine, MaasClientTrait, Partition};
use tracing::{debug, info};

/// Find a physical disk by name
fn find_disk<'d>(
    devices: &'d [BlockDevice],
    hostname: &str,
    name: &str,
) -> Result<&'d BlockDevice, ProvisionError> {
    devices
        .iter()
        .find(|d| d.device_type == BlockDeviceType::Physical && d.name == name)
        .ok_or_else(|| ProvisionError::DiskNotFound {
            hostname: hostname.to_string(),
            disk: name.to_string(),
        })
}

/// Storage steps for one machine
struct StorageReconciler<'c> {
    client: &'c dyn MaasClientTrait,
    system_id: &'c str,
    hostname: &'c str,
}

impl StorageReconciler<'_> {
    /// Delete logical volumes, then volume groups, then partitions
    async fn wipe(&self) -> Result<(), ProvisionError> {
        for group in self.client.list_volume_groups(self.system_id).await? {
            let group = self.client.get_volume_group(self.system_id, group.id).await?;
            for volume in &group.logical_volumes {
                debug!("Deleting logical volume {} from {}", volume.name, group.name);
                self.client
                    .delete_logical_volume(self.system_id, group.id, volume.id)
                    .await?;
            }
            debug!("Deleting volume group {}", group.name);
            self.client.delete_volume_group(self.system_id, group.id).await?;
        }

        for disk in self.client.list_block_devices(self.system_id).await? {
            if disk.device_type != BlockDeviceType::Physical {
                continue;
            }
            for partition in &disk.partitions {
                debug!("Deleting partition {} from {}", partition.id, disk.name);
                self.client
                    .delete_partition(self.system_id, disk.id, partition.id)
                    .await?;
            }
        }
        Ok(())
    }

    async fn plain_disk(
        &self,
        devices: &[BlockDevice],
        name: &str,
        boot: bool,
        partitions: &[PartitionSpec],
    ) -> Result<(), ProvisionError> {
        let disk = find_disk(devices, self.hostname, name)?;
        let mut last: Option<Partition> = None;

        for spec in partitions {
            if let Some(size) = &spec.size {
                let bytes = size_for(name, size, disk.size)?;
                info!("Creating partition of {} bytes ({}) on {}", bytes, size, name);
                last = Some(self.client.create_partition(self.system_id, disk.id, bytes).await?);
            }

            if spec.fstype.is_none() && spec.mount.is_none() {
                continue;
            }
            let partition = last.as_ref().ok_or_else(|| ProvisionError::NoPartition {
                hostname: self.hostname.to_string(),
                disk: name.to_string(),
            })?;
            if let Some(fstype) = &spec.fstype {
                info!("Formatting partition {} on {} as {}", partition.id, name, fstype);
                self.client
                    .format_partition(self.system_id, disk.id, partition.id, fstype)
                    .await?;
            }
            if let Some(mount) = &spec.mount {
                info!("Mounting partition {} on {} at {}", partition.id, name, mount);
                self.client
                    .mount_partition(self.system_id, disk.id, partition.id, mount)
                    .await?;
            }
        }

        if boot {
            info!("Setting {} as boot disk", name);
            self.client.set_boot_disk(self.system_id, disk.id).await?;
        }
        Ok(())
    }

    async fn volume_group(
        &self,
        devices: &[BlockDevice],
        name: &str,
        parents: &[ParentDisk],
    ) -> Result<(), ProvisionError> {
        let mut member_disks = Vec::new();
        let mut member_partitions = Vec::new();

        for parent in parents {
            let disk = find_disk(devices, self.hostname, &parent.name)?;
            if parent.boot {
                info!("Setting {} as boot disk", parent.name);
                self.client.set_boot_disk(self.system_id, disk.id).await?;
            }

            if parent.partition_sizes.is_empty() {
                member_disks.push(disk.id);
                continue;
            }
            for size in &parent.partition_sizes {
                let bytes = size_for(&parent.name, size, disk.size)?;
                info!("Creating partition of {} bytes ({}) on {} for {}", bytes, size, parent.name, name);
                let partition = self.client.create_partition(self.system_id, disk.id, bytes).await?;
                member_partitions.push(partition.id);
            }
        }

        info!(
            "Creating volume group {} from {} disk(s) and {} partition(s)",
            name,
            member_disks.len(),
            member_partitions.len()
        );
        self.client
            .create_volume_group(self.system_id, name, &member_disks, &member_partitions)
            .await?;
        Ok(())
    }

    async fn logical_volume(
        &self,
        name: &str,
        volume_group: &str,
        size: &str,
        fstype: &str,
        mount: &str,
    ) -> Result<(), ProvisionError> {
        let group = self
            .client
            .list_volume_groups(self.system_id)
            .await?
            .into_iter()
            .find(|g| g.name == volume_group)
            .ok_or_else(|| ProvisionError::VolumeGroupNotFound {
                hostname: self.hostname.to_string(),
                volume_group: volume_group.to_string(),
            })?;
        let group = self.client.get_volume_group(self.system_id, group.id).await?;

        let bytes = size_for(name, size, group.size)?;
        info!("Creating logical volume {} of {} bytes ({}) in {}", name, bytes, size, volume_group);
        let volume = self
            .client
            .create_logical_volume(self.system_id, group.id, name, bytes)
            .await?;

        info!("Formatting {} as {} and mounting at {}", volume.name, fstype, mount);
        self.client.format_block_device(self.system_id, volume.id, fstype).await?;
        self.client.mount_block_device(self.system_id, volume.id, mount).await?;
        Ok(())
    }

    async fn apply(&self, devices: &[BlockDevice], disk: &DiskSpec) -> Result<(), ProvisionError> {
        // Nothing is created for an entry whose sizes do not all parse
        disk.validate_sizes()?;

        match disk {
            DiskSpec::Plain { name, boot, partitions } => {
                self.plain_disk(devices, name, *boot, partitions).await
            }
            DiskSpec::VolumeGroup { name, parents } => self.volume_group(devices, name, parents).await,
            DiskSpec::LogicalVolume {
                name,
                volume_group,
                size,
                fstype,
                mount,
            } => self.logical_volume(name, volume_group, size, fstype, mount).await,
        }
    }
}

impl ProvisionContext {
    /// Wipe the machine's storage and build the declared layout
    pub async fn reconcile_storage(&self, machine: &Machine, host: &HostConfig) -> Result<(), ProvisionError> {
        let reconciler = StorageReconciler {
            client: self.client.as_ref(),
            system_id: &machine.system_id,
            hostname: &host.name,
        };

        if self.client.list_block_devices(&machine.system_id).await?.is_empty() {
            return Err(ProvisionError::NoBlockDevices(host.name.clone()));
        }

        self.client.restore_storage_configuration(&machine.system_id).await?;
        reconciler.wipe().await?;

        let devices = self.client.list_block_devices(&machine.system_id).await?;
        for disk in &host.disks {
            info!("Configuring disk {} on {}", disk.name(), host.name);
            reconciler.apply(&devices, disk).await?;
        }
        Ok(())
    }
}
