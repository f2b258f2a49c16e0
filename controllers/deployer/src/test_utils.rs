//! Test utilities for unit testing the provisioning flow
//!
//! This module provides helpers for building machines, a populated mock
//! backend and configuration documents.

use crate::context::ProvisionContext;
use host_config::{Document, HostConfig, LifecycleSettings};
use maas_client::{Machine, MockMaasClient, NodeStatus, PowerState};
use std::sync::Arc;

pub const TB: u64 = 1_000_000_000_000;

/// Helper to create a machine as MAAS enlists it
pub fn create_test_machine(system_id: &str, status: NodeStatus, tags: &[&str]) -> Machine {
    Machine {
        system_id: system_id.to_string(),
        hostname: format!("enlisted-{}", system_id),
        status,
        status_name: status.to_string(),
        power_state: PowerState::Off,
        power_type: "ipmi".to_string(),
        tag_names: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Helper to add a NEW machine with a BMC address, two disks and two NICs
pub fn add_enlisted_machine(mock: &MockMaasClient, system_id: &str, ipmi: &str, tags: &[&str]) {
    mock.add_machine(create_test_machine(system_id, NodeStatus::New, tags));
    mock.set_power_parameters(system_id, &[("power_address", ipmi), ("power_user", "admin")]);
    mock.add_physical_disk(system_id, "sda", TB);
    mock.add_physical_disk(system_id, "sdb", TB / 2);
    mock.add_physical_interface(system_id, "eth0");
    mock.add_physical_interface(system_id, "eth1");
}

/// Helper to create a context over the mock with the default settings
pub fn create_test_context(mock: &MockMaasClient) -> ProvisionContext {
    create_test_context_with(mock, LifecycleSettings::default())
}

pub fn create_test_context_with(mock: &MockMaasClient, settings: LifecycleSettings) -> ProvisionContext {
    ProvisionContext::new(Arc::new(mock.clone()), settings)
}

/// Helper to load a document from YAML
pub fn load_document(yaml: &str) -> Document {
    Document::from_yaml(yaml).unwrap()
}

/// Helper to load a single host entry; `body` is indented under the host name
pub fn load_host(name: &str, body: &str) -> HostConfig {
    let indented: String = body.lines().map(|line| format!("    {}\n", line)).collect();
    let yaml = format!("machines_config:\n  {}:\n{}", name, indented);
    load_document(&yaml).hosts.remove(0)
}
