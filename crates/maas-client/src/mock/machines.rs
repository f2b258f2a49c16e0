//! Machine operations for MockMaasClient
//!
//! Handles lifecycle requests, scripted status/power observations and hostnames

use super::{MachineRecord, MockMaasClient};
use crate::error::MaasError;
use crate::models::*;
use std::collections::VecDeque;

/// Pop the next scripted value, keeping the last one once the script runs out
fn advance<T: Copy>(script: &mut VecDeque<T>) -> Option<T> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().copied()
    }
}

pub fn list_machines(client: &MockMaasClient) -> Result<Vec<Machine>, MaasError> {
    client.journal("list_machines", "*");
    let machines = client.machines.lock().unwrap();
    Ok(machines.values().map(|r| r.machine.clone()).collect())
}

pub fn get_machine(client: &MockMaasClient, system_id: &str) -> Result<Machine, MaasError> {
    client.with_machine("get_machine", system_id, |record, _| {
        if let Some(status) = advance(&mut record.status_script) {
            record.machine.status = status;
            record.machine.status_name = status.to_string();
        }
        Ok(record.machine.clone())
    })
}

/// Apply an accepted lifecycle request and install its status script
fn accept_request(record: &mut MachineRecord, operation: &str, status: NodeStatus) -> Machine {
    record.machine.status = status;
    record.machine.status_name = status.to_string();
    record.status_script = record.request_scripts.remove(operation).unwrap_or_default();
    record.machine.clone()
}

pub fn commission_machine(client: &MockMaasClient, system_id: &str) -> Result<Machine, MaasError> {
    client.with_machine("commission", system_id, |record, _| {
        match record.machine.status {
            NodeStatus::New | NodeStatus::Ready | NodeStatus::FailedCommissioning | NodeStatus::Broken => {
                Ok(accept_request(record, "commission", NodeStatus::Commissioning))
            }
            other => Err(MaasError::InvalidRequest(format!(
                "Machine {} cannot be commissioned from {}",
                record.machine.system_id, other
            ))),
        }
    })
}

pub fn deploy_machine(client: &MockMaasClient, system_id: &str) -> Result<Machine, MaasError> {
    client.with_machine("deploy", system_id, |record, _| {
        match record.machine.status {
            NodeStatus::Ready | NodeStatus::Allocated => Ok(accept_request(record, "deploy", NodeStatus::Deploying)),
            other => Err(MaasError::InvalidRequest(format!(
                "Machine {} cannot be deployed from {}",
                record.machine.system_id, other
            ))),
        }
    })
}

pub fn query_power_state(client: &MockMaasClient, system_id: &str) -> Result<PowerState, MaasError> {
    client.with_machine("query_power_state", system_id, |record, _| {
        if let Some(state) = advance(&mut record.power_script) {
            record.machine.power_state = state;
        }
        Ok(record.machine.power_state)
    })
}

pub fn power_on_machine(client: &MockMaasClient, system_id: &str) -> Result<Machine, MaasError> {
    client.with_machine("power_on", system_id, |record, _| {
        record.machine.power_state = PowerState::On;
        Ok(record.machine.clone())
    })
}

pub fn get_power_parameters(client: &MockMaasClient, system_id: &str) -> Result<PowerParameters, MaasError> {
    client.with_machine("power_parameters", system_id, |record, _| {
        Ok(record.power_parameters.clone())
    })
}

pub fn set_hostname(client: &MockMaasClient, system_id: &str, hostname: &str) -> Result<Machine, MaasError> {
    client.with_machine("set_hostname", system_id, |record, _| {
        record.machine.hostname = hostname.to_string();
        Ok(record.machine.clone())
    })
}
