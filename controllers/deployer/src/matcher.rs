//! Binding enlisted machines to named host entries
//!
//! MAAS enlists machines under generated hostnames. The only stable link
//! between an enlisted machine and its host entry is the BMC address in the
//! machine's power parameters, which must equal the entry's `ipmi_ip`.

use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use host_config::HostConfig;
use maas_client::Machine;
use tracing::{info, warn};

/// Pool of host entries not yet bound to a machine
///
/// Entries are scanned in declared order and the first match wins; a matched
/// entry leaves the pool so no second machine can claim it.
#[derive(Debug)]
pub struct HostMatcher<'a> {
    unmatched: Vec<&'a HostConfig>,
}

impl<'a> HostMatcher<'a> {
    pub fn new(hosts: &'a [HostConfig]) -> Self {
        Self {
            unmatched: hosts.iter().collect(),
        }
    }

    /// Take the first unmatched entry whose `ipmi_ip` equals `address`
    ///
    /// An entry without `ipmi_ip` met during the scan aborts the run.
    pub fn claim(&mut self, address: &str) -> Result<Option<&'a HostConfig>, ProvisionError> {
        let address = address.trim();
        for (index, host) in self.unmatched.iter().enumerate() {
            if host.ipmi_address()? == address {
                return Ok(Some(self.unmatched.remove(index)));
            }
        }
        Ok(None)
    }

    /// Entries still waiting for a machine
    pub fn remaining(&self) -> impl Iterator<Item = &'a HostConfig> + '_ {
        self.unmatched.iter().copied()
    }
}

impl ProvisionContext {
    /// Bind a commissioned machine to its host entry and rename it
    ///
    /// A machine without power parameters is recorded as unmatched and
    /// `Ok(None)` is returned. A machine whose BMC address no entry declares is
    /// fatal. On success the renamed machine is returned with its entry.
    pub async fn bind<'a>(
        &mut self,
        matcher: &mut HostMatcher<'a>,
        machine: Machine,
    ) -> Result<Option<(Machine, &'a HostConfig)>, ProvisionError> {
        let params = self.client.get_power_parameters(&machine.system_id).await?;
        let Some(address) = params.power_address().filter(|a| !a.trim().is_empty()) else {
            warn!(
                "Machine {} ({}) has no IPMI settings, skipping",
                machine.hostname, machine.system_id
            );
            self.summary.unmatched.push(machine);
            return Ok(None);
        };

        let Some(host) = matcher.claim(address)? else {
            return Err(ProvisionError::NoHostConfig {
                hostname: machine.hostname,
                address: address.to_string(),
            });
        };

        info!("Renaming {} ({}) to {}", machine.hostname, address, host.name);
        let renamed = self.client.set_hostname(&machine.system_id, &host.name).await?;
        Ok(Some((renamed, host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_config::HostConfigError;

    fn host(name: &str, ipmi: Option<&str>) -> HostConfig {
        HostConfig {
            name: name.to_string(),
            ipmi_address: ipmi.map(str::to_string),
            disks: Vec::new(),
            network: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_claim_consumes_entry() {
        let hosts = vec![host("node1", Some("10.0.0.1")), host("node2", Some("10.0.0.2"))];
        let mut matcher = HostMatcher::new(&hosts);

        assert_eq!(matcher.claim("10.0.0.2").unwrap().unwrap().name, "node2");
        assert!(matcher.claim("10.0.0.2").unwrap().is_none());
        assert_eq!(matcher.remaining().map(|h| h.name.as_str()).collect::<Vec<_>>(), vec!["node1"]);
    }

    #[test]
    fn test_first_declared_match_wins() {
        let hosts = vec![host("first", Some("10.0.0.1")), host("second", Some("10.0.0.1"))];
        let mut matcher = HostMatcher::new(&hosts);

        assert_eq!(matcher.claim(" 10.0.0.1 ").unwrap().unwrap().name, "first");
        assert_eq!(matcher.claim("10.0.0.1").unwrap().unwrap().name, "second");
    }

    #[test]
    fn test_entry_without_address_is_fatal() {
        let hosts = vec![host("node1", None), host("node2", Some("10.0.0.2"))];
        let mut matcher = HostMatcher::new(&hosts);

        let err = matcher.claim("10.0.0.2").unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Config(HostConfigError::MissingIpmiAddress { ref host }) if host == "node1"
        ));
        assert!(err.is_fatal());
    }
}
