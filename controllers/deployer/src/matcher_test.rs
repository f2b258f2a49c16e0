//! Unit tests for binding machines to host entries

#[cfg(test)]
mod tests {
    use crate::error::ProvisionError;
    use crate::matcher::HostMatcher;
    use crate::test_utils::*;
    use maas_client::{MockMaasClient, NodeStatus};

    const HOSTS: &str = r#"
machines_config:
  node1:
    ipmi_ip: 10.10.0.1
  node2:
    ipmi_ip: 10.10.0.2
"#;

    fn mock_with_bmc(machines: &[(&str, Option<&str>)]) -> MockMaasClient {
        let mock = MockMaasClient::new("http://test-maas");
        for (id, ipmi) in machines {
            mock.add_machine(create_test_machine(id, NodeStatus::Ready, &[]));
            if let Some(ipmi) = ipmi {
                mock.set_power_parameters(id, &[("power_address", *ipmi)]);
            }
        }
        mock
    }

    #[tokio::test]
    async fn test_each_entry_binds_once() {
        let document = load_document(HOSTS);
        let mock = mock_with_bmc(&[("m1", Some("10.10.0.2")), ("m2", Some("10.10.0.1"))]);
        let mut ctx = create_test_context(&mock);
        let mut matcher = HostMatcher::new(&document.hosts);

        let (machine, host) = ctx.bind(&mut matcher, mock.machine("m1").unwrap()).await.unwrap().unwrap();
        assert_eq!(host.name, "node2");
        assert_eq!(machine.hostname, "node2");

        let (machine, host) = ctx.bind(&mut matcher, mock.machine("m2").unwrap()).await.unwrap().unwrap();
        assert_eq!(host.name, "node1");
        assert_eq!(machine.hostname, "node1");

        assert_eq!(matcher.remaining().count(), 0);
        assert_eq!(mock.machine("m1").unwrap().hostname, "node2");
        assert_eq!(mock.call_count("set_hostname", "m2"), 1);
    }

    #[tokio::test]
    async fn test_second_machine_with_same_address_is_fatal() {
        let document = load_document(HOSTS);
        let mock = mock_with_bmc(&[("m1", Some("10.10.0.1")), ("m2", Some("10.10.0.1"))]);
        let mut ctx = create_test_context(&mock);
        let mut matcher = HostMatcher::new(&document.hosts);

        ctx.bind(&mut matcher, mock.machine("m1").unwrap()).await.unwrap().unwrap();
        let err = ctx.bind(&mut matcher, mock.machine("m2").unwrap()).await.unwrap_err();

        assert!(matches!(err, ProvisionError::NoHostConfig { ref address, .. } if address == "10.10.0.1"));
        assert!(err.is_fatal());
        assert_eq!(mock.call_count("set_hostname", "m2"), 0);
    }

    #[tokio::test]
    async fn test_machine_without_ipmi_settings_is_unmatched() {
        let document = load_document(HOSTS);
        let mock = mock_with_bmc(&[("m1", None), ("m2", Some(" "))]);
        let mut ctx = create_test_context(&mock);
        let mut matcher = HostMatcher::new(&document.hosts);

        assert!(ctx.bind(&mut matcher, mock.machine("m1").unwrap()).await.unwrap().is_none());
        assert!(ctx.bind(&mut matcher, mock.machine("m2").unwrap()).await.unwrap().is_none());

        let summary = ctx.take_summary();
        assert_eq!(summary.unmatched.len(), 2);
        assert_eq!(matcher.remaining().count(), 2);
        assert!(!mock.calls().iter().any(|c| c.starts_with("set_hostname")));
    }

    #[tokio::test]
    async fn test_unknown_address_is_fatal() {
        let document = load_document(HOSTS);
        let mock = mock_with_bmc(&[("m1", Some("10.99.0.1"))]);
        let mut ctx = create_test_context(&mock);
        let mut matcher = HostMatcher::new(&document.hosts);

        let err = ctx.bind(&mut matcher, mock.machine("m1").unwrap()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::NoHostConfig { ref hostname, .. } if hostname == "enlisted-m1"));
    }
}
