//! Unit tests for tag reconciliation

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use maas_client::{MaasClientTrait, MockMaasClient};

    #[tokio::test]
    async fn test_tags_are_created_and_attached() {
        let mock = MockMaasClient::new("http://test-maas");
        add_enlisted_machine(&mock, "m1", "10.10.0.1", &["rack-a"]);
        mock.add_tag("rack-a");
        mock.add_tag("compute");
        let ctx = create_test_context(&mock);
        let host = load_host("node1", "ipmi_ip: 10.10.0.1\ntags: [compute, gpu]\n");

        ctx.reconcile_tags(&mock.machine("m1").unwrap(), &host).await.unwrap();

        let machine = mock.machine("m1").unwrap();
        assert!(machine.has_tag("rack-a"));
        assert!(machine.has_tag("compute"));
        assert!(machine.has_tag("gpu"));

        assert_eq!(mock.call_count("create_tag", "gpu"), 1);
        assert_eq!(mock.call_count("create_tag", "compute"), 0);
        assert!(mock.get_tag("gpu").await.is_ok());
    }

    #[tokio::test]
    async fn test_existing_machine_tags_are_kept() {
        let mock = MockMaasClient::new("http://test-maas");
        add_enlisted_machine(&mock, "m1", "10.10.0.1", &["rack-a", "legacy"]);
        mock.add_tag("rack-a");
        mock.add_tag("legacy");
        let ctx = create_test_context(&mock);
        let host = load_host("node1", "ipmi_ip: 10.10.0.1\ntags: [rack-a]\n");

        ctx.reconcile_tags(&mock.machine("m1").unwrap(), &host).await.unwrap();

        let machine = mock.machine("m1").unwrap();
        assert_eq!(machine.tag_names, vec!["rack-a".to_string(), "legacy".to_string()]);
        assert_eq!(mock.call_count("add_tag", "m1"), 0);
    }

    #[tokio::test]
    async fn test_no_declared_tags_touches_nothing() {
        let mock = MockMaasClient::new("http://test-maas");
        add_enlisted_machine(&mock, "m1", "10.10.0.1", &[]);
        let ctx = create_test_context(&mock);
        let host = load_host("node1", "ipmi_ip: 10.10.0.1\n");

        ctx.reconcile_tags(&mock.machine("m1").unwrap(), &host).await.unwrap();
        assert!(mock.calls().is_empty());
    }
}
