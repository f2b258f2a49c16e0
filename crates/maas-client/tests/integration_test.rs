//! Integration tests for MAAS client
//!
//! These tests require a running MAAS region controller.
//! Set MAAS_URL and MAAS_APIKEY environment variables to run.

use maas_client::{MaasClient, MaasClientTrait, MaasError};

fn live_client() -> MaasClient {
    let url = std::env::var("MAAS_URL")
        .unwrap_or_else(|_| "http://localhost:5240/MAAS".to_string());
    let api_key = std::env::var("MAAS_APIKEY")
        .expect("MAAS_APIKEY environment variable must be set");

    MaasClient::new(url, &api_key).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running MAAS instance
async fn test_validate_credentials() {
    let client = live_client();
    client
        .validate_credentials()
        .await
        .expect("Credentials rejected");
}

#[tokio::test]
#[ignore]
async fn test_list_machines() {
    let client = live_client();

    let machines = client.list_machines().await
        .expect("Failed to list machines");

    println!("Found {} machines", machines.len());
    for machine in &machines {
        println!("  {} {} ({})", machine.system_id, machine.hostname, machine.status);
    }
}

#[tokio::test]
#[ignore]
async fn test_machine_inventory() {
    let client = live_client();

    let machines = client.list_machines().await
        .expect("Failed to list machines");

    // Read-only walk over the first machine's storage and network
    if let Some(machine) = machines.first() {
        let devices = client.list_block_devices(&machine.system_id).await
            .expect("Failed to list block devices");
        println!("{}: {} block devices", machine.hostname, devices.len());

        let interfaces = client.list_interfaces(&machine.system_id).await
            .expect("Failed to list interfaces");
        println!("{}: {} interfaces", machine.hostname, interfaces.len());

        let power = client.query_power_state(&machine.system_id).await
            .expect("Failed to query power state");
        println!("{}: power {:?}", machine.hostname, power);
    }
}

#[tokio::test]
#[ignore]
async fn test_list_fabrics() {
    let client = live_client();

    let fabrics = client.list_fabrics().await
        .expect("Failed to list fabrics");

    for fabric in &fabrics {
        println!("Fabric {} with {} VLANs", fabric.name, fabric.vlans.len());
    }
}

#[tokio::test]
#[ignore]
async fn test_missing_tag_is_not_found() {
    let client = live_client();

    let result = client.get_tag("maas-deployer-does-not-exist").await;
    assert!(matches!(result, Err(MaasError::NotFound(_))));
}
