//! MAAS REST API Client
//!
//! A Rust client library for the MAAS 2.0 REST API.
//! Provides type-safe models and methods for the machine lifecycle, storage
//! layout, network interfaces and tags.
//!
//! # Example
//!
//! ```no_run
//! use maas_client::{MaasClient, MaasClientTrait, NodeStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client from the API key shown in the MAAS UI
//! let client = MaasClient::new(
//!     "http://maas:5240/MAAS".to_string(),
//!     "consumer:token:secret",
//! )?;
//!
//! // Find newly enlisted machines and commission them
//! for machine in client.list_machines().await? {
//!     if machine.status == NodeStatus::New {
//!         client.commission_machine(&machine.system_id).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Lifecycle**: commission, deploy, power state and power-on
//! - **Storage**: partitions, volume groups, logical volumes, boot disk
//! - **Network**: bonds, VLAN interfaces, subnet links, default gateway
//! - **Mocking**: `MockMaasClient` behind the `test-util` feature

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod maas_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::MaasClient;
pub use common::{ApiKey, HttpClient};
pub use error::MaasError;
pub use models::*;
pub use maas_trait::MaasClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockMaasClient;
