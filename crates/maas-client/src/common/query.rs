//! Path utilities for MAAS API
//!
//! MAAS exposes most actions as `?op=<name>` on a resource URL.

/// API version prefix
pub const API_PREFIX: &str = "/api/2.0";

/// Path of a machine resource
pub fn machine_path(system_id: &str) -> String {
    format!("{}/machines/{}/", API_PREFIX, urlencoding::encode(system_id))
}

/// Path of a node sub-collection (e.g. `blockdevices`, `interfaces`)
pub fn node_path(system_id: &str, collection: &str) -> String {
    format!(
        "{}/nodes/{}/{}/",
        API_PREFIX,
        urlencoding::encode(system_id),
        collection
    )
}

/// Path of one object inside a node sub-collection
pub fn node_object_path(system_id: &str, collection: &str, id: u64) -> String {
    format!(
        "{}/nodes/{}/{}/{}/",
        API_PREFIX,
        urlencoding::encode(system_id),
        collection,
        id
    )
}

/// Append an `op` to a resource path
pub fn with_op(path: &str, op: &str) -> String {
    format!("{}?op={}", path, urlencoding::encode(op))
}
