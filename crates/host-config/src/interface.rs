//! Network interface entries: physical interfaces, bonds and VLANs

use crate::error::HostConfigError;
use crate::flags;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

/// A `network` entry as written in the document
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct InterfaceEntry {
    /// `bond`, `vlan`, or absent for an existing physical interface
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Parent interfaces (bond members, or the single VLAN parent)
    #[serde(default)]
    pub parents: Vec<String>,

    /// Bonding mode, e.g. `802.3ad` or `active-backup`
    #[serde(default, deserialize_with = "flags::string_or_number")]
    pub mode: Option<String>,

    /// VLAN id (802.1Q tag)
    #[serde(default, deserialize_with = "flags::string_or_number")]
    pub vid: Option<String>,

    /// `auto`, `dhcp` or a literal IP address
    #[serde(default)]
    pub address: Option<String>,

    /// Subnet identifier: id, name or CIDR
    #[serde(default, deserialize_with = "flags::string_or_number")]
    pub subnet: Option<String>,

    /// Use this link as the machine's default gateway
    #[serde(default, deserialize_with = "flags::presence")]
    pub default_gw_if: bool,
}

/// How an interface is obtained on the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceKind {
    /// Existing interface, looked up by name
    Physical,
    Bond { parents: Vec<String>, mode: String },
    Vlan { parent: String, vid: u16 },
}

/// How the link acquires its address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMode {
    Auto,
    Dhcp,
    Static(String),
}

impl AddressMode {
    fn parse(value: &str) -> Self {
        match value {
            "auto" => AddressMode::Auto,
            "dhcp" => AddressMode::Dhcp,
            address => AddressMode::Static(address.to_string()),
        }
    }
}

/// IP link of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub address: AddressMode,
    pub subnet: String,
    pub default_gateway: bool,
}

/// Desired state of one interface entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSpec {
    pub name: String,
    pub kind: InterfaceKind,
    pub link: Option<LinkSpec>,
}

impl InterfaceSpec {
    /// Convert a document entry; unknown types are rejected
    pub fn from_entry(name: &str, entry: InterfaceEntry) -> Result<Self, HostConfigError> {
        let kind = match entry.kind.as_deref() {
            None => InterfaceKind::Physical,
            Some("bond") => {
                if entry.parents.is_empty() {
                    return Err(HostConfigError::invalid_entry(name, "bond needs `parents`"));
                }
                let mode = entry
                    .mode
                    .ok_or_else(|| HostConfigError::invalid_entry(name, "bond needs a `mode`"))?;
                InterfaceKind::Bond {
                    parents: entry.parents,
                    mode,
                }
            }
            Some("vlan") => {
                let mut parents = entry.parents.into_iter();
                let parent = match (parents.next(), parents.next()) {
                    (Some(parent), None) => parent,
                    _ => {
                        return Err(HostConfigError::invalid_entry(
                            name,
                            "vlan needs exactly one parent",
                        ));
                    }
                };
                let vid = entry
                    .vid
                    .as_deref()
                    .and_then(|vid| vid.trim().parse::<u16>().ok())
                    .ok_or_else(|| {
                        HostConfigError::invalid_entry(
                            name,
                            format!("vlan needs a numeric `vid`, got {:?}", entry.vid),
                        )
                    })?;
                InterfaceKind::Vlan { parent, vid }
            }
            Some(other) => {
                return Err(HostConfigError::invalid_entry(
                    name,
                    format!("unknown interface type {:?}", other),
                ));
            }
        };

        let link = match (entry.address, entry.subnet) {
            (Some(address), Some(subnet)) => Some(LinkSpec {
                address: AddressMode::parse(&address),
                subnet,
                default_gateway: entry.default_gw_if,
            }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Interface {} needs both `address` and `subnet` for an IP link, leaving it unlinked", name);
                None
            }
            (None, None) => None,
        };

        Ok(InterfaceSpec {
            name: name.to_string(),
            kind,
            link,
        })
    }
}
