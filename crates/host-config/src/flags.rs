//! Lenient scalar decoding for hand-written documents
//!
//! Operators write `boot:`, `boot: yes` or `boot: true` interchangeably, and
//! VLAN ids or subnet ids may be quoted or bare numbers.

use serde::de::{Deserialize, Deserializer, Error};
use serde_yaml::Value;

/// Key-presence flag: a present key enables the flag unless its value is an
/// explicit false (`false`, `no`, `off`, `0`)
pub fn presence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "false" | "no" | "off" | "0"
        ),
        _ => true,
    })
}

/// Optional scalar that may be written as a string or a number
pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a string or a number, found {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "presence")]
        boot: bool,
        #[serde(default, deserialize_with = "string_or_number")]
        vid: Option<String>,
    }

    fn flags(yaml: &str) -> Flags {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_presence_semantics() {
        assert!(!flags("{}").boot);
        assert!(flags("boot:").boot);
        assert!(flags("boot: true").boot);
        assert!(flags("boot: \"yes\"").boot);
        assert!(!flags("boot: false").boot);
        assert!(!flags("boot: \"no\"").boot);
        assert!(!flags("boot: 0").boot);
    }

    #[test]
    fn test_string_or_number() {
        assert_eq!(flags("vid: 100").vid.as_deref(), Some("100"));
        assert_eq!(flags("vid: \"100\"").vid.as_deref(), Some("100"));
        assert_eq!(flags("{}").vid, None);
        assert!(serde_yaml::from_str::<Flags>("vid: [1, 2]").is_err());
    }
}
