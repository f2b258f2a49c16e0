//! Percentage size strings (`"50%"`)

use crate::error::HostConfigError;
use regex::Regex;
use std::fmt;

const PERCENTAGE_PATTERN: &str = r"^\d+%$";

/// An integer percentage of a device's usable capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percentage(u64);

impl Percentage {
    /// Parse a size string strictly against `^\d+%$`
    ///
    /// `entry` names the disk the size belongs to, for the error message.
    pub fn parse(entry: &str, value: &str) -> Result<Self, HostConfigError> {
        let invalid = || HostConfigError::InvalidSize {
            entry: entry.to_string(),
            value: value.to_string(),
        };

        let pattern = Regex::new(PERCENTAGE_PATTERN).map_err(|_| invalid())?;
        if !pattern.is_match(value) {
            return Err(invalid());
        }
        value
            .trim_end_matches('%')
            .parse::<u64>()
            .map(Percentage)
            .map_err(|_| invalid())
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percentage() {
        assert_eq!(Percentage::parse("sda", "50%").unwrap().value(), 50);
        assert_eq!(Percentage::parse("sda", "0%").unwrap().value(), 0);
        assert_eq!(Percentage::parse("sda", "100%").unwrap().to_string(), "100%");
    }

    #[test]
    fn test_parse_is_strict() {
        for value in ["50", "50 %", " 50%", "50%%", "5.5%", "-5%", "%", "50GB", ""] {
            let err = Percentage::parse("sda", value).unwrap_err();
            assert!(
                matches!(err, HostConfigError::InvalidSize { ref entry, .. } if entry == "sda"),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(Percentage::parse("sda", "99999999999999999999999%").is_err());
    }
}
