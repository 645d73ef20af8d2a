//! Virtual network configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A virtual network spanning several availability zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum number of availability zones to spread subnets across.
    pub max_azs: u8,
    /// Address range of the network.
    pub cidr: String,
    /// NAT gateways for private subnets; one per zone when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateways: Option<u8>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_azs: 3,
            cidr: "10.0.0.0/16".to_string(),
            nat_gateways: None,
        }
    }
}

impl NetworkConfig {
    /// Returns the number of NAT gateways that will be created.
    #[must_use]
    pub fn effective_nat_gateways(&self) -> u8 {
        self.nat_gateways.unwrap_or(self.max_azs)
    }

    /// Checks the zone count and address range.
    ///
    /// # Errors
    ///
    /// Returns an error if no zone is requested, the CIDR is malformed or
    /// its prefix is outside /16-/28, or there are more NAT gateways than zones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_azs == 0 {
            return Err(ConfigError::invalid("network.max_azs", "must be at least 1"));
        }

        let (addr, prefix) = self
            .cidr
            .split_once('/')
            .ok_or_else(|| ConfigError::invalid("network.cidr", format!("'{}' has no prefix length", self.cidr)))?;
        addr.parse::<Ipv4Addr>()
            .map_err(|e| ConfigError::invalid("network.cidr", format!("'{addr}': {e}")))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| ConfigError::invalid("network.cidr", format!("'{prefix}' is not a prefix length")))?;
        if !(16..=28).contains(&prefix) {
            return Err(ConfigError::invalid(
                "network.cidr",
                format!("prefix /{prefix} is outside /16-/28"),
            ));
        }

        if self.effective_nat_gateways() > self.max_azs {
            return Err(ConfigError::invalid(
                "network.nat_gateways",
                format!("{} exceeds max_azs {}", self.effective_nat_gateways(), self.max_azs),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_network() {
        let network = NetworkConfig::default();
        assert_eq!(network.max_azs, 3);
        assert_eq!(network.effective_nat_gateways(), 3);
        assert!(network.validate().is_ok());
    }

    #[test]
    fn test_zero_zones_rejected() {
        let network = NetworkConfig {
            max_azs: 0,
            ..NetworkConfig::default()
        };
        assert!(network.validate().is_err());
    }

    #[test]
    fn test_cidr_checks() {
        for cidr in ["10.0.0.0", "10.0.0/16", "10.0.0.0/8", "10.0.0.0/x"] {
            let network = NetworkConfig {
                cidr: cidr.to_string(),
                ..NetworkConfig::default()
            };
            assert!(network.validate().is_err(), "{cidr} should be rejected");
        }
    }

    #[test]
    fn test_nat_gateways_bounded_by_zones() {
        let network = NetworkConfig {
            max_azs: 2,
            nat_gateways: Some(3),
            ..NetworkConfig::default()
        };
        assert!(network.validate().is_err());
    }
}
