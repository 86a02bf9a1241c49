//! Target range specification.
//!
//! Accepts three input shapes:
//! - Shorthand integer: "3" (means 192.168.3.0/24)
//! - CIDR notation: "10.0.0.0/16"
//! - A bare address: "10.0.0.1" (a single-address range)

use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid CIDR or IP: {0}")]
    InvalidInput(String),
}

/// An address range described by a base address and a mask.
///
/// The base address is whatever address the user wrote, not necessarily
/// the network address: `192.168.1.77/24` keeps `192.168.1.77` as its base
/// and still covers `192.168.1.0` through `192.168.1.255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    network: IpNetwork,
}

impl AddressRange {
    /// Parse a target specification.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();
        let invalid = || TargetError::InvalidInput(input.to_string());

        let expanded;
        let input = if is_shorthand(trimmed) {
            expanded = format!("192.168.{}.0/24", trimmed);
            expanded.as_str()
        } else {
            trimmed
        };

        if input.contains('/') {
            let network: IpNetwork = input.parse().map_err(|_| invalid())?;
            return Ok(Self { network });
        }

        let ip: IpAddr = input.parse().map_err(|_| invalid())?;
        Ok(Self::single(ip))
    }

    /// A range containing exactly one address.
    pub fn single(ip: IpAddr) -> Self {
        // Full-width prefix: /32 for IPv4, /128 for IPv6.
        Self {
            network: IpNetwork::from(ip),
        }
    }

    /// The representative address the range was parsed from.
    pub fn base(&self) -> IpAddr {
        self.network.ip()
    }

    /// The mask, same width as the base address.
    pub fn mask(&self) -> IpAddr {
        self.network.mask()
    }

    /// Prefix length of the mask.
    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Address width in bits (32 or 128).
    pub fn width_bits(&self) -> u8 {
        match self.network {
            IpNetwork::V4(_) => 32,
            IpNetwork::V6(_) => 128,
        }
    }

    /// Number of addresses the mask admits, boundary addresses included.
    pub fn host_count(&self) -> u128 {
        let host_bits = u32::from(self.width_bits() - self.prefix());
        if host_bits >= 128 {
            u128::MAX
        } else {
            1u128 << host_bits
        }
    }

    /// Check whether an address falls inside the masked range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.network.contains(ip)
    }
}

impl FromStr for AddressRange {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network.ip(), self.network.prefix())
    }
}

/// Plain non-negative integers are the legacy "third octet" shorthand.
fn is_shorthand(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_parse_shorthand() {
        let range = AddressRange::parse("3").unwrap();
        assert_eq!(range.to_string(), "192.168.3.0/24");
        assert_eq!(range.host_count(), 256);
    }

    #[test]
    fn test_parse_shorthand_out_of_octet_range() {
        assert_eq!(
            AddressRange::parse("300"),
            Err(TargetError::InvalidInput("300".to_string()))
        );
    }

    #[test]
    fn test_parse_bare_address() {
        let range = AddressRange::parse("10.0.0.1").unwrap();
        assert_eq!(range.base(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(range.mask(), IpAddr::V4(Ipv4Addr::BROADCAST));
        assert_eq!(range.host_count(), 1);
        assert_eq!(range.to_string(), "10.0.0.1/32");
    }

    #[test]
    fn test_parse_cidr_keeps_base() {
        let range = AddressRange::parse("192.168.1.77/24").unwrap();
        assert_eq!(range.base(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 77)));
        assert_eq!(range.mask(), IpAddr::V4(Ipv4Addr::new(255, 255, 255, 0)));
        assert_eq!(range.prefix(), 24);
        assert!(range.contains(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 0))));
        assert!(!range.contains(IpAddr::V4(Ipv4Addr::new(192, 168, 2, 0))));
    }

    #[test]
    fn test_parse_ipv6() {
        let range = AddressRange::parse("fe80::1/126").unwrap();
        assert_eq!(range.width_bits(), 128);
        assert_eq!(range.host_count(), 4);

        let single = AddressRange::parse("::1").unwrap();
        assert_eq!(single.prefix(), 128);
        assert_eq!(single.host_count(), 1);
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["invalid", "", "192.168.1.0/33", "1.2.3", "-1", "10.0.0.0/"] {
            assert_eq!(
                AddressRange::parse(input),
                Err(TargetError::InvalidInput(input.to_string())),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_canonical_form_reparses_identically() {
        for input in ["3", "10.0.0.1", "192.168.1.77/24", "10.0.0.0/8", "fe80::1/120"] {
            let range = AddressRange::parse(input).unwrap();
            let again: AddressRange = range.to_string().parse().unwrap();
            assert_eq!(range, again, "input {:?}", input);
        }
    }

    #[test]
    fn test_host_count() {
        assert_eq!(AddressRange::parse("10.0.0.0/30").unwrap().host_count(), 4);
        assert_eq!(AddressRange::parse("10.0.0.0/8").unwrap().host_count(), 1 << 24);
        assert_eq!(AddressRange::parse("0.0.0.0/0").unwrap().host_count(), 1 << 32);
    }
}
