// ── Address set expansion ──
//
// Turns operator input into concrete IPv4 host addresses: a single
// address for manual registration, or a subnet for discovery scans.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::CoreError;

/// Parse a single dotted-quad IPv4 address.
///
/// Surrounding whitespace is ignored; anything else that is not four
/// dot-separated octets in `0..=255` is rejected. Octets may carry leading
/// zeros (`192.168.001.005`), which are read as decimal.
pub fn parse_address(input: &str) -> Result<Ipv4Addr, CoreError> {
    dotted_quad(input.trim()).ok_or_else(|| CoreError::InvalidAddress {
        input: input.to_owned(),
    })
}

fn dotted_quad(input: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = input.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    parts.next().is_none().then(|| Ipv4Addr::from(octets))
}

/// An IPv4 network in prefix form.
///
/// Host bits of the input are masked off, so `192.168.1.77/24` and
/// `192.168.1.0/24` describe the same subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    network: Ipv4Addr,
    prefix: u8,
}

impl Subnet {
    pub fn new(address: Ipv4Addr, prefix: u8) -> Option<Self> {
        (prefix <= 32).then(|| Self {
            network: Ipv4Addr::from(u32::from(address) & mask(prefix)),
            prefix,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !mask(self.prefix))
    }

    /// Number of addresses [`hosts`](Self::hosts) yields.
    ///
    /// Network and broadcast addresses are excluded for prefixes up to
    /// /30. A /31 is a point-to-point link and yields both addresses; a
    /// /32 yields the single address.
    pub fn host_count(&self) -> u64 {
        let size = 1u64 << (32 - u32::from(self.prefix));
        if self.prefix >= 31 { size } else { size - 2 }
    }

    /// Usable host addresses in ascending order.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let network = u32::from(self.network);
        let broadcast = u32::from(self.broadcast());
        let (first, last) = if self.prefix >= 31 {
            (network, broadcast)
        } else {
            (network + 1, broadcast - 1)
        };
        (first..=last).map(Ipv4Addr::from)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Subnet {
    type Err = CoreError;

    /// Accepts `a.b.c.d/p`, the `a.b.c.` shorthand for a /24, or a bare
    /// address (treated as /32).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = |reason: &str| CoreError::InvalidSubnet {
            input: input.to_owned(),
            reason: reason.to_owned(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty subnet"));
        }

        let (addr_part, prefix) = if let Some((addr, bits)) = trimmed.split_once('/') {
            let prefix = bits
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= 32)
                .ok_or_else(|| invalid("prefix length must be between 0 and 32"))?;
            (addr.trim().to_owned(), prefix)
        } else if let Some(stem) = trimmed.strip_suffix('.') {
            if stem.split('.').count() != 3 {
                return Err(invalid("shorthand must name three octets, e.g. 192.168.1."));
            }
            (format!("{stem}.0"), 24)
        } else {
            (trimmed.to_owned(), 32)
        };

        let address =
            dotted_quad(&addr_part).ok_or_else(|| invalid("not a valid IPv4 address"))?;

        Self::new(address, prefix).ok_or_else(|| invalid("prefix length must be between 0 and 32"))
    }
}

/// Expand subnet input into host addresses, refusing anything with more
/// than `max_hosts` hosts.
pub fn expand_subnet(input: &str, max_hosts: usize) -> Result<Vec<Ipv4Addr>, CoreError> {
    let subnet: Subnet = input.parse()?;
    let count = subnet.host_count();
    let limit = u64::try_from(max_hosts).unwrap_or(u64::MAX);
    if count > limit {
        return Err(CoreError::InvalidSubnet {
            input: input.to_owned(),
            reason: format!("subnet too large: {subnet} has {count} hosts (limit {max_hosts})"),
        });
    }
    Ok(subnet.hosts().collect())
}

fn mask(prefix: u8) -> u32 {
    u32::MAX
        .checked_shl(32 - u32::from(prefix))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NO_LIMIT: usize = usize::MAX;

    #[test]
    fn parses_single_address() {
        assert_eq!(parse_address(" 10.0.0.5 ").unwrap(), Ipv4Addr::new(10, 0, 0, 5));
    }

    #[test]
    fn zero_padded_octets_are_decimal() {
        assert_eq!(
            parse_address("192.168.001.005").unwrap(),
            Ipv4Addr::new(192, 168, 1, 5)
        );
        assert_eq!(
            expand_subnet("010.000.000.008/30", NO_LIMIT).unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 9), Ipv4Addr::new(10, 0, 0, 10)]
        );
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "10.0.0",
            "10.0.0.256",
            "10.0.0.5/24",
            "rig-01",
            "1.2.3.4.5",
            "10..0.5",
            "0010.0.0.5",
            "+10.0.0.5",
        ] {
            let err = parse_address(bad).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidAddress { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn slash_24_excludes_network_and_broadcast() {
        let hosts = expand_subnet("192.168.1.0/24", NO_LIMIT).unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(hosts.last(), Some(&Ipv4Addr::new(192, 168, 1, 254)));
    }

    #[test]
    fn host_bits_are_masked() {
        let subnet: Subnet = "192.168.1.77/24".parse().unwrap();
        assert_eq!(subnet.network(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(subnet.broadcast(), Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn host_count_matches_prefix() {
        for prefix in 16..=30u8 {
            let input = format!("10.20.0.0/{prefix}");
            let hosts = expand_subnet(&input, NO_LIMIT).unwrap();
            let expected = (1usize << (32 - prefix)) - 2;
            assert_eq!(hosts.len(), expected, "prefix /{prefix}");
        }
    }

    #[test]
    fn point_to_point_and_single_host() {
        assert_eq!(
            expand_subnet("10.0.0.4/31", NO_LIMIT).unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 4), Ipv4Addr::new(10, 0, 0, 5)]
        );
        assert_eq!(
            expand_subnet("10.0.0.9/32", NO_LIMIT).unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 9)]
        );
        assert_eq!(
            expand_subnet("10.0.0.9", NO_LIMIT).unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 9)]
        );
    }

    #[test]
    fn trailing_dot_shorthand_is_slash_24() {
        let hosts = expand_subnet("192.168.1.", NO_LIMIT).unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
    }

    #[test]
    fn rejects_malformed_subnets() {
        for bad in ["", "192.168.1.0/33", "192.168.1.0/x", "300.1.1.0/24", "192.168.", "a.b.c."] {
            let err = expand_subnet(bad, NO_LIMIT).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidSubnet { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_oversized_subnets() {
        let err = expand_subnet("10.0.0.0/8", 65_536).unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
        assert!(expand_subnet("10.0.0.0/16", 65_536).is_ok());
    }

    #[test]
    fn slash_zero_does_not_overflow() {
        let subnet: Subnet = "0.0.0.0/0".parse().unwrap();
        assert_eq!(subnet.host_count(), (1u64 << 32) - 2);
        assert_eq!(subnet.broadcast(), Ipv4Addr::BROADCAST);
    }
}
