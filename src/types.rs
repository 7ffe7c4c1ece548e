// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

// ─── NodeAddr ────────────────────────────────────────────────────────────────

/// Network address of a sensor node or the gateway.
///
/// The underlying value is an IPv4 address; the routing core only relies on
/// equality, ordering, and hashing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeAddr(pub Ipv4Addr);

impl NodeAddr {
    pub fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(Ipv4Addr::new(a, b, c, d))
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Ipv4Addr> for NodeAddr {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr)
    }
}

impl From<[u8; 4]> for NodeAddr {
    fn from(octets: [u8; 4]) -> Self {
        Self(Ipv4Addr::from(octets))
    }
}

impl FromStr for NodeAddr {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Raised when a raw tier number falls outside the supported 1..=3 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tier {0} is outside the supported range 1..=3")]
pub struct InvalidTier(pub u16);

/// Hop-distance class of a node relative to the sink.
///
/// Tier 1 is adjacent to the gateway, tier 3 holds the outermost leaf
/// sensors. Membership is assigned once at setup and never changes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tier {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::One, Tier::Two, Tier::Three];

    /// The tier one hop closer to the sink. `None` for tier 1, whose next
    /// hop is the gateway itself.
    pub fn next_inward(self) -> Option<Tier> {
        match self {
            Tier::One => None,
            Tier::Two => Some(Tier::One),
            Tier::Three => Some(Tier::Two),
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for Tier {
    type Error = InvalidTier;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            other => Err(InvalidTier(other)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

// ─── Routing events and decisions ────────────────────────────────────────────

/// One unit of routing work, as handed to an engine by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingEvent {
    /// A packet is being generated at the engine's own node.
    Originate { destination: NodeAddr },
    /// A packet arrived at the engine's node for forwarding or local delivery.
    Arrived {
        source: NodeAddr,
        destination: NodeAddr,
    },
}

/// The engine's answer for a single routing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingDecision {
    /// The packet's destination is this node; consume it here.
    LocalDeliver,
    /// Transmit toward `next_hop`, keeping the original addressing intact.
    Forward {
        next_hop: NodeAddr,
        source: NodeAddr,
        destination: NodeAddr,
    },
}

impl RoutingDecision {
    pub fn next_hop(&self) -> Option<NodeAddr> {
        match self {
            RoutingDecision::LocalDeliver => None,
            RoutingDecision::Forward { next_hop, .. } => Some(*next_hop),
        }
    }
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

/// What kind of hop a diagnostic record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopKind {
    Originate,
    Forward,
    Deliver,
}

/// Per-decision diagnostic record emitted to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopRecord {
    /// The node that made the decision.
    pub node: NodeAddr,
    /// That node's tier at decision time.
    pub tier: Tier,
    pub kind: HopKind,
    pub source: NodeAddr,
    pub destination: NodeAddr,
    /// Selected next hop; `None` on local delivery.
    pub next_hop: Option<NodeAddr>,
    /// Tier of the next hop; `None` when the next hop is the gateway or the
    /// packet was delivered locally.
    pub next_tier: Option<Tier>,
    /// Energy left on the deciding node after the hop debit.
    pub remaining_energy: u32,
}

/// One row of a full-ledger energy dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub tier: Tier,
    pub addr: NodeAddr,
    pub energy: u32,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_raw_valid() {
        assert_eq!(Tier::try_from(1u16), Ok(Tier::One));
        assert_eq!(Tier::try_from(2u16), Ok(Tier::Two));
        assert_eq!(Tier::try_from(3u16), Ok(Tier::Three));
    }

    #[test]
    fn tier_from_raw_out_of_range() {
        assert_eq!(Tier::try_from(0u16), Err(InvalidTier(0)));
        assert_eq!(Tier::try_from(4u16), Err(InvalidTier(4)));
        assert_eq!(Tier::try_from(42u16), Err(InvalidTier(42)));
    }

    #[test]
    fn tier_next_inward_chain() {
        assert_eq!(Tier::Three.next_inward(), Some(Tier::Two));
        assert_eq!(Tier::Two.next_inward(), Some(Tier::One));
        assert_eq!(Tier::One.next_inward(), None);
    }

    #[test]
    fn node_addr_parse_and_display() {
        let addr: NodeAddr = "10.1.3.2".parse().expect("valid address");
        assert_eq!(addr, NodeAddr::new(10, 1, 3, 2));
        assert_eq!(addr.to_string(), "10.1.3.2");
    }

    #[test]
    fn decision_next_hop_accessor() {
        let fwd = RoutingDecision::Forward {
            next_hop: NodeAddr::new(10, 1, 3, 5),
            source: NodeAddr::new(10, 1, 3, 8),
            destination: NodeAddr::new(10, 1, 3, 1),
        };
        assert_eq!(fwd.next_hop(), Some(NodeAddr::new(10, 1, 3, 5)));
        assert_eq!(RoutingDecision::LocalDeliver.next_hop(), None);
    }
}
