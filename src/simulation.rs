// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite - Mesh Simulation Harness

//! Drives per-node engines over a configured topology.
//!
//! The harness plays the role of the surrounding network stack: it builds
//! one shared ledger and one engine per node, then walks each packet hop by
//! hop, feeding every arrival back into the next node's engine until the
//! packet reaches the gateway, is delivered locally, or is dropped on a
//! no-route outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::engine::{RouteEngine, RouteError};
use crate::ledger::{EnergyLedger, LedgerError};
use crate::types::{EnergyReading, NodeAddr, RoutingDecision, Tier};

/// Walk guard: a packet visiting more nodes than this is considered stuck.
/// Three tiers plus the gateway never legitimately exceed it.
const MAX_HOPS: usize = 16;

// ---------------------------------------------------------------------------
// Topology configuration
// ---------------------------------------------------------------------------

/// One node's place in the network, as raw setup input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeSpec {
    pub tier: u16,
    pub addr: NodeAddr,
    pub energy: u32,
}

/// Static tier/energy baseline plus the gateway address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub gateway: NodeAddr,
    pub nodes: Vec<NodeSpec>,
}

impl TopologyConfig {
    /// The nine-node reference layout: three tiers of three, energies
    /// 140/120/100 from the innermost tier outward, gateway at 10.1.3.1.
    pub fn reference() -> Self {
        let mut nodes = Vec::new();
        for (tier, base, energy) in [(1u16, 2u8, 140u32), (2, 5, 120), (3, 8, 100)] {
            for offset in 0..3u8 {
                nodes.push(NodeSpec {
                    tier,
                    addr: NodeAddr::new(10, 1, 3, base + offset),
                    energy,
                });
            }
        }
        Self {
            gateway: NodeAddr::new(10, 1, 3, 1),
            nodes,
        }
    }
}

/// Errors raised while building a simulation from raw configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    InvalidTier(#[from] crate::types::InvalidTier),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("node {0} shadows the gateway address")]
    NodeShadowsGateway(NodeAddr),
}

// ---------------------------------------------------------------------------
// Packet traces
// ---------------------------------------------------------------------------

/// How a packet's walk through the mesh ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketOutcome {
    /// Reached the sink.
    DeliveredToGateway,
    /// Consumed by the sensor node it was addressed to.
    DeliveredLocal(NodeAddr),
    /// No viable route; the packet was not transmitted further.
    Dropped { reason: String },
}

/// Full record of one packet's journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketTrace {
    pub origin: NodeAddr,
    pub destination: NodeAddr,
    /// Every node the packet touched, origin first.
    pub route: Vec<NodeAddr>,
    pub outcome: PacketOutcome,
}

impl PacketTrace {
    pub fn delivered(&self) -> bool {
        !matches!(self.outcome, PacketOutcome::Dropped { .. })
    }

    /// Number of transmissions, i.e. route length minus the origin.
    pub fn hop_count(&self) -> usize {
        self.route.len().saturating_sub(1)
    }
}

/// Aggregate counters across all packets sent so far.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimStats {
    pub delivered: u32,
    pub dropped: u32,
    pub total_hops: u64,
}

impl SimStats {
    pub fn avg_hops(&self) -> f64 {
        if self.delivered == 0 {
            0.0
        } else {
            self.total_hops as f64 / self.delivered as f64
        }
    }
}

// ---------------------------------------------------------------------------
// MeshSimulation
// ---------------------------------------------------------------------------

/// A whole sensor network: shared ledger, one engine per node, counters.
pub struct MeshSimulation {
    ledger: Arc<Mutex<EnergyLedger>>,
    engines: HashMap<NodeAddr, RouteEngine>,
    gateway: NodeAddr,
    stats: SimStats,
}

impl MeshSimulation {
    /// Populate the ledger and bind one engine per configured node.
    pub fn new(config: &TopologyConfig) -> Result<Self, SetupError> {
        let mut ledger = EnergyLedger::new();
        for spec in &config.nodes {
            if spec.addr == config.gateway {
                return Err(SetupError::NodeShadowsGateway(spec.addr));
            }
            let tier = Tier::try_from(spec.tier)?;
            ledger.register(tier, spec.addr, spec.energy)?;
        }

        let ledger = Arc::new(Mutex::new(ledger));
        let engines = config
            .nodes
            .iter()
            .map(|spec| {
                (
                    spec.addr,
                    RouteEngine::new(spec.addr, config.gateway, ledger.clone()),
                )
            })
            .collect();

        Ok(Self {
            ledger,
            engines,
            gateway: config.gateway,
            stats: SimStats::default(),
        })
    }

    pub fn gateway(&self) -> NodeAddr {
        self.gateway
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn snapshot(&self) -> Vec<EnergyReading> {
        self.ledger.lock().expect("energy ledger mutex poisoned").snapshot()
    }

    pub fn energy_of(&self, addr: NodeAddr) -> Option<u32> {
        self.ledger
            .lock()
            .expect("energy ledger mutex poisoned")
            .energy_of(addr)
    }

    /// Originate a packet at `origin` and walk it until delivery or drop.
    pub fn send_packet(&mut self, origin: NodeAddr, destination: NodeAddr) -> PacketTrace {
        let mut route = vec![origin];

        let first = match self.engines.get_mut(&origin) {
            Some(engine) => engine.originate(destination),
            None => Err(RouteError::UnknownAddress(origin)),
        };
        let mut decision = match first {
            Ok(d) => d,
            Err(err) => return self.finish_dropped(origin, destination, route, err),
        };

        loop {
            match decision {
                RoutingDecision::LocalDeliver => {
                    let node = *route.last().expect("route starts with the origin");
                    return self.finish_delivered(
                        origin,
                        destination,
                        route,
                        PacketOutcome::DeliveredLocal(node),
                    );
                }
                RoutingDecision::Forward {
                    next_hop,
                    source,
                    destination: dest,
                } => {
                    route.push(next_hop);
                    if next_hop == self.gateway {
                        return self.finish_delivered(
                            origin,
                            destination,
                            route,
                            PacketOutcome::DeliveredToGateway,
                        );
                    }
                    if route.len() > MAX_HOPS {
                        tracing::warn!(%origin, %destination, "hop guard tripped, dropping packet");
                        self.stats.dropped += 1;
                        return Self::finish(
                            origin,
                            destination,
                            route,
                            PacketOutcome::Dropped {
                                reason: format!("exceeded {MAX_HOPS} hops"),
                            },
                        );
                    }

                    let next = match self.engines.get_mut(&next_hop) {
                        Some(engine) => engine.forward(source, dest),
                        None => Err(RouteError::UnknownAddress(next_hop)),
                    };
                    decision = match next {
                        Ok(d) => d,
                        Err(err) => {
                            return self.finish_dropped(origin, destination, route, err)
                        }
                    };
                }
            }
        }
    }

    fn finish_delivered(
        &mut self,
        origin: NodeAddr,
        destination: NodeAddr,
        route: Vec<NodeAddr>,
        outcome: PacketOutcome,
    ) -> PacketTrace {
        self.stats.delivered += 1;
        self.stats.total_hops += route.len().saturating_sub(1) as u64;
        Self::finish(origin, destination, route, outcome)
    }

    fn finish_dropped(
        &mut self,
        origin: NodeAddr,
        destination: NodeAddr,
        route: Vec<NodeAddr>,
        err: RouteError,
    ) -> PacketTrace {
        tracing::warn!(%origin, %destination, error = %err, "packet dropped");
        self.stats.dropped += 1;
        Self::finish(
            origin,
            destination,
            route,
            PacketOutcome::Dropped {
                reason: err.to_string(),
            },
        )
    }

    fn finish(
        origin: NodeAddr,
        destination: NodeAddr,
        route: Vec<NodeAddr>,
        outcome: PacketOutcome,
    ) -> PacketTrace {
        PacketTrace {
            origin,
            destination,
            route,
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> NodeAddr {
        NodeAddr::new(10, 1, 3, last)
    }

    #[test]
    fn reference_topology_builds() {
        let sim = MeshSimulation::new(&TopologyConfig::reference()).expect("valid config");
        assert_eq!(sim.snapshot().len(), 9);
        assert_eq!(sim.gateway(), addr(1));
    }

    #[test]
    fn invalid_tier_in_config_rejected() {
        let config = TopologyConfig {
            gateway: addr(1),
            nodes: vec![NodeSpec {
                tier: 4,
                addr: addr(2),
                energy: 100,
            }],
        };
        let err = MeshSimulation::new(&config).err().expect("must fail");
        assert!(matches!(err, SetupError::InvalidTier(_)), "got {err:?}");
    }

    #[test]
    fn duplicate_address_in_config_rejected() {
        let config = TopologyConfig {
            gateway: addr(1),
            nodes: vec![
                NodeSpec { tier: 1, addr: addr(2), energy: 140 },
                NodeSpec { tier: 2, addr: addr(2), energy: 120 },
            ],
        };
        let err = MeshSimulation::new(&config).err().expect("must fail");
        assert!(matches!(err, SetupError::Ledger(_)), "got {err:?}");
    }

    #[test]
    fn gateway_cannot_be_registered_as_node() {
        let config = TopologyConfig {
            gateway: addr(1),
            nodes: vec![NodeSpec { tier: 1, addr: addr(1), energy: 140 }],
        };
        let err = MeshSimulation::new(&config).err().expect("must fail");
        assert_eq!(err, SetupError::NodeShadowsGateway(addr(1)));
    }

    #[test]
    fn stats_track_delivery_and_hops() {
        let mut sim = MeshSimulation::new(&TopologyConfig::reference()).expect("valid");
        let trace = sim.send_packet(addr(8), addr(1));

        assert!(trace.delivered());
        assert_eq!(trace.hop_count(), 3);
        let stats = sim.stats();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.total_hops, 3);
        assert!((stats.avg_hops() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_origin_counts_as_dropped() {
        let mut sim = MeshSimulation::new(&TopologyConfig::reference()).expect("valid");
        let trace = sim.send_packet(addr(200), addr(1));

        assert!(!trace.delivered());
        assert_eq!(sim.stats().dropped, 1);
    }
}
