// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite

//! Energy-aware hierarchical routing for three-tier sensor networks.
//!
//! Sensor nodes sit in three concentric tiers around a fixed gateway. Every
//! packet is routed one tier inward, always through the node with the most
//! remaining energy in the tier below, and every hop debits the forwarding
//! node's energy so that load drifts away from depleted nodes.
//!
//! The crate splits into the [`ledger`] (tier membership + energy
//! accounting), the per-node [`engine`] (next-hop decisions), the
//! [`observer`] callback surface for per-decision diagnostics, and a
//! [`simulation`] harness that drives a whole mesh packet by packet.

pub mod engine;
pub mod ledger;
pub mod observer;
pub mod simulation;
pub mod types;

pub use engine::{RouteEngine, RouteError};
pub use ledger::{EnergyLedger, LedgerError, HOP_DEBIT};
pub use observer::{RecordingObserver, RouteObserver};
pub use simulation::{
    MeshSimulation, NodeSpec, PacketOutcome, PacketTrace, SetupError, SimStats, TopologyConfig,
};
pub use types::{
    EnergyReading, HopKind, HopRecord, InvalidTier, NodeAddr, RoutingDecision, RoutingEvent,
    Tier,
};
