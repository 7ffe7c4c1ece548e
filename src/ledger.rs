// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite - Energy Ledger

//! Per-tier energy accounting.
//!
//! Single source of truth for which tier every node belongs to and how much
//! energy it has left. Tier membership is exclusive by construction: one map
//! from address to record, plus a registration-order index per tier so that
//! "highest energy" ties resolve to the first-registered node.

use std::collections::HashMap;

use crate::types::{EnergyReading, NodeAddr, Tier};

/// Fixed energy cost charged to a node for every hop it participates in.
pub const HOP_DEBIT: u32 = 10;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from ledger mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("address {0} is already registered")]
    DuplicateAddress(NodeAddr),

    #[error("address {0} is not registered in any tier")]
    UnknownAddress(NodeAddr),
}

// ---------------------------------------------------------------------------
// EnergyLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeRecord {
    tier: Tier,
    energy: u32,
}

/// Tier membership and remaining energy for every registered node.
///
/// Populated once during topology setup via [`register`](Self::register),
/// then mutated only through hop debits for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct EnergyLedger {
    nodes: HashMap<NodeAddr, NodeRecord>,
    /// Registration order per tier, indexed by `tier as usize - 1`.
    tier_order: [Vec<NodeAddr>; 3],
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node in a tier with its initial energy budget.
    ///
    /// Registering the same address twice is rejected, whichever tier the
    /// second registration names: membership is exclusive for the lifetime
    /// of the run.
    pub fn register(
        &mut self,
        tier: Tier,
        addr: NodeAddr,
        energy: u32,
    ) -> Result<(), LedgerError> {
        if self.nodes.contains_key(&addr) {
            return Err(LedgerError::DuplicateAddress(addr));
        }
        self.nodes.insert(addr, NodeRecord { tier, energy });
        self.tier_order[Self::order_index(tier)].push(addr);
        tracing::info!(%tier, node = %addr, energy, "registered node");
        Ok(())
    }

    /// The tier a node belongs to, if it is registered at all.
    pub fn tier_of(&self, addr: NodeAddr) -> Option<Tier> {
        self.nodes.get(&addr).map(|r| r.tier)
    }

    /// Remaining energy of a node, if registered.
    pub fn energy_of(&self, addr: NodeAddr) -> Option<u32> {
        self.nodes.get(&addr).map(|r| r.energy)
    }

    /// The node with the strictly greatest remaining energy in `tier`.
    ///
    /// Scans in registration order with a strict `>` comparison, so on an
    /// exact tie the first-registered node wins and keeps winning until
    /// something overtakes it. Returns `None` when the tier has no
    /// registered node with energy left: a fully drained tier offers no
    /// viable next hop.
    pub fn highest_energy_in(&self, tier: Tier) -> Option<NodeAddr> {
        let mut best: Option<NodeAddr> = None;
        let mut best_energy = 0u32;
        for &addr in &self.tier_order[Self::order_index(tier)] {
            let energy = self.nodes[&addr].energy;
            if energy > best_energy {
                best = Some(addr);
                best_energy = energy;
            }
        }
        best
    }

    /// Charge a node the fixed per-hop debit, clamping at zero.
    ///
    /// Returns the remaining energy after the debit.
    pub fn debit_transit_hop(&mut self, addr: NodeAddr) -> Result<u32, LedgerError> {
        let record = self
            .nodes
            .get_mut(&addr)
            .ok_or(LedgerError::UnknownAddress(addr))?;
        record.energy = record.energy.saturating_sub(HOP_DEBIT);
        Ok(record.energy)
    }

    /// Read-only dump of every node's remaining energy, ordered tier 1
    /// through tier 3 and by registration order within each tier.
    pub fn snapshot(&self) -> Vec<EnergyReading> {
        let mut readings = Vec::with_capacity(self.nodes.len());
        for tier in Tier::ALL {
            for &addr in &self.tier_order[Self::order_index(tier)] {
                readings.push(EnergyReading {
                    tier,
                    addr,
                    energy: self.nodes[&addr].energy,
                });
            }
        }
        readings
    }

    /// Addresses registered in `tier`, in registration order.
    pub fn members(&self, tier: Tier) -> &[NodeAddr] {
        &self.tier_order[Self::order_index(tier)]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn order_index(tier: Tier) -> usize {
        tier.as_u16() as usize - 1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
