// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite - Route Decision Engine

//! Energy-aware next-hop selection.
//!
//! One engine is bound to one node's address for the lifetime of the run.
//! Every decision routes a packet one tier closer to the sink, preferring
//! the node with the most remaining energy in the tier below, and debits
//! the deciding node's energy. Tier 1 nodes hand packets straight to the
//! gateway.
//!
//! All per-node engines share a single ledger behind one mutex; each
//! decision is an atomic read-modify-write against it. Per-tier locking
//! would buy nothing since every decision reads a tier and debits a node.

use std::sync::{Arc, Mutex};

use crate::ledger::EnergyLedger;
use crate::observer::RouteObserver;
use crate::types::{
    EnergyReading, HopKind, HopRecord, NodeAddr, RoutingDecision, RoutingEvent, Tier,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// "No route" outcomes. A caller receiving one must not transmit; dropping
/// or re-queuing the packet is the event source's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("node {0} is not registered in any tier")]
    UnknownAddress(NodeAddr),

    #[error("no candidate with remaining energy in tier {0}")]
    NoCandidate(Tier),
}

// ---------------------------------------------------------------------------
// RouteEngine
// ---------------------------------------------------------------------------

/// Per-node routing decision engine.
pub struct RouteEngine {
    local: NodeAddr,
    gateway: NodeAddr,
    ledger: Arc<Mutex<EnergyLedger>>,
    observer: Option<Arc<Mutex<dyn RouteObserver + Send>>>,
}

impl RouteEngine {
    /// Bind an engine to the node at `local`, sharing `ledger` with every
    /// other engine in the network.
    pub fn new(local: NodeAddr, gateway: NodeAddr, ledger: Arc<Mutex<EnergyLedger>>) -> Self {
        Self {
            local,
            gateway,
            ledger,
            observer: None,
        }
    }

    /// Attach a diagnostic observer, invoked once per decision.
    pub fn set_observer(&mut self, observer: Arc<Mutex<dyn RouteObserver + Send>>) {
        self.observer = Some(observer);
    }

    pub fn local_addr(&self) -> NodeAddr {
        self.local
    }

    pub fn gateway_addr(&self) -> NodeAddr {
        self.gateway
    }

    /// Dispatch a routing event to the matching operation.
    pub fn handle(&mut self, event: RoutingEvent) -> Result<RoutingDecision, RouteError> {
        match event {
            RoutingEvent::Originate { destination } => self.originate(destination),
            RoutingEvent::Arrived {
                source,
                destination,
            } => self.forward(source, destination),
        }
    }

    /// Route a packet generated at this node.
    pub fn originate(&mut self, destination: NodeAddr) -> Result<RoutingDecision, RouteError> {
        let (record, snapshot, decision) = {
            let mut ledger = self.ledger.lock().expect("energy ledger mutex poisoned");
            let (tier, next_hop, next_tier) = self.select_next_hop(&ledger)?;
            let remaining = ledger
                .debit_transit_hop(self.local)
                .expect("local address registered: tier lookup succeeded");

            let record = HopRecord {
                node: self.local,
                tier,
                kind: HopKind::Originate,
                source: self.local,
                destination,
                next_hop: Some(next_hop),
                next_tier,
                remaining_energy: remaining,
            };
            let decision = RoutingDecision::Forward {
                next_hop,
                source: self.local,
                destination,
            };
            (record, ledger.snapshot(), decision)
        };

        tracing::info!(
            node = %self.local,
            tier = %record.tier,
            dest = %destination,
            next_hop = %record.next_hop.expect("forward record has a next hop"),
            "packet originated"
        );
        self.notify(&record, &snapshot);
        Ok(decision)
    }

    /// Route a packet that arrived at this node from elsewhere.
    ///
    /// Delivers locally when the packet is addressed to this node (still
    /// paying the hop debit); otherwise forwards exactly like
    /// [`originate`](Self::originate) but preserving the packet's original
    /// source and destination.
    pub fn forward(
        &mut self,
        source: NodeAddr,
        destination: NodeAddr,
    ) -> Result<RoutingDecision, RouteError> {
        if destination == self.local {
            let (record, snapshot) = {
                let mut ledger = self.ledger.lock().expect("energy ledger mutex poisoned");
                let tier = ledger
                    .tier_of(self.local)
                    .ok_or(RouteError::UnknownAddress(self.local))?;
                let remaining = ledger
                    .debit_transit_hop(self.local)
                    .expect("local address registered: tier lookup succeeded");

                let record = HopRecord {
                    node: self.local,
                    tier,
                    kind: HopKind::Deliver,
                    source,
                    destination,
                    next_hop: None,
                    next_tier: None,
                    remaining_energy: remaining,
                };
                (record, ledger.snapshot())
            };

            tracing::info!(node = %self.local, src = %source, "packet reached destination");
            self.notify(&record, &snapshot);
            return Ok(RoutingDecision::LocalDeliver);
        }

        let (record, snapshot, decision) = {
            let mut ledger = self.ledger.lock().expect("energy ledger mutex poisoned");
            let (tier, next_hop, next_tier) = self.select_next_hop(&ledger)?;
            let remaining = ledger
                .debit_transit_hop(self.local)
                .expect("local address registered: tier lookup succeeded");

            let record = HopRecord {
                node: self.local,
                tier,
                kind: HopKind::Forward,
                source,
                destination,
                next_hop: Some(next_hop),
                next_tier,
                remaining_energy: remaining,
            };
            let decision = RoutingDecision::Forward {
                next_hop,
                source,
                destination,
            };
            (record, ledger.snapshot(), decision)
        };

        tracing::info!(
            node = %self.local,
            src = %source,
            dest = %destination,
            next_hop = %record.next_hop.expect("forward record has a next hop"),
            "forwarding packet"
        );
        self.notify(&record, &snapshot);
        Ok(decision)
    }

    /// Classify this node's tier and pick where the packet goes next:
    /// the gateway from tier 1, otherwise the highest-energy node one tier
    /// inward.
    fn select_next_hop(
        &self,
        ledger: &EnergyLedger,
    ) -> Result<(Tier, NodeAddr, Option<Tier>), RouteError> {
        let tier = ledger
            .tier_of(self.local)
            .ok_or(RouteError::UnknownAddress(self.local))?;
        match tier.next_inward() {
            None => Ok((tier, self.gateway, None)),
            Some(inward) => {
                let next_hop = ledger
                    .highest_energy_in(inward)
                    .ok_or(RouteError::NoCandidate(inward))?;
                Ok((tier, next_hop, Some(inward)))
            }
        }
    }

    fn notify(&self, record: &HopRecord, snapshot: &[EnergyReading]) {
        if let Some(observer) = &self.observer {
            observer
                .lock()
                .expect("route observer mutex poisoned")
                .on_decision(record, snapshot);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;

    const GATEWAY: NodeAddr = NodeAddr(std::net::Ipv4Addr::new(10, 1, 3, 1));

    fn addr(last: u8) -> NodeAddr {
        NodeAddr::new(10, 1, 3, last)
    }

    fn shared(ledger: EnergyLedger) -> Arc<Mutex<EnergyLedger>> {
        Arc::new(Mutex::new(ledger))
    }

    fn three_tier_ledger() -> EnergyLedger {
        let mut ledger = EnergyLedger::new();
        ledger.register(Tier::One, addr(2), 140).expect("t1");
        ledger.register(Tier::Two, addr(5), 120).expect("t2 high");
        ledger.register(Tier::Two, addr(6), 90).expect("t2 low");
        ledger.register(Tier::Three, addr(8), 100).expect("t3");
        ledger
    }

    #[test]
    fn originate_from_tier_one_goes_to_gateway() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(2), GATEWAY, ledger.clone());

        let decision = engine.originate(GATEWAY).expect("tier 1 always routes");
        assert_eq!(decision.next_hop(), Some(GATEWAY));

        // Debited once
        let energy = ledger.lock().expect("lock").energy_of(addr(2));
        assert_eq!(energy, Some(130));
    }

    #[test]
    fn originate_picks_highest_energy_in_tier_below() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(8), GATEWAY, ledger.clone());

        let decision = engine.originate(GATEWAY).expect("tier 2 has candidates");
        // 120 > 90, so 10.1.3.5 wins
        assert_eq!(decision.next_hop(), Some(addr(5)));
        assert_eq!(ledger.lock().expect("lock").energy_of(addr(8)), Some(90));
    }

    #[test]
    fn originate_preserves_source_and_destination() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(8), GATEWAY, ledger);

        let decision = engine.originate(GATEWAY).expect("routes");
        match decision {
            RoutingDecision::Forward {
                source,
                destination,
                ..
            } => {
                assert_eq!(source, addr(8));
                assert_eq!(destination, GATEWAY);
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn originate_unregistered_node_is_no_route() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(99), GATEWAY, ledger);

        let err = engine.originate(GATEWAY);
        assert_eq!(err, Err(RouteError::UnknownAddress(addr(99))));
    }

    #[test]
    fn originate_into_drained_tier_is_no_route() {
        let mut ledger = EnergyLedger::new();
        ledger.register(Tier::Two, addr(5), 0).expect("drained t2");
        ledger.register(Tier::Three, addr(8), 100).expect("t3");
        let mut engine = RouteEngine::new(addr(8), GATEWAY, shared(ledger));

        let err = engine.originate(GATEWAY);
        assert_eq!(err, Err(RouteError::NoCandidate(Tier::Two)));
    }

    #[test]
    fn forward_to_self_delivers_locally_and_debits_once() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(5), GATEWAY, ledger.clone());

        let decision = engine
            .forward(addr(8), addr(5))
            .expect("local delivery routes");
        assert_eq!(decision, RoutingDecision::LocalDeliver);
        assert_eq!(ledger.lock().expect("lock").energy_of(addr(5)), Some(110));
    }

    #[test]
    fn forward_keeps_original_addressing() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(5), GATEWAY, ledger);

        let decision = engine.forward(addr(8), GATEWAY).expect("tier 2 routes");
        match decision {
            RoutingDecision::Forward {
                next_hop,
                source,
                destination,
            } => {
                assert_eq!(next_hop, addr(2));
                assert_eq!(source, addr(8), "source must not be rewritten");
                assert_eq!(destination, GATEWAY);
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn handle_dispatches_events() {
        let ledger = shared(three_tier_ledger());
        let mut engine = RouteEngine::new(addr(8), GATEWAY, ledger);

        let originated = engine
            .handle(RoutingEvent::Originate {
                destination: GATEWAY,
            })
            .expect("originate");
        assert_eq!(originated.next_hop(), Some(addr(5)));

        let forwarded = engine
            .handle(RoutingEvent::Arrived {
                source: addr(9),
                destination: GATEWAY,
            })
            .expect("forward");
        assert!(matches!(forwarded, RoutingDecision::Forward { .. }));
    }

    #[test]
    fn observer_sees_one_record_per_decision() {
        let ledger = shared(three_tier_ledger());
        let observer = Arc::new(Mutex::new(RecordingObserver::new()));
        let mut engine = RouteEngine::new(addr(8), GATEWAY, ledger);
        engine.set_observer(observer.clone());

        engine.originate(GATEWAY).expect("first decision");
        engine.forward(addr(9), GATEWAY).expect("second decision");

        let observer = observer.lock().expect("lock");
        assert_eq!(observer.decision_count(), 2);

        let first = observer.records()[0];
        assert_eq!(first.kind, HopKind::Originate);
        assert_eq!(first.tier, Tier::Three);
        assert_eq!(first.next_tier, Some(Tier::Two));
        assert_eq!(first.remaining_energy, 90);

        // Snapshot reflects state after the debit
        let snapshot = observer.last_snapshot().expect("snapshot recorded");
        let own = snapshot
            .iter()
            .find(|r| r.addr == addr(8))
            .expect("own node in snapshot");
        assert_eq!(own.energy, 80);
    }

    #[test]
    fn no_route_error_does_not_invoke_observer() {
        let ledger = shared(three_tier_ledger());
        let observer = Arc::new(Mutex::new(RecordingObserver::new()));
        let mut engine = RouteEngine::new(addr(99), GATEWAY, ledger);
        engine.set_observer(observer.clone());

        let _ = engine.originate(GATEWAY);
        assert_eq!(observer.lock().expect("lock").decision_count(), 0);
    }

    #[test]
    fn alternating_next_hops_as_energy_crosses() {
        let mut ledger = EnergyLedger::new();
        ledger.register(Tier::Two, addr(5), 120).expect("b");
        ledger.register(Tier::Two, addr(6), 115).expect("c");
        ledger.register(Tier::Three, addr(8), 500).expect("origin");
        let shared = shared(ledger);
        let mut engine = RouteEngine::new(addr(8), GATEWAY, shared.clone());

        // 120 vs 115 → b; b drops to 110
        let first = engine.originate(GATEWAY).expect("routes");
        assert_eq!(first.next_hop(), Some(addr(5)));
        shared
            .lock()
            .expect("lock")
            .debit_transit_hop(addr(5))
            .expect("b registered");

        // 110 vs 115 → c
        let second = engine.originate(GATEWAY).expect("routes");
        assert_eq!(second.next_hop(), Some(addr(6)));
    }
}
