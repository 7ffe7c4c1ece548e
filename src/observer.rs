// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite - Decision Observer

//! Per-decision diagnostics.
//!
//! Every routing decision produces exactly one [`HopRecord`] plus a full
//! energy snapshot, delivered synchronously after the ledger mutation.
//! Observers can never fail a routing decision.

use crate::types::{EnergyReading, HopRecord};

/// Receives one callback per routing decision.
pub trait RouteObserver {
    fn on_decision(&mut self, record: &HopRecord, energy: &[EnergyReading]);
}

/// Accumulates records and snapshots for later inspection.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Vec<HopRecord>,
    snapshots: Vec<Vec<EnergyReading>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[HopRecord] {
        &self.records
    }

    /// Energy snapshot taken after the most recent decision.
    pub fn last_snapshot(&self) -> Option<&[EnergyReading]> {
        self.snapshots.last().map(Vec::as_slice)
    }

    pub fn decision_count(&self) -> usize {
        self.records.len()
    }
}

impl RouteObserver for RecordingObserver {
    fn on_decision(&mut self, record: &HopRecord, energy: &[EnergyReading]) {
        self.records.push(*record);
        self.snapshots.push(energy.to_vec());
    }
}
