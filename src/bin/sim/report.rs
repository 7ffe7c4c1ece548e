// Copyright 2026 Tiernet Project. All rights reserved.
// Tiernet Sensor Routing Suite - Simulation Report Types

use serde::Serialize;

use tiernet_engine::{EnergyReading, PacketTrace, SimStats};

/// Machine-readable summary of one simulation run.
#[derive(Debug, Serialize)]
pub struct SimReport {
    pub packets_sent: u32,
    pub delivered: u32,
    pub dropped: u32,
    pub avg_hops: f64,
    pub final_energy: Vec<EnergyReading>,
    pub traces: Vec<PacketTrace>,
}

impl SimReport {
    pub fn new(stats: SimStats, final_energy: Vec<EnergyReading>, traces: Vec<PacketTrace>) -> Self {
        Self {
            packets_sent: stats.delivered + stats.dropped,
            delivered: stats.delivered,
            dropped: stats.dropped,
            avg_hops: stats.avg_hops(),
            final_energy,
            traces,
        }
    }

    /// Plain-text table for interactive runs.
    pub fn print_summary(&self) {
        println!("\n  Packets: {}  delivered: {}  dropped: {}  avg hops: {:.2}",
            self.packets_sent, self.delivered, self.dropped, self.avg_hops);
        println!("\n  {:<6} {:<16} {:>8}", "Tier", "Node", "Energy");
        println!("  {}", "-".repeat(32));
        for reading in &self.final_energy {
            println!(
                "  {:<6} {:<16} {:>8}",
                reading.tier.to_string(),
                reading.addr.to_string(),
                reading.energy
            );
        }
    }
}
