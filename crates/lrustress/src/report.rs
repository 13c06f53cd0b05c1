//! End-of-run summary, as text or JSON

use serde::Serialize;

use crate::target::Target;
use crate::workload::{Outcome, Workload};

#[derive(Debug, Serialize)]
pub struct Report {
    pub cache: &'static str,
    pub capacity: usize,
    pub threads: usize,
    pub keys: usize,
    pub operations: u64,
    pub elapsed_ms: u64,
    pub ops_per_sec: f64,
    pub resident: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub inserts: u64,
    pub updates: u64,
    pub evictions: u64,
    pub deletes: u64,
}

impl Report {
    pub fn new(target: &Target, workload: &Workload, outcome: &Outcome) -> Self {
        let stats = target.stats();
        let operations = outcome.counts.total();
        let secs = outcome.elapsed.as_secs_f64();

        Self {
            cache: target.kind(),
            capacity: target.capacity(),
            threads: workload.threads,
            keys: workload.keys,
            operations,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            ops_per_sec: if secs > 0.0 { operations as f64 / secs } else { 0.0 },
            resident: target.cache().count(),
            hits: stats.hits,
            misses: stats.misses,
            hit_ratio: stats.hit_ratio(),
            inserts: stats.inserts,
            updates: stats.updates,
            evictions: stats.evictions,
            deletes: stats.deletes,
        }
    }

    pub fn print_text(&self) {
        println!("\n📊 LRU STRESS RESULTS ({} cache)", self.cache);
        println!("   Capacity:     {} entries", self.capacity);
        println!("   Resident:     {} entries", self.resident);
        println!("   Threads:      {}", self.threads);
        println!("   Key space:    {}", self.keys);
        println!(
            "   Operations:   {} in {} ms ({:.0} ops/sec)",
            self.operations, self.elapsed_ms, self.ops_per_sec
        );
        println!(
            "   Hits/Misses:  {}/{} ({:.1}% hit rate)",
            self.hits,
            self.misses,
            self.hit_ratio * 100.0
        );
        println!(
            "   Inserts:      {} ({} updates, {} evictions, {} deletes)",
            self.inserts, self.updates, self.evictions, self.deletes
        );
        println!("   Invariants:   OK\n");
    }
}
