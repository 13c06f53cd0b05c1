//! Multi-threaded operation mix driven against a [`Target`]

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use anyhow::{anyhow, Result};
use tracing::debug;

use crate::target::{Key, Target, Value};

/// One cache call in the mix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Set,
    Delete,
    Peek,
}

impl Op {
    /// 50% get, 35% set, 10% delete, 5% peek over every run of 20 ops
    pub fn for_step(step: usize) -> Self {
        match step % 20 {
            0..=9 => Op::Get,
            10..=16 => Op::Set,
            17 | 18 => Op::Delete,
            _ => Op::Peek,
        }
    }
}

/// Per-thread operation counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpCounts {
    pub gets: u64,
    pub sets: u64,
    pub deletes: u64,
    pub peeks: u64,
}

impl OpCounts {
    fn record(&mut self, op: Op) {
        match op {
            Op::Get => self.gets += 1,
            Op::Set => self.sets += 1,
            Op::Delete => self.deletes += 1,
            Op::Peek => self.peeks += 1,
        }
    }

    fn merge(&mut self, other: OpCounts) {
        self.gets += other.gets;
        self.sets += other.sets;
        self.deletes += other.deletes;
        self.peeks += other.peeks;
    }

    pub fn total(&self) -> u64 {
        self.gets + self.sets + self.deletes + self.peeks
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Workload {
    pub threads: usize,
    pub ops_per_thread: usize,
    pub keys: usize,
}

#[derive(Debug)]
pub struct Outcome {
    pub counts: OpCounts,
    pub elapsed: Duration,
}

/// Key touched by `thread` at `step`
///
/// Threads walk the key space with different odd strides, so their access
/// orders overlap without lining up.
pub fn key_for(thread: usize, step: usize, keys: usize) -> Key {
    let stride = 2 * thread + 1;
    format!("key:{}", (step * stride + thread * 31) % keys)
}

/// Value written by `thread` at `step`; wraps instead of overflowing
pub fn value_for(thread: usize, step: usize, ops_per_thread: usize) -> Value {
    (thread as u64)
        .wrapping_mul(ops_per_thread as u64)
        .wrapping_add(step as u64)
}

impl Workload {
    pub fn run(&self, target: &Target) -> Result<Outcome> {
        if self.keys == 0 {
            return Err(anyhow!("key space must not be empty"));
        }

        let barrier = Arc::new(Barrier::new(self.threads));
        let start = Instant::now();

        let handles: Vec<_> = (0..self.threads)
            .map(|thread_id| {
                let target = target.clone();
                let barrier = Arc::clone(&barrier);
                let workload = *self;
                thread::spawn(move || workload.run_thread(thread_id, &target, &barrier))
            })
            .collect();

        let mut counts = OpCounts::default();
        for handle in handles {
            let thread_counts = handle
                .join()
                .map_err(|_| anyhow!("worker thread panicked"))??;
            counts.merge(thread_counts);
        }

        Ok(Outcome {
            counts,
            elapsed: start.elapsed(),
        })
    }

    fn run_thread(&self, thread_id: usize, target: &Target, barrier: &Barrier) -> Result<OpCounts> {
        let cache = target.cache();
        let mut counts = OpCounts::default();

        barrier.wait();
        for step in 0..self.ops_per_thread {
            let key = key_for(thread_id, step, self.keys);
            let op = Op::for_step(step + thread_id);
            match op {
                Op::Get => {
                    let _ = cache.get(&key);
                }
                Op::Set => cache.set(key, value_for(thread_id, step, self.ops_per_thread))?,
                Op::Delete => cache.delete(&key),
                Op::Peek => {
                    let _ = target.peek(&key);
                }
            }
            counts.record(op);
        }

        debug!(thread_id, ops = counts.total(), "worker finished");
        Ok(counts)
    }
}
