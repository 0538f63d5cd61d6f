use anyhow::{bail, Context};
use log::{debug, info};

use crate::cache::{Cache, CacheConfig, CacheHierarchy};
use crate::mem::{FileTrace, MainMemory, SyntheticTrace, TraceSource};
use crate::sim::config::{MemConfig, TraceConfig, TraceMode};
use crate::sim::report::SimSummary;

/// Single-threaded simulation driver: pulls references from the trace one
/// at a time and runs each fully through the hierarchy (and main memory on
/// a full miss) before the next.
pub struct Sim {
    hierarchy: CacheHierarchy,
    memory: MainMemory,
    trace: Box<dyn TraceSource>,
    accesses: u64,
    reads: u64,
    writes: u64,
    hierarchy_hits: u64,
    total_latency: u64,
}

impl Sim {
    pub fn new(
        level_configs: Vec<CacheConfig>,
        mem_config: MemConfig,
        trace: Box<dyn TraceSource>,
    ) -> anyhow::Result<Self> {
        if level_configs.is_empty() {
            bail!("cache hierarchy cannot be empty");
        }
        let mut hierarchy = CacheHierarchy::new();
        for config in level_configs {
            let level = config.level;
            let cache = Cache::new(config)
                .with_context(|| format!("invalid configuration for cache level {}", level))?;
            hierarchy.add_level(cache);
        }
        Ok(Self {
            hierarchy,
            memory: MainMemory::new(mem_config.access_latency),
            trace,
            accesses: 0,
            reads: 0,
            writes: 0,
            hierarchy_hits: 0,
            total_latency: 0,
        })
    }

    /// Build the trace source named by the config.
    pub fn build_trace(config: &TraceConfig) -> anyhow::Result<Box<dyn TraceSource>> {
        match config.mode {
            TraceMode::File => {
                let Some(path) = &config.path else {
                    bail!("trace mode 'file' requires a path");
                };
                Ok(Box::new(FileTrace::open(path)?))
            }
            TraceMode::Synthetic => Ok(Box::new(SyntheticTrace::new(
                config.pattern,
                config.start_address,
                config.end_address,
                config.num_accesses,
                config.stride,
                config.read_ratio,
                config.seed,
            ))),
        }
    }

    /// Drain the trace and return the aggregated summary.
    pub fn run(&mut self, name: &str) -> anyhow::Result<SimSummary> {
        info!("starting run '{}'", name);
        while let Some(access) = self.trace.next_access()? {
            let (mut latency, hit) = self.hierarchy.access(access.address, access.kind);
            if !hit {
                // Full-hierarchy miss, or a no-write-allocate write bypass;
                // either way the reference reaches main memory.
                latency += self.memory.access(access.address, access.kind);
            }

            self.accesses += 1;
            if access.kind.is_write() {
                self.writes += 1;
            } else {
                self.reads += 1;
            }
            if hit {
                self.hierarchy_hits += 1;
            }
            self.total_latency += latency;

            debug!(
                "{} {} -> {} ({} cycles)",
                access.kind.short(),
                access.address,
                if hit { "hit" } else { "miss" },
                latency
            );
        }
        info!(
            "run '{}' complete: {} accesses, {} cycles",
            name, self.accesses, self.total_latency
        );
        Ok(self.summary(name))
    }

    pub fn summary(&self, name: &str) -> SimSummary {
        SimSummary::collect(
            name,
            &self.hierarchy,
            &self.memory,
            self.accesses,
            self.reads,
            self.writes,
            self.hierarchy_hits,
            self.total_latency,
        )
    }

    pub fn hierarchy(&self) -> &CacheHierarchy {
        &self.hierarchy
    }

    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// Clear all simulation state so the same configuration can be run
    /// against another trace.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.hierarchy.reset();
        self.memory.reset();
        self.trace.reset()?;
        self.accesses = 0;
        self.reads = 0;
        self.writes = 0;
        self.hierarchy_hits = 0;
        self.total_latency = 0;
        Ok(())
    }
}
