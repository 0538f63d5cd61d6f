use std::fmt;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::cache::{CacheHierarchy, LevelStats};
use crate::mem::MainMemory;

/// AMAT contribution of one hierarchy level (or main memory): its latency
/// weighted by the probability a reference reaches it.
#[derive(Debug, Clone, Serialize)]
pub struct AmatContribution {
    pub name: String,
    pub cycles: f64,
}

/// Aggregated results of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    pub name: String,
    pub accesses: u64,
    pub reads: u64,
    pub writes: u64,
    pub hierarchy_hits: u64,
    pub total_latency: u64,
    pub average_latency: f64,
    pub levels: Vec<LevelStats>,
    pub memory_reads: u64,
    pub memory_writes: u64,
    pub amat: f64,
    pub amat_breakdown: Vec<AmatContribution>,
}

impl SimSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn collect(
        name: &str,
        hierarchy: &CacheHierarchy,
        memory: &MainMemory,
        accesses: u64,
        reads: u64,
        writes: u64,
        hierarchy_hits: u64,
        total_latency: u64,
    ) -> Self {
        let levels = hierarchy.stats();
        let (amat, amat_breakdown) = amat(hierarchy, memory);
        let average_latency = if accesses == 0 {
            0.0
        } else {
            total_latency as f64 / accesses as f64
        };
        Self {
            name: name.to_string(),
            accesses,
            reads,
            writes,
            hierarchy_hits,
            total_latency,
            average_latency,
            levels,
            memory_reads: memory.reads(),
            memory_writes: memory.writes(),
            amat,
            amat_breakdown,
        }
    }

    /// Per-level statistics as CSV rows.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("cannot create CSV file {}", path.display()))?;
        writer.write_record(["level", "hits", "misses", "hit_rate"])?;
        for stats in &self.levels {
            writer.write_record([
                format!("L{}", stats.level + 1),
                stats.hits.to_string(),
                stats.misses.to_string(),
                format!("{:.6}", stats.hit_rate),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Full summary as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("cannot create JSON file {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl fmt::Display for SimSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.name)?;
        writeln!(
            f,
            "accesses: {} ({} reads, {} writes)",
            self.accesses, self.reads, self.writes
        )?;
        for stats in &self.levels {
            writeln!(
                f,
                "L{}: {} hits, {} misses, hit rate {:.2}%",
                stats.level + 1,
                stats.hits,
                stats.misses,
                stats.hit_rate * 100.0
            )?;
        }
        writeln!(
            f,
            "memory: {} reads, {} writes",
            self.memory_reads, self.memory_writes
        )?;
        for contribution in &self.amat_breakdown {
            writeln!(f, "{}: {:.3} cycles", contribution.name, contribution.cycles)?;
        }
        writeln!(f, "AMAT: {:.3} cycles", self.amat)?;
        write!(f, "average observed latency: {:.3} cycles", self.average_latency)
    }
}

/// Average memory access time: the L1 latency is always paid, each further
/// level contributes its latency weighted by the probability every level
/// above it missed, and main memory catches the rest.
pub fn amat(hierarchy: &CacheHierarchy, memory: &MainMemory) -> (f64, Vec<AmatContribution>) {
    let stats = hierarchy.stats();
    let mut breakdown = Vec::with_capacity(stats.len() + 1);

    let Some(l1) = hierarchy.level(0) else {
        return (memory.access_latency() as f64, breakdown);
    };

    let l1_latency = l1.config().access_latency as f64;
    let mut total = l1_latency;
    breakdown.push(AmatContribution {
        name: "L1".to_string(),
        cycles: l1_latency,
    });

    // Probability a reference reaches the next level down.
    let mut reach = 1.0 - stats[0].hit_rate;
    for (i, level_stats) in stats.iter().enumerate().skip(1) {
        let latency = hierarchy
            .level(i)
            .map(|cache| cache.config().access_latency as f64)
            .unwrap_or(0.0);
        let contribution = reach * latency;
        total += contribution;
        breakdown.push(AmatContribution {
            name: format!("L{}", i + 1),
            cycles: contribution,
        });
        reach *= 1.0 - level_stats.hit_rate;
    }

    let memory_contribution = reach * memory.access_latency() as f64;
    total += memory_contribution;
    breakdown.push(AmatContribution {
        name: "memory".to_string(),
        cycles: memory_contribution,
    });

    (total, breakdown)
}
