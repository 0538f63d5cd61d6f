use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use toml::Table;

use cachesim::sim::config::{cache_levels, Config, MemConfig, SimConfig, TraceConfig, TraceMode};
use cachesim::sim::top::Sim;

#[derive(Parser)]
#[command(version, about)]
struct CachesimArgs {
    #[arg(help = "Path to config.toml")]
    config_path: PathBuf,
    #[arg(long, help = "Override trace file path (switches to file mode)")]
    trace_path: Option<PathBuf>,
    #[arg(long, help = "Override synthetic trace length")]
    accesses: Option<u64>,
    #[arg(long, help = "Override synthetic trace seed")]
    seed: Option<u64>,
    #[arg(long, help = "Override main memory latency in cycles")]
    memory_latency: Option<u64>,
    #[arg(long, help = "Write per-level statistics to a CSV file")]
    csv: Option<PathBuf>,
    #[arg(long, help = "Write the full summary to a JSON file")]
    json: Option<PathBuf>,
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let argv = CachesimArgs::parse();
    let config = fs::read_to_string(&argv.config_path)
        .with_context(|| format!("failed to read config file {}", argv.config_path.display()))?;
    let config_table: Table = toml::from_str(&config).context("cannot parse config toml")?;

    let mut sim_config = SimConfig::from_section(config_table.get("sim"));
    let mut mem_config = MemConfig::from_section(config_table.get("mem"));
    let mut trace_config = TraceConfig::from_section(config_table.get("trace"));
    let levels = cache_levels(&config_table);

    // override toml configs with argv
    if let Some(path) = argv.trace_path {
        trace_config.mode = TraceMode::File;
        trace_config.path = Some(path);
    }
    trace_config.num_accesses = argv.accesses.unwrap_or(trace_config.num_accesses);
    trace_config.seed = argv.seed.unwrap_or(trace_config.seed);
    mem_config.access_latency = argv.memory_latency.unwrap_or(mem_config.access_latency);
    sim_config.csv = argv.csv.or(sim_config.csv);
    sim_config.json = argv.json.or(sim_config.json);

    let trace = Sim::build_trace(&trace_config)?;
    let mut sim = Sim::new(levels, mem_config, trace)?;
    let summary = sim.run(&sim_config.name)?;

    println!("{}", summary);
    if let Some(path) = &sim_config.csv {
        summary.write_csv(path)?;
    }
    if let Some(path) = &sim_config.json {
        summary.write_json(path)?;
    }

    Ok(())
}
