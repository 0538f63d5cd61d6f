pub mod config;
pub mod report;
pub mod top;

pub use config::{cache_levels, Config, MemConfig, SimConfig, TraceConfig, TraceMode};
pub use report::{amat, SimSummary};
pub use top::Sim;
