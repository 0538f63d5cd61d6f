pub mod main_memory;
pub mod patterns;
pub mod trace;

pub use main_memory::MainMemory;
pub use patterns::{Pattern, SyntheticTrace};
pub use trace::{FileTrace, MemoryAccess, ProgramTrace, TraceSource};
