use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use crate::address::MemoryAddress;
use crate::cache::AccessType;

/// One reference of a memory trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    pub address: MemoryAddress,
    pub kind: AccessType,
}

impl MemoryAccess {
    pub fn read(address: u64) -> Self {
        Self {
            address: MemoryAddress::new(address),
            kind: AccessType::Read,
        }
    }

    pub fn write(address: u64) -> Self {
        Self {
            address: MemoryAddress::new(address),
            kind: AccessType::Write,
        }
    }
}

/// Ordered source of memory references, pulled one at a time.
pub trait TraceSource {
    /// Next reference, or `None` when the trace is exhausted.
    fn next_access(&mut self) -> anyhow::Result<Option<MemoryAccess>>;

    /// Rewind to the beginning of the trace.
    fn reset(&mut self) -> anyhow::Result<()>;
}

/// Text trace file, one reference per line: `<hex-address> <R|W>`.
/// Blank lines and `#` comments are skipped.
pub struct FileTrace {
    path: PathBuf,
    reader: BufReader<File>,
    line_number: u64,
}

impl FileTrace {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("cannot open trace file {}", path.display()))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            line_number: 0,
        })
    }

    fn parse_line(&self, line: &str) -> anyhow::Result<MemoryAccess> {
        let mut fields = line.split_whitespace();
        let (Some(addr_str), Some(kind_str)) = (fields.next(), fields.next()) else {
            bail!(
                "{}:{}: expected '<address> <R|W>', got '{}'",
                self.path.display(),
                self.line_number,
                line.trim()
            );
        };

        let addr_str = addr_str.strip_prefix("0x").unwrap_or(addr_str);
        let address = u64::from_str_radix(addr_str, 16).with_context(|| {
            format!(
                "{}:{}: invalid hex address '{}'",
                self.path.display(),
                self.line_number,
                addr_str
            )
        })?;

        let kind = match kind_str {
            "R" | "r" => AccessType::Read,
            "W" | "w" => AccessType::Write,
            other => bail!(
                "{}:{}: invalid access type '{}'",
                self.path.display(),
                self.line_number,
                other
            ),
        };

        Ok(MemoryAccess {
            address: MemoryAddress::new(address),
            kind,
        })
    }
}

impl TraceSource for FileTrace {
    fn next_access(&mut self) -> anyhow::Result<Option<MemoryAccess>> {
        loop {
            let mut line = String::new();
            let n = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("read error in {}", self.path.display()))?;
            if n == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return self.parse_line(trimmed).map(Some);
        }
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        let file = File::open(&self.path)
            .with_context(|| format!("cannot reopen trace file {}", self.path.display()))?;
        self.reader = BufReader::new(file);
        self.line_number = 0;
        Ok(())
    }
}

/// Pre-built in-memory trace, for programmatic use and tests.
#[derive(Debug, Clone, Default)]
pub struct ProgramTrace {
    accesses: Vec<MemoryAccess>,
    cursor: usize,
}

impl ProgramTrace {
    pub fn new(accesses: Vec<MemoryAccess>) -> Self {
        Self {
            accesses,
            cursor: 0,
        }
    }
}

impl TraceSource for ProgramTrace {
    fn next_access(&mut self) -> anyhow::Result<Option<MemoryAccess>> {
        let access = self.accesses.get(self.cursor).copied();
        if access.is_some() {
            self.cursor += 1;
        }
        Ok(access)
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        self.cursor = 0;
        Ok(())
    }
}
