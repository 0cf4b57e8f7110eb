//! Symbol resolution for backtraces.
//!
//! A `SymbolResolver` maps a code location to the nearest symbol at or below it.
//! `SymbolTable` is the in-memory implementation; it can be loaded from a JSON map
//! of symbol names to CS-relative addresses.

use std::collections::{BTreeMap, HashMap};

/// Resolves code addresses to symbols.
pub trait SymbolResolver: Send + Sync {
    /// Returns the symbol covering `cs:ip` and the offset of `ip` from its start.
    fn resolve(&self, cs: u32, ip: u32) -> Option<(String, u32)>;
}

/// Resolver that knows no symbols.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
    fn resolve(&self, _cs: u32, _ip: u32) -> Option<(String, u32)> {
        None
    }
}

/// Symbols per code segment, looked up nearest-below.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    segments: HashMap<u32, BTreeMap<u32, String>>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds symbol `name` starting at `cs:addr`.
    pub fn insert(&mut self, cs: u32, addr: u32, name: impl Into<String>) {
        let _ = self
            .segments
            .entry(cs)
            .or_default()
            .insert(addr, name.into());
    }

    /// Parses a JSON object mapping symbol names to addresses, all in segment `cs`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the input is not such an object.
    pub fn from_json(cs: u32, json: &str) -> Result<Self, serde_json::Error> {
        let map: HashMap<String, u32> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (name, addr) in map {
            table.insert(cs, addr, name);
        }
        Ok(table)
    }

    /// Number of symbols across all segments.
    pub fn len(&self) -> usize {
        self.segments.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` when the table holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, cs: u32, ip: u32) -> Option<(String, u32)> {
        let (start, name) = self.segments.get(&cs)?.range(..=ip).next_back()?;
        Some((name.clone(), ip - start))
    }
}
