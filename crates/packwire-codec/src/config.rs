/// Default cap on heterogeneous-map nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default cap on entries in a single heterogeneous map: 1 Mi.
pub const DEFAULT_MAX_ENTRIES: usize = 1024 * 1024;

/// Limits applied while decoding heterogeneous maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum nesting of maps inside maps. Default: 32.
    pub max_depth: usize,
    /// Maximum entry count accepted from a count prefix. Default: 1 Mi.
    pub max_entries: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
