use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LENGTH: usize = 300;
pub const DEFAULT_MAX_NODES: usize = 200;
pub const DEFAULT_MAX_DEPTH: usize = 100;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Bounds applied to every evaluation.
///
/// `cache_capacity` of zero disables memoization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum length of the trimmed expression, in characters.
    pub max_length: usize,
    /// Maximum node count of the expression tree, enforced while parsing.
    pub max_nodes: usize,
    /// Maximum nesting of sub-expressions while parsing.
    pub max_depth: usize,
    pub cache_capacity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Limits {
    /// Defaults overlaid with `ABACUS_MAX_LENGTH`, `ABACUS_MAX_NODES`,
    /// `ABACUS_MAX_DEPTH` and `ABACUS_CACHE_SIZE` when set.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut limits = Self::default();
        limits.apply_env(|key| std::env::var(key).ok());
        limits
    }

    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let fields: [(&str, &mut usize); 4] = [
            ("ABACUS_MAX_LENGTH", &mut self.max_length),
            ("ABACUS_MAX_NODES", &mut self.max_nodes),
            ("ABACUS_MAX_DEPTH", &mut self.max_depth),
            ("ABACUS_CACHE_SIZE", &mut self.cache_capacity),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse::<usize>() {
                    Ok(v) => *slot = v,
                    Err(_) => tracing::warn!(key, value = %raw, "ignoring invalid limit override"),
                }
            }
        }
    }
}
