use crate::index::GrowthPolicy;

/// Load factor used when none is given, or when the given one is rejected.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.85;

/// Seed mixed into every key hash unless the caller picks another one.
pub const DEFAULT_SEED: u32 = 0xCAFE_BABE;

const MIN_LOAD_FACTOR: f32 = 0.1;
const MAX_LOAD_FACTOR: f32 = 0.95;

/// Per-table tuning knobs.
///
/// A `TableConfig` is copied into each table when it is created. The load
/// factor decides when the table grows, the seed decorrelates the hashes of
/// different tables, and the growth policy decides how far it grows.
///
/// # Examples
///
/// ```rust
/// use robin_hash::GrowthPolicy;
/// use robin_hash::TableConfig;
///
/// let config = TableConfig::new()
///     .with_load_factor(0.5)
///     .with_seed(42)
///     .with_growth(GrowthPolicy::OneAndHalf);
///
/// assert_eq!(config.load_factor(), 0.5);
/// assert_eq!(config.seed(), 42);
///
/// // Out-of-range load factors fall back to the default.
/// assert_eq!(TableConfig::new().with_load_factor(1.5).load_factor(), 0.85);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    load_factor: f32,
    seed: u32,
    growth: GrowthPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConfig {
    /// Returns the default configuration: load factor 0.85, the default seed
    /// and doubling growth.
    pub const fn new() -> Self {
        Self {
            load_factor: DEFAULT_LOAD_FACTOR,
            seed: DEFAULT_SEED,
            growth: GrowthPolicy::Double,
        }
    }

    /// Sets the load factor.
    ///
    /// Values outside `(0.1, 0.95]`, including NaN, are replaced by
    /// [`DEFAULT_LOAD_FACTOR`].
    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = if load_factor > MIN_LOAD_FACTOR && load_factor <= MAX_LOAD_FACTOR {
            load_factor
        } else {
            DEFAULT_LOAD_FACTOR
        };
        self
    }

    /// Sets the seed mixed into key hashes.
    pub const fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the growth policy.
    pub const fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// The ratio of entries to slots at which the table grows.
    pub const fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// The seed mixed into key hashes.
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// The growth policy.
    pub const fn growth(&self) -> GrowthPolicy {
        self.growth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TableConfig::default();
        assert_eq!(config.load_factor(), DEFAULT_LOAD_FACTOR);
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert_eq!(config.growth(), GrowthPolicy::Double);
    }

    #[test]
    fn load_factor_bounds() {
        assert_eq!(TableConfig::new().with_load_factor(0.95).load_factor(), 0.95);
        assert_eq!(TableConfig::new().with_load_factor(0.5).load_factor(), 0.5);
        assert_eq!(TableConfig::new().with_load_factor(0.11).load_factor(), 0.11);

        for rejected in [0.1, 0.0, -1.0, 0.96, 1.0, 2.0, f32::NAN, f32::INFINITY] {
            assert_eq!(
                TableConfig::new().with_load_factor(rejected).load_factor(),
                DEFAULT_LOAD_FACTOR,
                "{rejected}"
            );
        }
    }

    #[test]
    fn builder_keeps_other_fields() {
        let config = TableConfig::new()
            .with_seed(7)
            .with_growth(GrowthPolicy::OneAndHalf)
            .with_load_factor(0.6);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.growth(), GrowthPolicy::OneAndHalf);
        assert_eq!(config.load_factor(), 0.6);
    }
}
