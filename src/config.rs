//! Construction-time tunables for the chained hash table.

use crate::error::ConfigError;

/// Bucket count used when the caller does not pick one.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Maximum `entries / buckets` ratio tolerated after an insertion.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Smallest accepted max load factor. At this ratio a table holds 1024
/// buckets per entry; anything lower would ask doubling for bucket arrays
/// the address space cannot back.
pub const MIN_LOAD_FACTOR: f64 = 1.0 / 1024.0;

/// Initial bucket count and load-factor threshold for a
/// [`ChainedHashTable`](crate::ChainedHashTable).
///
/// ```
/// use twin_map::TableConfig;
///
/// let cfg = TableConfig::default().initial_capacity(4).max_load_factor(0.5);
/// assert!(cfg.validate().is_ok());
/// assert!(TableConfig::default().initial_capacity(0).validate().is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub max_load_factor: f64,
}

impl TableConfig {
    pub const fn new(initial_capacity: usize, max_load_factor: f64) -> Self {
        Self {
            initial_capacity,
            max_load_factor,
        }
    }

    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// Rejects a zero bucket count and any load factor that is not a finite
    /// number of at least [`MIN_LOAD_FACTOR`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let lf = self.max_load_factor;
        // Written so NaN fails the comparison and is rejected too.
        if !(lf.is_finite() && lf >= MIN_LOAD_FACTOR) {
            return Err(ConfigError::InvalidLoadFactor(lf));
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR)
    }
}
