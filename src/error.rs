use thiserror::Error;

/// Malformed construction parameters. Map operations themselves never fail;
/// absence is reported through `Option`.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("initial capacity must be at least one bucket")]
    ZeroCapacity,
    #[error("max load factor must be finite and at least 1/1024, got {0}")]
    InvalidLoadFactor(f64),
}
