//! Configuration for signature verification.

use chrono::{DateTime, Utc};

/// How signature fields are found in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorStrategy {
    /// Resolve signature dictionaries through the object graph, falling back
    /// to positional marker scanning when no dictionary is found.
    #[default]
    Structural,
    /// Marker scanning only: the i-th /ByteRange is paired with the i-th
    /// /Contents, /Reason and /Location by index.
    Positional,
}

/// Signature verification configuration.
#[derive(Debug, Clone, Default)]
pub struct VerifyConfig {
    /// Strategy used to locate signature fields.
    pub locator: LocatorStrategy,

    /// Instant used for certificate expiry checks (`None` = wall clock).
    pub reference_time: Option<DateTime<Utc>>,

    /// Treat a byte range that does not span the whole file as an error.
    pub require_full_coverage: bool,
}

impl VerifyConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the locator strategy.
    pub fn with_locator(mut self, locator: LocatorStrategy) -> Self {
        self.locator = locator;
        self
    }

    /// Pin the "now" used for expiry checks.
    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }

    /// Require signatures to cover the entire file.
    pub fn with_full_coverage(mut self, enable: bool) -> Self {
        self.require_full_coverage = enable;
        self
    }

    /// The instant expiry is evaluated against.
    pub fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }
}
