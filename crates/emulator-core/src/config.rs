//! Engine configuration.

use std::time::Duration;

/// Default interval between clock wakes.
pub const DEFAULT_CLOCK_INTERVAL: Duration = Duration::from_millis(100);

/// Default main-memory size in bytes.
pub const DEFAULT_MEMORY_SIZE: u32 = 0x0010_0000;

/// Default address of the first text-segment statement.
pub const DEFAULT_TEXT_BASE: u32 = 0x0040_0000;

/// Default address of the first data-segment byte.
pub const DEFAULT_DATA_BASE: u32 = 0x1001_0000;

/// Top-level immutable configuration for an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EngineConfig {
    /// Interval between clock wakes; one instruction cycle per wake.
    pub clock_interval: Duration,
    /// Size of main memory in bytes, starting at `data_base`.
    pub memory_size: u32,
    /// Address of text-segment statement 0; statements are 4 bytes apart.
    pub text_base: u32,
    /// Address of the first data-segment byte.
    pub data_base: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clock_interval: DEFAULT_CLOCK_INTERVAL,
            memory_size: DEFAULT_MEMORY_SIZE,
            text_base: DEFAULT_TEXT_BASE,
            data_base: DEFAULT_DATA_BASE,
        }
    }
}

impl EngineConfig {
    /// Replaces the clock interval.
    #[must_use]
    pub const fn with_clock_interval(mut self, interval: Duration) -> Self {
        self.clock_interval = interval;
        self
    }

    /// Replaces the memory size.
    #[must_use]
    pub const fn with_memory_size(mut self, bytes: u32) -> Self {
        self.memory_size = bytes;
        self
    }

    /// One past the last addressable memory byte, saturating at `u32::MAX`.
    #[must_use]
    pub const fn memory_end(&self) -> u32 {
        self.data_base.saturating_add(self.memory_size)
    }
}
