use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Protocol constants published by the cache and channel management objects.
pub mod names {
    pub const CACHE_RESET_OPERATION: &str = "resetStatistics";
    pub const CACHE_ELAPSED_TIME: &str = "elapsedTime";
    pub const CHANNEL_RESET_OPERATION: &str = "resetStats";
    pub const CHANNEL_CONNECTED: &str = "connected";
}

/// Which kind of management object an accessor targets.
///
/// The kinds share one engine and differ only in the data returned here.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsKind {
    Cache,
    Channel,
}

impl StatisticsKind {
    pub fn reset_operation(self) -> &'static str {
        match self {
            Self::Cache => names::CACHE_RESET_OPERATION,
            Self::Channel => names::CHANNEL_RESET_OPERATION,
        }
    }

    /// Attribute polled to decide whether the object is ready.
    pub fn availability_attribute(self) -> &'static str {
        match self {
            Self::Cache => names::CACHE_ELAPSED_TIME,
            Self::Channel => names::CHANNEL_CONNECTED,
        }
    }

    /// Readiness predicate over the value of [`Self::availability_attribute`].
    ///
    /// The elapsed-time statistic only appears once a cache is started; a
    /// channel reports `connected = true` once it joined its cluster.
    pub fn is_available(self, value: &JsonValue) -> bool {
        match self {
            Self::Cache => !value.is_null(),
            Self::Channel => *value == JsonValue::Bool(true),
        }
    }

    /// Whether a reset whose result failed to marshal still counts as done.
    pub fn tolerates_unserializable_reset(self) -> bool {
        matches!(self, Self::Channel)
    }
}
