use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::connection::{ConnectionSource, ManagementConnection};
use crate::error::StatsError;
use crate::kind::StatisticsKind;
use crate::name::ObjectName;
use crate::resolver::NameResolver;
use crate::retry::RetryPolicy;

/// Attribute values keyed by attribute name, as returned by one bulk read.
pub type AttributeMap = BTreeMap<String, JsonValue>;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads and resets the statistics of one management object.
///
/// The object is addressed by a name template that is resolved on first use
/// and memoized. A connection is requested from the source for every
/// operation and dropped when the operation returns.
pub struct StatisticsAccessor<S> {
    source: S,
    kind: StatisticsKind,
    resolver: NameResolver,
    poll_interval: Duration,
}

impl<S: ConnectionSource> StatisticsAccessor<S> {
    pub fn new(kind: StatisticsKind, source: S, template: ObjectName) -> Self {
        Self {
            source,
            kind,
            resolver: NameResolver::new(template),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn cache(source: S, template: ObjectName) -> Self {
        Self::new(StatisticsKind::Cache, source, template)
    }

    pub fn channel(source: S, template: ObjectName) -> Self {
        Self::new(StatisticsKind::Channel, source, template)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn kind(&self) -> StatisticsKind {
        self.kind
    }

    pub fn template(&self) -> &ObjectName {
        self.resolver.template()
    }

    pub fn resolved_name(&self) -> Option<&ObjectName> {
        self.resolver.resolved()
    }

    /// Whether the template currently resolves. Failures read as `false`.
    pub fn exists(&self) -> bool {
        self.source
            .connect()
            .and_then(|connection| self.resolver.resolve(&connection))
            .is_ok()
    }

    /// All readable attributes of the object with their current values.
    ///
    /// Write-only attributes are skipped. Any failure aborts the whole read.
    pub fn statistics(&self) -> Result<AttributeMap, StatsError> {
        let connection = self.source.connect()?;
        let name = self.resolver.resolve(&connection)?;

        let readable: Vec<String> = connection
            .attribute_info(&name)?
            .into_iter()
            .filter(|info| info.readable)
            .map(|info| info.name)
            .collect();
        if readable.is_empty() {
            return Ok(AttributeMap::new());
        }

        Ok(connection
            .get_attributes(&name, &readable)?
            .into_iter()
            .collect())
    }

    pub fn single_statistic(&self, attribute: &str) -> Result<JsonValue, StatsError> {
        let connection = self.source.connect()?;
        let name = self.resolver.resolve(&connection)?;
        connection.get_attribute(&name, attribute)
    }

    /// Invokes the kind's reset operation on the object.
    pub fn reset(&self) -> Result<(), StatsError> {
        let connection = self.source.connect()?;
        let name = self.resolver.resolve(&connection)?;
        let operation = self.kind.reset_operation();
        match connection.invoke(&name, operation, &[]) {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_serializable() && self.kind.tolerates_unserializable_reset() => {
                // The operation ran remotely; only its return value was lost.
                log::debug!("{operation} on {name} returned an unserializable value: {err}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Whether the object exists and reports itself ready.
    pub fn is_available(&self) -> bool {
        self.check_available().is_ok()
    }

    /// Blocks until the object is available, polling every poll interval.
    ///
    /// Makes `1 + timeout / interval` attempts, each resolving the template
    /// and testing readiness. Fails with [`StatsError::Unavailable`] carrying
    /// the last failure once the attempts are spent.
    pub fn wait_to_become_available(&self, timeout: Duration) -> Result<(), StatsError> {
        let policy = RetryPolicy::for_timeout(timeout, self.poll_interval);
        policy
            .execute(|| self.check_available())
            .map_err(|err| match err {
                StatsError::RetryExhausted { attempts, source } => StatsError::Unavailable {
                    template: self.template().to_string(),
                    attempts,
                    source,
                },
                other => other,
            })
    }

    fn check_available(&self) -> Result<(), StatsError> {
        let connection = self.source.connect()?;
        let name = self.resolver.resolve(&connection)?;
        let attribute = self.kind.availability_attribute();
        let value = match connection.get_attribute(&name, attribute) {
            Ok(value) => value,
            Err(StatsError::AttributeNotFound { .. }) => JsonValue::Null,
            Err(err) => return Err(err),
        };
        if self.kind.is_available(&value) {
            Ok(())
        } else {
            Err(StatsError::NotReady {
                name: name.to_string(),
                attribute: attribute.to_owned(),
                value: value.to_string(),
            })
        }
    }
}

impl<S> std::fmt::Debug for StatisticsAccessor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsAccessor")
            .field("kind", &self.kind)
            .field("template", self.resolver.template())
            .field("resolved", &self.resolver.resolved())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
