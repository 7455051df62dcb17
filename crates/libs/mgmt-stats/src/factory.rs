use crate::accessor::StatisticsAccessor;
use crate::config::StatsConfig;
use crate::connection::ConnectionSource;
use crate::error::StatsError;
use crate::retry::RetryPolicy;
use crate::target::{CacheTarget, ChannelTarget, StatisticsTarget, Topology};

/// Builds accessors from target descriptors.
///
/// Targets without an explicit domain get a best-effort statistics reset
/// right after construction so each test starts from zero. A failed reset
/// is only reported when the target node is known to be running; before
/// that the object is legitimately missing.
#[derive(Debug)]
pub struct StatisticsFactory<T> {
    config: StatsConfig,
    topology: T,
}

impl<T: Topology> StatisticsFactory<T> {
    pub fn new(config: StatsConfig, topology: T) -> Self {
        Self { config, topology }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn cache<S: ConnectionSource>(
        &self,
        target: CacheTarget,
        source: S,
    ) -> Result<StatisticsAccessor<S>, StatsError> {
        self.build(&StatisticsTarget::Cache(target), source)
    }

    pub fn channel<S: ConnectionSource>(
        &self,
        target: ChannelTarget,
        source: S,
    ) -> Result<StatisticsAccessor<S>, StatsError> {
        self.build(&StatisticsTarget::Channel(target), source)
    }

    pub fn build<S: ConnectionSource>(
        &self,
        target: &StatisticsTarget,
        source: S,
    ) -> Result<StatisticsAccessor<S>, StatsError> {
        let template = target.template(&self.config, &self.topology)?;
        let accessor = StatisticsAccessor::new(target.kind(), source, template)
            .with_poll_interval(self.config.poll_interval());

        if !target.has_explicit_domain() {
            self.reset_best_effort(target, &accessor);
        }
        Ok(accessor)
    }

    fn reset_best_effort<S: ConnectionSource>(
        &self,
        target: &StatisticsTarget,
        accessor: &StatisticsAccessor<S>,
    ) {
        let policy = RetryPolicy::new(self.config.reset_attempts, self.config.reset_delay());
        let Err(err) = policy.execute_if(
            || accessor.reset(),
            |err| err.root_cause().is_retryable(),
        ) else {
            return;
        };

        let running = target
            .node()
            .is_some_and(|node| self.topology.is_started(node));
        if running {
            log::warn!(
                "could not reset statistics for {}: {}",
                accessor.template(),
                err.root_cause()
            );
        } else {
            log::debug!("skipped statistics reset for {}: {err}", accessor.template());
        }
    }
}
