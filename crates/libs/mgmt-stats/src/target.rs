//! Declarative descriptions of statistics targets.
//!
//! A target names the object to read (cache or channel), where it lives
//! (a backend node, or a standalone server when `node` is `None`) and an
//! optional explicit domain. Targets render to the name template the
//! accessor resolves.

use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::error::StatsError;
use crate::kind::StatisticsKind;
use crate::name::{quote, ObjectName};

/// A backend node: data-center index and node index within it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub dc: usize,
    pub index: usize,
}

impl NodeRef {
    pub fn new(dc: usize, index: usize) -> Self {
        Self { dc, index }
    }
}

/// Knowledge about backend nodes held outside this crate.
pub trait Topology {
    /// Qualifier distinguishing the node's management domain.
    fn node_qualifier(&self, node: NodeRef) -> Option<String>;

    fn is_started(&self, node: NodeRef) -> bool;
}

/// Topology for setups without backend nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNodes;

impl Topology for NoNodes {
    fn node_qualifier(&self, _node: NodeRef) -> Option<String> {
        None
    }

    fn is_started(&self, _node: NodeRef) -> bool {
        false
    }
}

/// Statistics component of one cache.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheTarget {
    pub domain: Option<String>,
    pub node: Option<NodeRef>,
    #[serde(rename = "type")]
    pub kind: String,
    pub cache_name: String,
    pub cache_mode: String,
    pub manager: String,
    pub component: String,
}

impl Default for CacheTarget {
    fn default() -> Self {
        Self {
            domain: None,
            node: None,
            kind: "Cache".to_owned(),
            cache_name: String::new(),
            cache_mode: "*".to_owned(),
            manager: "*".to_owned(),
            component: "Statistics".to_owned(),
        }
    }
}

impl CacheTarget {
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Self::default()
        }
    }

    pub fn on_node(mut self, node: NodeRef) -> Self {
        self.node = Some(node);
        self
    }

    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_mode(mut self, cache_mode: impl Into<String>) -> Self {
        self.cache_mode = cache_mode.into();
        self
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = manager.into();
        self
    }

    pub fn template(
        &self,
        config: &StatsConfig,
        topology: &dyn Topology,
    ) -> Result<ObjectName, StatsError> {
        if self.cache_name.is_empty() {
            return Err(StatsError::invalid_name("", "cache target without a cache name"));
        }
        let domain = select_domain(self.domain.as_deref(), self.node, config, topology)?;
        ObjectName::parse(&format!(
            "{domain}:type={},name={},manager={},component={}",
            self.kind,
            quote(&format!("{}({})", self.cache_name, self.cache_mode)),
            quote(&self.manager),
            self.component,
        ))
    }
}

/// Cluster transport channel.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChannelTarget {
    pub domain: Option<String>,
    pub node: Option<NodeRef>,
    #[serde(rename = "type")]
    pub kind: String,
    pub cluster: String,
}

impl Default for ChannelTarget {
    fn default() -> Self {
        Self {
            domain: None,
            node: None,
            kind: "channel".to_owned(),
            cluster: "*".to_owned(),
        }
    }
}

impl ChannelTarget {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            ..Self::default()
        }
    }

    pub fn on_node(mut self, node: NodeRef) -> Self {
        self.node = Some(node);
        self
    }

    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn template(
        &self,
        config: &StatsConfig,
        topology: &dyn Topology,
    ) -> Result<ObjectName, StatsError> {
        let domain = select_domain(self.domain.as_deref(), self.node, config, topology)?;
        ObjectName::parse(&format!(
            "{domain}:type={},cluster={}",
            self.kind,
            quote(&self.cluster)
        ))
    }
}

/// Any statistics target, tagged by the kind of object it addresses.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatisticsTarget {
    Cache(CacheTarget),
    Channel(ChannelTarget),
}

impl StatisticsTarget {
    pub fn kind(&self) -> StatisticsKind {
        match self {
            Self::Cache(_) => StatisticsKind::Cache,
            Self::Channel(_) => StatisticsKind::Channel,
        }
    }

    pub fn node(&self) -> Option<NodeRef> {
        match self {
            Self::Cache(target) => target.node,
            Self::Channel(target) => target.node,
        }
    }

    /// Whether the target names its domain explicitly.
    pub fn has_explicit_domain(&self) -> bool {
        match self {
            Self::Cache(target) => target.domain.is_some(),
            Self::Channel(target) => target.domain.is_some(),
        }
    }

    pub fn template(
        &self,
        config: &StatsConfig,
        topology: &dyn Topology,
    ) -> Result<ObjectName, StatsError> {
        match self {
            Self::Cache(target) => target.template(config, topology),
            Self::Channel(target) => target.template(config, topology),
        }
    }
}

impl From<CacheTarget> for StatisticsTarget {
    fn from(target: CacheTarget) -> Self {
        Self::Cache(target)
    }
}

impl From<ChannelTarget> for StatisticsTarget {
    fn from(target: ChannelTarget) -> Self {
        Self::Channel(target)
    }
}

fn select_domain(
    explicit: Option<&str>,
    node: Option<NodeRef>,
    config: &StatsConfig,
    topology: &dyn Topology,
) -> Result<String, StatsError> {
    if let Some(domain) = explicit {
        return Ok(domain.to_owned());
    }
    match node {
        None => Ok(config.jmx_domain.clone()),
        Some(_) if config.clustered => Ok(config.clustered_domain.clone()),
        Some(node) => topology
            .node_qualifier(node)
            .map(|qualifier| config.node_domain(&qualifier))
            .ok_or_else(|| StatsError::InstanceNotFound {
                name: format!("node {} in dc {}", node.index, node.dc),
            }),
    }
}
