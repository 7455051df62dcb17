use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_JMX_DOMAIN: &str = "jboss.datagrid-infinispan";
pub const DEFAULT_CLUSTERED_DOMAIN: &str = "org.wildfly.clustering.infinispan";

/// Deployment settings for statistics targets.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StatsConfig {
    /// Domain of standalone cache servers and prefix of per-node domains.
    pub jmx_domain: String,
    /// Domain shared by every node when nodes run as a clustered server.
    pub clustered_domain: String,
    pub clustered: bool,
    pub reset_attempts: u32,
    pub reset_delay_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            jmx_domain: DEFAULT_JMX_DOMAIN.to_owned(),
            clustered_domain: DEFAULT_CLUSTERED_DOMAIN.to_owned(),
            clustered: false,
            reset_attempts: 2,
            reset_delay_ms: 150,
            poll_interval_ms: 100,
        }
    }
}

impl StatsConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Domain of a node's objects, given the node's qualifier.
    pub fn node_domain(&self, qualifier: &str) -> String {
        if self.clustered {
            self.clustered_domain.clone()
        } else {
            format!("{}-{qualifier}", self.jmx_domain)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = StatsConfig::from_toml("").expect("empty config");
        assert_eq!(config, StatsConfig::default());
        assert_eq!(config.reset_delay(), Duration::from_millis(150));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config = StatsConfig::from_toml("clustered = true\nreset_attempts = 4\n")
            .expect("partial config");
        assert!(config.clustered);
        assert_eq!(config.reset_attempts, 4);
        assert_eq!(config.jmx_domain, DEFAULT_JMX_DOMAIN);
        assert_eq!(config.node_domain("node1"), DEFAULT_CLUSTERED_DOMAIN);
    }

    #[test]
    fn node_domain_appends_qualifier() {
        let config = StatsConfig::default();
        assert_eq!(config.node_domain("dc0-node1"), "jboss.datagrid-infinispan-dc0-node1");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "jmx_domain = \"custom\"\npoll_interval_ms = 25").expect("write config");

        let config = StatsConfig::from_path(file.path()).expect("config from file");
        assert_eq!(config.jmx_domain, "custom");
        assert_eq!(config.poll_interval(), Duration::from_millis(25));
    }

    #[test]
    fn rejects_wrong_types() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "reset_attempts = \"two\"").expect("write config");

        let err = StatsConfig::from_path(file.path()).expect_err("invalid config");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
