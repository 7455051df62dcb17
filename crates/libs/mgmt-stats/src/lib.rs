//! Pull-based access to runtime statistics of caches and cluster channels.
//!
//! Statistics live on management objects exposed by a (usually remote)
//! process. This crate addresses them through name templates instead of
//! exact names:
//!
//! - [`ObjectName`] parses and matches management names and patterns
//! - [`ManagementConnection`] is the protocol consumed from an endpoint;
//!   [`ConnectionSource`] hands out a connection per operation
//! - [`StatisticsAccessor`] resolves a template once, then reads, resets
//!   and polls the object; [`StatisticsKind`] selects cache or channel
//!   behaviour
//! - [`StatisticsFactory`] turns [`CacheTarget`] / [`ChannelTarget`]
//!   descriptors into accessors and resets their statistics
//! - [`LocalServer`] is an in-process endpoint

pub mod accessor;
pub mod config;
mod connection;
mod error;
mod factory;
pub mod kind;
mod local;
pub mod name;
mod resolver;
pub mod retry;
pub mod target;

pub use accessor::{AttributeMap, StatisticsAccessor};
pub use config::StatsConfig;
pub use connection::{AttributeInfo, ConnectionSource, ManagementConnection};
pub use error::StatsError;
pub use factory::StatisticsFactory;
pub use kind::StatisticsKind;
pub use local::{LocalServer, MBean};
pub use name::ObjectName;
pub use resolver::NameResolver;
pub use retry::RetryPolicy;
pub use target::{CacheTarget, ChannelTarget, NoNodes, NodeRef, StatisticsTarget, Topology};
