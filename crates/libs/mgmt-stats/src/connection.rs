use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::StatsError;
use crate::name::ObjectName;

/// Metadata describing one attribute of a management object.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub readable: bool,
}

impl AttributeInfo {
    pub fn readable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readable: true,
        }
    }

    pub fn write_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readable: false,
        }
    }
}

/// The management protocol as consumed by statistics accessors.
///
/// Implementations talk to a remote endpoint or an in-process registry.
/// Attribute values are JSON values; `Null` stands for an absent value.
pub trait ManagementConnection {
    /// Names of all objects selected by `pattern`, in implementation order.
    fn query_names(&self, pattern: &ObjectName) -> Result<Vec<ObjectName>, StatsError>;

    fn attribute_info(&self, name: &ObjectName) -> Result<Vec<AttributeInfo>, StatsError>;

    fn get_attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<(String, JsonValue)>, StatsError>;

    fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<JsonValue, StatsError>;

    fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        params: &[JsonValue],
    ) -> Result<JsonValue, StatsError>;
}

impl<T: ManagementConnection + ?Sized> ManagementConnection for Arc<T> {
    fn query_names(&self, pattern: &ObjectName) -> Result<Vec<ObjectName>, StatsError> {
        (**self).query_names(pattern)
    }

    fn attribute_info(&self, name: &ObjectName) -> Result<Vec<AttributeInfo>, StatsError> {
        (**self).attribute_info(name)
    }

    fn get_attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<(String, JsonValue)>, StatsError> {
        (**self).get_attributes(name, attributes)
    }

    fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<JsonValue, StatsError> {
        (**self).get_attribute(name, attribute)
    }

    fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        params: &[JsonValue],
    ) -> Result<JsonValue, StatsError> {
        (**self).invoke(name, operation, params)
    }
}

/// Hands out a live connection for every protocol call.
///
/// Accessors never keep the returned handle, so reconnection policy lives
/// entirely behind this trait. Any `Fn() -> Result<C, StatsError>` closure
/// is a source.
pub trait ConnectionSource {
    type Connection: ManagementConnection;

    fn connect(&self) -> Result<Self::Connection, StatsError>;
}

impl<F, C> ConnectionSource for F
where
    F: Fn() -> Result<C, StatsError>,
    C: ManagementConnection,
{
    type Connection = C;

    fn connect(&self) -> Result<C, StatsError> {
        self()
    }
}
