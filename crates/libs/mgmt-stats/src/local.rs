//! In-process management server.
//!
//! [`LocalServer`] keeps management objects in memory and answers the
//! protocol calls directly. It serves targets that run inside the test
//! process and doubles as a scriptable endpoint in tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value as JsonValue;

use crate::connection::{AttributeInfo, ManagementConnection};
use crate::error::StatsError;
use crate::name::ObjectName;

type Operation =
    Arc<dyn Fn(&mut BTreeMap<String, JsonValue>) -> Result<JsonValue, StatsError> + Send + Sync>;

struct Attribute {
    value: JsonValue,
    readable: bool,
}

/// A management object: attributes plus named zero-argument operations.
#[derive(Default)]
pub struct MBean {
    attributes: BTreeMap<String, Attribute>,
    operations: BTreeMap<String, Operation>,
}

impl MBean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.attributes.insert(name.into(), Attribute { value, readable: true });
        self
    }

    pub fn with_write_only_attribute(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.attributes.insert(name.into(), Attribute { value, readable: false });
        self
    }

    /// Registers `operation`; it sees the readable attribute values and may
    /// update them.
    pub fn with_operation<F>(mut self, name: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut BTreeMap<String, JsonValue>) -> Result<JsonValue, StatsError>
            + Send
            + Sync
            + 'static,
    {
        self.operations.insert(name.into(), Arc::new(operation));
        self
    }
}

impl fmt::Debug for MBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MBean")
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Shared in-memory registry of management objects.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct LocalServer {
    objects: Arc<Mutex<BTreeMap<ObjectName, MBean>>>,
}

impl LocalServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object, replacing any object previously registered under `name`.
    pub fn register(&self, name: ObjectName, mbean: MBean) -> Result<(), StatsError> {
        if name.is_pattern() {
            return Err(StatsError::invalid_name(
                &name.to_string(),
                "cannot register under a pattern",
            ));
        }
        self.lock()?.insert(name, mbean);
        Ok(())
    }

    pub fn unregister(&self, name: &ObjectName) -> Result<bool, StatsError> {
        Ok(self.lock()?.remove(name).is_some())
    }

    /// Overwrites one attribute of a registered object, creating it if absent.
    pub fn set_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
        value: JsonValue,
    ) -> Result<(), StatsError> {
        let mut objects = self.lock()?;
        let mbean = objects
            .get_mut(name)
            .ok_or_else(|| instance_not_found(name))?;
        store(&mut mbean.attributes, attribute.to_owned(), value);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<ObjectName, MBean>>, StatsError> {
        self.objects
            .lock()
            .map_err(|_| StatsError::transport("local management server lock poisoned"))
    }
}

impl fmt::Debug for LocalServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.objects.lock().map(|objects| objects.len()).unwrap_or_default();
        f.debug_struct("LocalServer").field("objects", &count).finish()
    }
}

fn store(attributes: &mut BTreeMap<String, Attribute>, attribute: String, value: JsonValue) {
    match attributes.get_mut(&attribute) {
        Some(entry) => entry.value = value,
        None => {
            attributes.insert(attribute, Attribute { value, readable: true });
        }
    }
}

fn instance_not_found(name: &ObjectName) -> StatsError {
    StatsError::InstanceNotFound {
        name: name.to_string(),
    }
}

fn attribute_not_found(name: &ObjectName, attribute: &str) -> StatsError {
    StatsError::AttributeNotFound {
        name: name.to_string(),
        attribute: attribute.to_owned(),
    }
}

impl ManagementConnection for LocalServer {
    fn query_names(&self, pattern: &ObjectName) -> Result<Vec<ObjectName>, StatsError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|candidate| pattern.matches(candidate))
            .cloned()
            .collect())
    }

    fn attribute_info(&self, name: &ObjectName) -> Result<Vec<AttributeInfo>, StatsError> {
        let objects = self.lock()?;
        let mbean = objects.get(name).ok_or_else(|| instance_not_found(name))?;
        Ok(mbean
            .attributes
            .iter()
            .map(|(attribute, entry)| AttributeInfo {
                name: attribute.clone(),
                readable: entry.readable,
            })
            .collect())
    }

    fn get_attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<(String, JsonValue)>, StatsError> {
        let objects = self.lock()?;
        let mbean = objects.get(name).ok_or_else(|| instance_not_found(name))?;
        // Unknown or unreadable names are left out of a bulk read.
        Ok(attributes
            .iter()
            .filter_map(|attribute| {
                mbean
                    .attributes
                    .get(attribute)
                    .filter(|entry| entry.readable)
                    .map(|entry| (attribute.clone(), entry.value.clone()))
            })
            .collect())
    }

    fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<JsonValue, StatsError> {
        let objects = self.lock()?;
        let mbean = objects.get(name).ok_or_else(|| instance_not_found(name))?;
        mbean
            .attributes
            .get(attribute)
            .filter(|entry| entry.readable)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| attribute_not_found(name, attribute))
    }

    fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        params: &[JsonValue],
    ) -> Result<JsonValue, StatsError> {
        if !params.is_empty() {
            return Err(StatsError::Reflection {
                message: format!("{operation} takes no parameters, got {}", params.len()),
            });
        }

        let mut objects = self.lock()?;
        let mbean = objects
            .get_mut(name)
            .ok_or_else(|| instance_not_found(name))?;
        let handler = mbean
            .operations
            .get(operation)
            .cloned()
            .ok_or_else(|| StatsError::Reflection {
                message: format!("no operation {operation} on {name}"),
            })?;

        let mut values: BTreeMap<String, JsonValue> = mbean
            .attributes
            .iter()
            .filter(|(_, entry)| entry.readable)
            .map(|(attribute, entry)| (attribute.clone(), entry.value.clone()))
            .collect();
        // Attribute updates stick even when the operation reports a failure.
        let result = handler(&mut values);
        for (attribute, value) in values {
            store(&mut mbean.attributes, attribute, value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name(text: &str) -> ObjectName {
        ObjectName::parse(text).expect("valid object name")
    }

    fn counter_bean() -> MBean {
        MBean::new()
            .with_attribute("hits", json!(7))
            .with_write_only_attribute("secret", json!("x"))
            .with_operation("resetStatistics", |attrs| {
                attrs.insert("hits".to_owned(), json!(0));
                Ok(JsonValue::Null)
            })
    }

    #[test]
    fn query_returns_matches_in_name_order() {
        let server = LocalServer::new();
        server.register(name("dom:type=Cache,name=b"), MBean::new()).expect("register");
        server.register(name("dom:type=Cache,name=a"), MBean::new()).expect("register");
        server.register(name("dom:type=channel,cluster=c"), MBean::new()).expect("register");

        let found = server.query_names(&name("dom:type=Cache,*")).expect("query");
        assert_eq!(found, vec![name("dom:type=Cache,name=a"), name("dom:type=Cache,name=b")]);
    }

    #[test]
    fn refuses_pattern_registration() {
        let server = LocalServer::new();
        let err = server.register(name("dom:type=*"), MBean::new()).expect_err("pattern");
        assert!(matches!(err, StatsError::InvalidName { .. }));
    }

    #[test]
    fn operations_update_attributes() {
        let server = LocalServer::new();
        let target = name("dom:type=Cache,name=a");
        server.register(target.clone(), counter_bean()).expect("register");

        server.invoke(&target, "resetStatistics", &[]).expect("invoke");
        assert_eq!(server.get_attribute(&target, "hits").expect("hits"), json!(0));
        assert!(matches!(
            server.invoke(&target, "missing", &[]),
            Err(StatsError::Reflection { .. })
        ));
    }

    #[test]
    fn write_only_attributes_are_not_readable() {
        let server = LocalServer::new();
        let target = name("dom:type=Cache,name=a");
        server.register(target.clone(), counter_bean()).expect("register");

        let info = server.attribute_info(&target).expect("info");
        assert!(info.contains(&AttributeInfo::write_only("secret")));
        assert!(matches!(
            server.get_attribute(&target, "secret"),
            Err(StatsError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn unregistered_objects_vanish() {
        let server = LocalServer::new();
        let target = name("dom:type=Cache,name=a");
        server.register(target.clone(), counter_bean()).expect("register");
        assert!(server.unregister(&target).expect("unregister"));
        assert!(matches!(
            server.attribute_info(&target),
            Err(StatsError::InstanceNotFound { .. })
        ));
        assert!(!server.unregister(&target).expect("unregister twice"));
    }
}
