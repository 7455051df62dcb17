use std::sync::OnceLock;

use crate::connection::ManagementConnection;
use crate::error::StatsError;
use crate::name::ObjectName;

/// Resolves a name template to one concrete object name and remembers it.
///
/// Once populated the resolved name is never re-queried or invalidated.
/// Two threads racing on an empty cell may both query; resolution is
/// idempotent, so the loser's result is dropped and the first stored name
/// wins.
#[derive(Debug)]
pub struct NameResolver {
    template: ObjectName,
    resolved: OnceLock<ObjectName>,
}

impl NameResolver {
    pub fn new(template: ObjectName) -> Self {
        Self {
            template,
            resolved: OnceLock::new(),
        }
    }

    pub fn template(&self) -> &ObjectName {
        &self.template
    }

    /// The memoized name, if a resolution has succeeded.
    pub fn resolved(&self) -> Option<&ObjectName> {
        self.resolved.get()
    }

    /// Returns the first name the connection reports for the template.
    ///
    /// Several matches are tolerated; which one is picked follows the
    /// connection's iteration order.
    pub fn resolve<C>(&self, connection: &C) -> Result<ObjectName, StatsError>
    where
        C: ManagementConnection + ?Sized,
    {
        if let Some(name) = self.resolved.get() {
            return Ok(name.clone());
        }

        let matches = connection.query_names(&self.template)?;
        let Some(first) = matches.into_iter().next() else {
            return Err(StatsError::NotFound {
                template: self.template.to_string(),
            });
        };
        log::debug!("resolved {} to {first}", self.template);

        Ok(self.resolved.get_or_init(|| first).clone())
    }
}
