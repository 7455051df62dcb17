/// Errors returned by statistics accessors and management connections.
///
/// Fatal failures surface synchronously to the caller of the triggering
/// operation. The only tolerated kind is `NotSerializable` on a channel
/// reset, where the remote side effect has already happened.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("no management object matching template {template} found")]
    NotFound { template: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("instance not found: {name}")]
    InstanceNotFound { name: String },

    #[error("attribute {attribute} not found on {name}")]
    AttributeNotFound { name: String, attribute: String },

    #[error("result of {operation} is not serializable: {message}")]
    NotSerializable { operation: String, message: String },

    #[error("{name} is not ready: {attribute} = {value}")]
    NotReady {
        name: String,
        attribute: String,
        value: String,
    },

    #[error("invocation failed: {message}")]
    Reflection { message: String },

    #[error("invalid object name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<StatsError>,
    },

    #[error("timed out while waiting for {template} to become available ({attempts} attempts)")]
    Unavailable {
        template: String,
        attempts: u32,
        #[source]
        source: Box<StatsError>,
    },
}

impl StatsError {
    /// Returns `true` for failures that may clear up while the target starts.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::InstanceNotFound { .. }
                | Self::NotFound { .. }
                | Self::NotReady { .. }
        )
    }

    /// Returns `true` when only the acknowledgment of an invocation failed to marshal.
    pub fn is_not_serializable(&self) -> bool {
        matches!(self, Self::NotSerializable { .. })
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    /// The innermost cause, following retry and availability wrappers.
    pub fn root_cause(&self) -> &StatsError {
        match self {
            Self::RetryExhausted { source, .. } | Self::Unavailable { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_message_carries_template() {
        let err = StatsError::NotFound {
            template: "dom:type=Cache,name=\"users(*)\"".to_owned(),
        };
        assert!(err.to_string().contains("dom:type=Cache,name=\"users(*)\""));
    }

    #[test]
    fn unavailable_exposes_last_cause() {
        let err = StatsError::Unavailable {
            template: "dom:type=channel,*".to_owned(),
            attempts: 6,
            source: Box::new(StatsError::RetryExhausted {
                attempts: 6,
                source: Box::new(StatsError::transport("connection refused")),
            }),
        };
        assert!(err.source().is_some());
        assert_eq!(err.root_cause(), &StatsError::transport("connection refused"));
        assert!(err.root_cause().is_retryable());
    }
}
