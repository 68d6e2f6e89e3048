use serde::Deserialize;

const DEFAULT_INITIAL_TYPES: usize = 16;

/// How [`Bus::publish`](crate::Bus::publish) reacts to a failing handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Stop at the first handler error and return it. Panics unwind out of
    /// `publish` untouched.
    #[default]
    FailFast,
    /// Run every handler, trapping errors and panics, and report all of them
    /// together once delivery is complete.
    Isolate,
}

/// Bus construction settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub policy: DispatchPolicy,
    /// Number of message types the registry reserves room for up front.
    pub initial_types: usize,
}

impl BusConfig {
    #[must_use]
    pub const fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_initial_types(mut self, initial_types: usize) -> Self {
        self.initial_types = initial_types;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { policy: DispatchPolicy::default(), initial_types: DEFAULT_INITIAL_TYPES }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_fail_fast() {
        let config = BusConfig::default();
        assert_eq!(config.policy, DispatchPolicy::FailFast);
        assert_eq!(config.initial_types, DEFAULT_INITIAL_TYPES);
    }

    #[test]
    fn test_deserializes_partial_config() {
        let config: BusConfig =
            serde_json::from_value(json!({ "policy": "isolate" })).expect("config deserialize");
        assert_eq!(config.policy, DispatchPolicy::Isolate);
        assert_eq!(config.initial_types, DEFAULT_INITIAL_TYPES);
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let result = serde_json::from_value::<BusConfig>(json!({ "policy": "retry" }));
        assert!(result.is_err());
    }
}
