use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Configuration {
    config: HashMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            config: HashMap::new(),
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    pub fn get_string(&self, key: &str, default_value: &str) -> String {
        self.config
            .get(key)
            .cloned()
            .unwrap_or_else(|| default_value.to_string())
    }

    pub fn get_bool(&self, key: &str, default_value: bool) -> bool {
        self.config
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_value)
    }

    pub fn get_u64(&self, key: &str, default_value: u64) -> u64 {
        self.config
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_value)
    }
}

/// Engine policy knobs, resolved once from a [`Configuration`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Reject an `if` without a literal-true catch-all clause instead of
    /// warning about it.
    pub require_catch_all: bool,
    /// Whether `attrib` on an absent field aborts the run (the alternative
    /// yields null).
    pub missing_attribute_fatal: bool,
    /// Treat hitting the superstep limit as a flagged successful halt
    /// instead of a failure.
    pub deadline_best_effort: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            require_catch_all: false,
            missing_attribute_fatal: true,
            deadline_best_effort: false,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Configuration) -> Self {
        let defaults = Self::default();
        Self {
            require_catch_all: config
                .get_bool("program.require_catch_all", defaults.require_catch_all),
            missing_attribute_fatal: config.get_bool(
                "runtime.missing_attribute_fatal",
                defaults.missing_attribute_fatal,
            ),
            deadline_best_effort: config
                .get_bool("runtime.deadline_best_effort", defaults.deadline_best_effort),
        }
    }
}
