//! Shared key/value store for passing values between test steps.

use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct ParameterStore {
    values: RwLock<HashMap<String, String>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, returning the value it replaced.
    pub fn set(&self, name: &str, value: &str) -> Option<String> {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}
