//! Inventory tree configuration

use serde::{Deserialize, Serialize};

/// Inventory tree configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Slot stack limit when an archetype does not set one
    pub default_max_stack_size: u32,
    /// Translation key used as title for unnamed inventories
    pub default_name: String,
    /// Catch panics raised inside listeners
    pub isolate_listener_panics: bool,
    /// Drop non-resident containers when their last viewer closes
    pub discard_idle_containers: bool,
    /// Offer the cursor stack back into the bottom inventory on discard
    pub return_cursor_on_discard: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_max_stack_size: 64,
            default_name: "inventory.name".to_string(),
            isolate_listener_panics: true,
            discard_idle_containers: true,
            return_cursor_on_discard: true,
        }
    }
}

impl InventoryConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default stack limit
    pub fn with_max_stack_size(mut self, max: u32) -> Self {
        self.default_max_stack_size = max.max(1);
        self
    }

    /// Keep containers alive after their last viewer closes
    pub fn keep_idle_containers(mut self) -> Self {
        self.discard_idle_containers = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InventoryConfig::default();
        assert_eq!(config.default_max_stack_size, 64);
        assert_eq!(config.default_name, "inventory.name");
        assert!(config.isolate_listener_panics);
        assert!(config.discard_idle_containers);
    }

    #[test]
    fn test_partial_json() {
        let config: InventoryConfig =
            serde_json::from_str(r#"{ "default_max_stack_size": 16, "discard_idle_containers": false }"#).unwrap();
        assert_eq!(config.default_max_stack_size, 16);
        assert!(!config.discard_idle_containers);
        assert_eq!(config.default_name, "inventory.name");
    }
}
