//! Named-table registry used to resolve `FROM <name>`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::table::Table;

#[derive(Default, Clone)]
pub struct Catalog {
    tables: HashMap<String, Arc<dyn Table>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` under its own name.
    pub fn register(&mut self, table: Arc<dyn Table>) {
        let name = table.name().to_string();
        self.register_as(name, table);
    }

    /// Register `table` under `name`, replacing any previous entry.
    pub fn register_as(&mut self, name: impl Into<String>, table: Arc<dyn Table>) {
        self.tables.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("tables", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::InMemoryTable;
    use serde_json::json;

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = Catalog::new();
        catalog.register(Arc::new(InMemoryTable::new("users", vec![json!({"a": 1})])));
        catalog.register_as("people", Arc::new(InMemoryTable::new("users", vec![])));

        assert!(catalog.contains("users"));
        assert!(catalog.contains("people"));
        assert!(!catalog.contains("orders"));
        assert_eq!(catalog.get("users").unwrap().name(), "users");
        assert_eq!(catalog.names(), vec!["people", "users"]);
    }
}
