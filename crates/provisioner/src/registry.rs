//! In-memory map of which tables to create in which database.

use crate::config::ProvisionConfig;

/// One database and the tables to create inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub name: String,
    pub tables: Vec<String>,
}

/// Ordered mapping from database name to table names.
///
/// Insertion order is kept so databases are provisioned in the order they
/// were declared (`env0`, `env1`, ... rather than lexical order).
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    databases: Vec<DatabaseSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `{prefix}0 .. {prefix}{count - 1}`, each holding `tables`.
    pub fn from_pattern(prefix: &str, count: usize, tables: &[String]) -> Self {
        let mut registry = Self::new();
        for n in 0..count {
            registry.insert(format!("{prefix}{n}"), tables.to_vec());
        }
        registry
    }

    pub fn from_config(config: &ProvisionConfig) -> Self {
        Self::from_pattern(
            &config.database_prefix,
            config.database_count,
            &config.tables,
        )
    }

    /// Adds a database, replacing the table list if it is already registered.
    pub fn insert(&mut self, database: impl Into<String>, tables: Vec<String>) -> &mut Self {
        let name = database.into();
        match self.databases.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.tables = tables,
            None => self.databases.push(DatabaseSchema { name, tables }),
        }
        self
    }

    pub fn get(&self, database: &str) -> Option<&[String]> {
        self.databases
            .iter()
            .find(|d| d.name == database)
            .map(|d| d.tables.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatabaseSchema> {
        self.databases.iter()
    }

    pub fn database_names(&self) -> impl Iterator<Item = &str> {
        self.databases.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Total number of tables across all databases.
    pub fn table_count(&self) -> usize {
        self.databases.iter().map(|d| d.tables.len()).sum()
    }
}
