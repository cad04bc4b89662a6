//! Adapter configuration.

use ormbridge_lang::CompileOptions;

use crate::naming::NamingStrategy;

/// Default database name.
pub const DEFAULT_DATABASE_NAME: &str = "ormbridge";

/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Database the collections live in.
    pub database_name: String,

    /// Model name to collection name mapping.
    pub naming: NamingStrategy,

    /// Query compiler settings.
    pub compile: CompileOptions,
}

impl AdapterConfig {
    /// Create a configuration for the given database.
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            naming: NamingStrategy::default(),
            compile: CompileOptions::default(),
        }
    }

    /// Set the naming strategy.
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Set the compiler options.
    pub fn with_compile_options(mut self, compile: CompileOptions) -> Self {
        self.compile = compile;
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormbridge_lang::DateSerialization;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.database_name, DEFAULT_DATABASE_NAME);
        assert!(matches!(config.naming, NamingStrategy::Kebab));
        assert_eq!(config.compile.date_serialization, DateSerialization::Native);
    }

    #[test]
    fn test_config_builder() {
        let config = AdapterConfig::new("app")
            .with_naming(NamingStrategy::Legacy)
            .with_compile_options(
                CompileOptions::default().with_date_serialization(DateSerialization::IsoString),
            );

        assert_eq!(config.database_name, "app");
        assert_eq!(config.naming.collection_name("My_Things"), "my-things");
        assert_eq!(config.compile.date_serialization, DateSerialization::IsoString);
    }
}
