//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::ConfigurationStyle;
    use crate::core::NamingConvention;
    use crate::error::GenError;

    #[test]
    fn test_from_yaml_with_defaults() {
        let yaml = r#"
connection:
  type: mssql
  host: db.internal
  database: Shop
  user: sa
  password: secret
generation:
  namespace: Shop.Data
  context_name: ShopContext
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.connection.port, None);
        assert!(config.connection.encrypt);
        assert_eq!(
            config.generation.naming_convention,
            NamingConvention::WordCapitalized
        );
        assert_eq!(
            config.generation.configuration_style,
            ConfigurationStyle::AnnotationBased
        );
        assert_eq!(config.generation.output_dir, Path::new("generated"));
    }

    #[test]
    fn test_from_yaml_accepts_legacy_spellings() {
        let yaml = r#"
connection:
  type: sqlite
  database: shop.db
generation:
  namespace: Shop
  context_name: ShopContext
  naming_convention: original
  configuration_style: fluent_api
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.generation.naming_convention, NamingConvention::Verbatim);
        assert_eq!(
            config.generation.configuration_style,
            ConfigurationStyle::BuilderBased
        );
    }

    #[test]
    fn test_from_yaml_unsupported_type() {
        let yaml = r#"
connection:
  type: oracle
  host: db
  database: shop
  user: app
generation:
  namespace: Shop
  context_name: ShopContext
"#;
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(GenError::UnsupportedDialect(_))
        ));
    }

    #[test]
    fn test_from_yaml_invalid() {
        assert!(matches!(
            Config::from_yaml("connection: ["),
            Err(GenError::Yaml(_))
        ));
    }
}
