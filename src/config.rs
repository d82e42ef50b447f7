//! Resolver configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Default name of the argument carrying write payloads.
pub const DEFAULT_INPUT_ARGUMENT: &str = "input";

/// Default result key answered with the type tag.
pub const DEFAULT_TYPENAME_FIELD: &str = "__typename";

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResolverConfig {
    /// Argument holding the write payload of mutation fields.
    pub input_argument: String,
    /// Result key resolved to the type tag on leaf fields.
    pub typename_field: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            input_argument: DEFAULT_INPUT_ARGUMENT.to_string(),
            typename_field: DEFAULT_TYPENAME_FIELD.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Load a config from JSON; omitted fields keep their defaults.
    ///
    /// # Errors
    /// - `Parse` if the text is not a valid config object
    /// - `EmptyField` if a field is set to the empty string
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable.
    ///
    /// # Errors
    /// `EmptyField` naming the first empty field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("input_argument", &self.input_argument),
            ("typename_field", &self.typename_field),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
