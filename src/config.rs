use serde::Deserialize;

use crate::error::ConfigError;

/// Formatting knobs consulted by the line joiner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Maximum width of a kept one-liner. `None` leaves width to the renderer.
    pub column_limit: Option<usize>,
    /// Columns added per nesting level.
    pub indent_width: usize,
    /// Keep deliberate `header: body` one-liners on one line.
    pub join_multiple_lines: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            column_limit: None,
            indent_width: 4,
            join_multiple_lines: true,
        }
    }
}

impl FormatConfig {
    /// Parses a JSON object; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: FormatConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.column_limit == Some(0) {
            return Err(ConfigError::Invalid {
                field: "column_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.indent_width == 0 {
            return Err(ConfigError::Invalid {
                field: "indent_width",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
