//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! target = "es5"      # syntax level of the emitted script
//! suffix = ".min"
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::pipeline::ScriptTarget;

/// Script pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Lowest syntax level the output may use (`es5`, `es2015`, ...).
    pub target: String,

    pub suffix: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            target: "es5".into(),
            suffix: ".min".into(),
        }
    }
}

impl ScriptsConfig {
    pub const TARGET: FieldPath = FieldPath::new("scripts.target");

    pub fn script_target(&self) -> Result<ScriptTarget, String> {
        self.target.parse()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(err) = self.script_target() {
            diag.error_with_hint(
                Self::TARGET,
                format!("unknown target `{}`: {err}", self.target),
                "use an ECMAScript level such as `es5` or `es2015`",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_scripts_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.scripts.target, "es5");
        assert_eq!(config.scripts.suffix, ".min");
    }

    #[test]
    fn test_scripts_override() {
        let config = test_parse_config("[scripts]\ntarget = \"es2015\"\nsuffix = \".bundle\"");
        assert_eq!(config.scripts.target, "es2015");
        assert_eq!(config.scripts.suffix, ".bundle");
    }

    #[test]
    fn test_default_target_is_valid() {
        let mut diag = ConfigDiagnostics::new();
        ScriptsConfig::default().validate(&mut diag);
        assert!(diag.is_empty());
        assert!(ScriptsConfig::default().script_target().unwrap().is_es5());
    }

    #[test]
    fn test_unknown_target_reported() {
        let config = test_parse_config("[scripts]\ntarget = \"es1999\"");
        let mut diag = ConfigDiagnostics::new();
        config.scripts.validate(&mut diag);
        assert!(!diag.is_empty());
    }
}
