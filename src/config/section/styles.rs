//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! browsers    = ["last 2 versions", "iOS 7"]   # browserslist query
//! restructure = false                          # keep rule order as written
//! suffix      = ".min"                         # main.css -> main.min.css
//! ```

use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Stylesheet pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Browser support matrix for vendor prefixes.
    pub browsers: Vec<String>,

    /// Allow the minifier to merge and reorder rules.
    pub restructure: bool,

    /// Marker inserted before the output extension.
    pub suffix: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["last 2 versions".into(), "iOS 7".into()],
            restructure: false,
            suffix: ".min".into(),
        }
    }
}

impl StylesConfig {
    pub const BROWSERS: FieldPath = FieldPath::new("styles.browsers");

    /// Resolve the browserslist query into lightningcss targets.
    pub fn targets(&self) -> Result<Option<Browsers>, String> {
        Browsers::from_browserslist(self.browsers.iter()).map_err(|err| err.to_string())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match self.targets() {
            Ok(Some(_)) => {}
            Ok(None) => diag.error(Self::BROWSERS, "query matches no browsers"),
            Err(err) => diag.error_with_hint(
                Self::BROWSERS,
                format!("invalid browser query: {err}"),
                "see https://browsersl.ist for the query syntax",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_styles_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.styles.browsers, ["last 2 versions", "iOS 7"]);
        assert!(!config.styles.restructure);
        assert_eq!(config.styles.suffix, ".min");
    }

    #[test]
    fn test_default_query_resolves() {
        let browsers = StylesConfig::default().targets().unwrap().unwrap();
        // iOS 7 is explicitly listed
        assert!(browsers.ios_saf.is_some());
    }

    #[test]
    fn test_invalid_query_reported() {
        let config = StylesConfig {
            browsers: vec!["netscape 4".into()],
            ..StylesConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, StylesConfig::BROWSERS);
    }
}
