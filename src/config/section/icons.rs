//! `[icons]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [icons]
//! sprite          = "symbol-defs.svg"
//! id              = "icon-%f"     # %f is replaced by the file stem
//! remove_title    = true
//! remove_view_box = false
//! cleanup_ids     = false
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Placeholder for the source file stem in `id`.
pub const STEM_PLACEHOLDER: &str = "%f";

/// Icon sprite options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconsConfig {
    /// File name of the sprite written to the destination.
    pub sprite: String,

    /// Symbol id template.
    pub id: String,

    /// Strip `<title>` elements.
    pub remove_title: bool,

    /// Strip `viewBox` attributes.
    pub remove_view_box: bool,

    /// Drop ids nothing in the document references.
    pub cleanup_ids: bool,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            sprite: "symbol-defs.svg".into(),
            id: "icon-%f".into(),
            remove_title: true,
            remove_view_box: false,
            cleanup_ids: false,
        }
    }
}

impl IconsConfig {
    pub const SPRITE: FieldPath = FieldPath::new("icons.sprite");
    pub const ID: FieldPath = FieldPath::new("icons.id");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.id.contains(STEM_PLACEHOLDER) {
            diag.error_with_hint(
                Self::ID,
                "id template never varies, every symbol would share one id",
                "include `%f`, e.g. `icon-%f`",
            );
        }
        if self.sprite.is_empty() || self.sprite.contains(['/', '\\']) {
            diag.error(Self::SPRITE, "must be a plain file name");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_icons_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.icons.sprite, "symbol-defs.svg");
        assert_eq!(config.icons.id, "icon-%f");
        assert!(config.icons.remove_title);
        assert!(!config.icons.remove_view_box);
        assert!(!config.icons.cleanup_ids);
    }

    #[test]
    fn test_constant_id_rejected() {
        let config = IconsConfig {
            id: "icon".into(),
            ..IconsConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, IconsConfig::ID);
    }

    #[test]
    fn test_sprite_with_directory_rejected() {
        let config = IconsConfig {
            sprite: "nested/sprite.svg".into(),
            ..IconsConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.errors()[0].field, IconsConfig::SPRITE);
    }
}
