//! Embedded static resources.
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{RELOAD_JS, ReloadVars};
//!
//! let js = RELOAD_JS.render(&ReloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Path the dev server answers with the reload client.
    pub const RELOAD_JS_URL: &str = "/__assetflow/reload.js";

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Browser side of the reload channel.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("serve/reload.js"));

    /// `<script>` tag injected into served HTML pages.
    pub fn reload_script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_URL}"></script>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::serve::*;

    #[test]
    fn test_reload_js_port_substituted() {
        let js = RELOAD_JS.render(&ReloadVars { ws_port: 4567 });
        assert!(js.contains("4567"));
        assert!(!js.contains("__WS_PORT__"));
    }

    #[test]
    fn test_script_tag_points_at_served_path() {
        assert_eq!(
            reload_script_tag(),
            r#"<script src="/__assetflow/reload.js"></script>"#
        );
    }
}
