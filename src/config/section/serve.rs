//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port      = 3000            # HTTP port number
//! ws_port   = 35729           # Live reload WebSocket port
//! base_dir  = "."             # Directory served over HTTP
//! reload    = ["*.html", "dist/**/*.*"]
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::glob::GlobPattern;

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    pub port: u16,

    /// Port of the reload WebSocket.
    pub ws_port: u16,

    /// Served directory, relative to the project root.
    pub base_dir: PathBuf,

    /// Globs (relative to the project root) whose changes reload browsers.
    pub reload: Vec<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
            base_dir: PathBuf::from("."),
            reload: vec!["*.html".into(), "dist/**/*.*".into()],
        }
    }
}

impl ServeConfig {
    pub const PORT: FieldPath = FieldPath::new("serve.port");
    pub const RELOAD: FieldPath = FieldPath::new("serve.reload");

    pub fn reload_globs(&self) -> Result<Vec<GlobPattern>, globset::Error> {
        self.reload.iter().map(|raw| GlobPattern::new(raw)).collect()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == self.ws_port {
            diag.error_with_hint(
                Self::PORT,
                format!("HTTP and reload channel both use port {}", self.port),
                "set `serve.ws_port` to a different port",
            );
        }
        for raw in &self.reload {
            if let Err(err) = GlobPattern::new(raw) {
                diag.error(Self::RELOAD, format!("invalid glob `{raw}`: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nws_port = 8081\nbase_dir = \"public\"",
        );

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 8081);
        assert_eq!(config.serve.base_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.ws_port, 35729);
        assert_eq!(config.serve.reload, ["*.html", "dist/**/*.*"]);
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_port_clash_rejected() {
        let config = test_parse_config("[serve]\nport = 4000\nws_port = 4000");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, ServeConfig::PORT);
    }

    #[test]
    fn test_reload_globs_match_outputs() {
        let globs = ServeConfig::default().reload_globs().unwrap();
        let hit = |rel: &str| globs.iter().any(|g| g.is_match(rel));

        assert!(hit("index.html"));
        assert!(hit("dist/css/main.min.css"));
        assert!(hit("dist/images/icons/svg/symbol-defs.svg"));
        // Markup below the root is not a reload trigger
        assert!(!hit("pages/about.html"));
        assert!(!hit("assets/scss/main.scss"));
    }
}
