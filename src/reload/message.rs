//! Reload channel messages.
//!
//! JSON objects tagged by `type`, sent from the server to browsers:
//!
//! ```json
//! {"type":"connected","version":"0.1.0"}
//! {"type":"reload","reason":"dist/css/main.min.css"}
//! ```

use serde::{Deserialize, Serialize};

/// Message pushed over the reload WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Full page reload
    Reload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Sent once after the handshake
    Connected { version: String },
}

impl HotReloadMessage {
    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
