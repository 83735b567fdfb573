//! Asset group identity.

use std::fmt;

/// A category of source files sharing one pipeline and one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetGroup {
    Styles,
    Scripts,
    Icons,
}

impl AssetGroup {
    /// Every group, in registry order.
    pub const ALL: [Self; 3] = [Self::Styles, Self::Scripts, Self::Icons];

    /// Human-readable label, also used as the log prefix.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Icons => "icons",
        }
    }
}

impl fmt::Display for AssetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_label() {
        assert_eq!(AssetGroup::Icons.to_string(), "icons");
    }
}
