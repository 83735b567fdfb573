//! Configuration section definitions.
//!
//! Each module corresponds to a section in `assetflow.toml`:
//!
//! | Module    | TOML Section  | Purpose                                 |
//! |-----------|---------------|-----------------------------------------|
//! | `paths`   | `[paths.*]`   | Source / watch globs and destinations   |
//! | `styles`  | `[styles]`    | Minify and vendor-prefix options        |
//! | `scripts` | `[scripts]`   | Transpile target                        |
//! | `icons`   | `[icons]`     | Sprite name, symbol ids, svgo options   |
//! | `serve`   | `[serve]`     | Development server and reload channel   |

mod icons;
mod paths;
mod scripts;
mod serve;
mod styles;

pub use icons::{IconsConfig, STEM_PLACEHOLDER};
pub use paths::PathsConfig;
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use styles::StylesConfig;
