//! Core types - pure abstractions shared across the codebase.

mod group;
mod state;

pub use group::AssetGroup;
pub use state::{is_shutdown, setup_shutdown_handler};
