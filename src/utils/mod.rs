//! Utility modules shared by pipelines, the watcher and the dev server.

pub mod glob;
pub mod mime;
pub mod path;
