//! In-memory file flowing through a stage chain.

use std::path::PathBuf;

use super::sourcemap::SourceMapTrack;

/// One file between read and write.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Absolute path of the file this asset was read from.
    pub source: PathBuf,
    /// Output path relative to the destination directory.
    pub relative: PathBuf,
    pub contents: String,
    /// Present once source-map tracking has started.
    pub source_map: Option<SourceMapTrack>,
}

impl Asset {
    pub fn new(source: PathBuf, relative: PathBuf, contents: String) -> Self {
        Self {
            source,
            relative,
            contents,
            source_map: None,
        }
    }

    /// Output file name, e.g. `main.min.css`.
    pub fn file_name(&self) -> String {
        self.relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|ext| ext.to_str())
    }

    /// Replace the contents with a stage's output and the map for that step.
    ///
    /// Without a map, tracking can no longer point into the original.
    pub fn update(&mut self, contents: String, map: Option<String>) {
        self.contents = contents;
        if let Some(track) = self.source_map.as_mut() {
            track.record(map.as_deref());
        }
    }

    pub fn set_extension(&mut self, ext: &str) {
        self.relative.set_extension(ext);
    }

    /// Insert `suffix` between stem and extension.
    pub fn add_suffix(&mut self, suffix: &str) {
        let stem = self
            .relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.extension() {
            Some(ext) => format!("{stem}{suffix}.{ext}"),
            None => format!("{stem}{suffix}"),
        };
        self.relative.set_file_name(name);
    }
}
