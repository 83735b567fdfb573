//! Pipeline stages.
//!
//! A stage maps the list of assets to a new list. Most stages work per file;
//! `SvgSprite` folds every asset into one.

use std::path::PathBuf;

use lightningcss::targets::Browsers;
use rustc_hash::FxHashSet;

use super::asset::Asset;
use super::error::PipelineError;
use super::icons::{self, Icon};
use super::scripts::{self, ScriptTarget};
use super::sourcemap::{CommentStyle, SourceMapTrack, append_inline};
use super::styles;
use super::svgo::{self, SvgoOptions};
use crate::config::section::STEM_PLACEHOLDER;

/// One ordered transformation step.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Start recording source maps.
    SourceMapsInit,
    /// Sass to CSS; partials are dropped.
    CompileSass,
    MinifyCss { restructure: bool },
    /// Vendor prefixes for the resolved browser matrix. Rules are only
    /// merged when `restructure` is set.
    Autoprefix {
        browsers: Option<Browsers>,
        restructure: bool,
    },
    /// Lower script syntax to `target`.
    Transpile { target: ScriptTarget },
    /// Minify without raising the syntax level above `target`.
    MinifyJs { target: ScriptTarget },
    Rename { suffix: String },
    /// Embed the recorded source map.
    SourceMapsWrite,
    /// Fold all icons into one sprite file.
    SvgSprite { sprite: String, id: String },
    Svgo(SvgoOptions),
}

impl Stage {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SourceMapsInit => "sourcemaps-init",
            Self::CompileSass => "sass",
            Self::MinifyCss { .. } => "minify-css",
            Self::Autoprefix { .. } => "autoprefix",
            Self::Transpile { .. } => "transpile",
            Self::MinifyJs { .. } => "minify-js",
            Self::Rename { .. } => "rename",
            Self::SourceMapsWrite => "sourcemaps-write",
            Self::SvgSprite { .. } => "svg-sprite",
            Self::Svgo(_) => "svgo",
        }
    }

    /// Whether the stage rewrites file contents.
    pub const fn alters_content(&self) -> bool {
        !matches!(
            self,
            Self::SourceMapsInit | Self::Rename { .. } | Self::SourceMapsWrite
        )
    }

    /// Apply the stage. Files that fail are reported in `errors` and left out.
    pub fn apply(&self, assets: Vec<Asset>, errors: &mut Vec<PipelineError>) -> Vec<Asset> {
        match self {
            Self::SvgSprite { sprite, id } => match sprite_assets(assets, sprite, id, errors) {
                Ok(asset) => asset.into_iter().collect(),
                Err(err) => {
                    errors.push(err);
                    Vec::new()
                }
            },
            _ => assets
                .into_iter()
                .filter_map(|asset| match self.apply_one(asset) {
                    Ok(asset) => asset,
                    Err(err) => {
                        errors.push(err);
                        None
                    }
                })
                .collect(),
        }
    }

    /// Per-file stages. `Ok(None)` drops the file without an error.
    fn apply_one(&self, mut asset: Asset) -> Result<Option<Asset>, PipelineError> {
        let fail = |asset: &Asset, message: String| PipelineError::in_file(&asset.source, message);
        let filename = asset.file_name();

        match self {
            Self::SourceMapsInit => {
                let name = asset.relative.to_string_lossy().replace('\\', "/");
                asset.source_map = Some(SourceMapTrack::new(name, asset.contents.clone()));
            }
            Self::CompileSass => {
                if styles::is_partial(&asset.source) {
                    return Ok(None);
                }
                let css = styles::compile_sass(&asset.contents, &asset.source)
                    .map_err(|e| fail(&asset, e))?;
                asset.update(css, None);
                asset.set_extension("css");
            }
            Self::MinifyCss { restructure } => {
                let (css, map) = styles::minify_css(&asset.contents, &filename, *restructure)
                    .map_err(|e| fail(&asset, e))?;
                asset.update(css, map);
            }
            Self::Autoprefix {
                browsers,
                restructure,
            } => {
                let (css, map) =
                    styles::autoprefix(&asset.contents, &filename, *browsers, *restructure)
                        .map_err(|e| fail(&asset, e))?;
                asset.update(css, map);
            }
            Self::Transpile { target } => {
                let (js, map) = scripts::transpile(&asset.contents, &asset.relative, target)
                    .map_err(|e| fail(&asset, e))?;
                asset.update(js, map);
            }
            Self::MinifyJs { target } => {
                let (js, map) = scripts::minify_js(&asset.contents, &filename, target)
                    .map_err(|e| fail(&asset, e))?;
                asset.update(js, map);
            }
            Self::Rename { suffix } => asset.add_suffix(suffix),
            Self::SourceMapsWrite => {
                if let Some(track) = asset.source_map.take() {
                    if !track.is_mapped() {
                        crate::debug!("sourcemap"; "{}: no mappings, a stage produced no map", asset.file_name());
                    }
                    let map = track.finalize(&asset.file_name());
                    let style = CommentStyle::for_extension(asset.extension());
                    append_inline(&mut asset.contents, &map, style);
                }
            }
            Self::Svgo(options) => {
                let svg = svgo::optimize(&asset.contents, *options)
                    .map_err(|e| fail(&asset, format!("{e:#}")))?;
                asset.update(svg, None);
            }
            // Folded in `apply`
            Self::SvgSprite { .. } => {}
        }
        Ok(Some(asset))
    }
}

/// Fold icons into one sprite asset, ordered by symbol id.
///
/// A second icon mapping to an existing id is reported and skipped. Any
/// malformed icon means no sprite is produced for this run.
fn sprite_assets(
    assets: Vec<Asset>,
    sprite: &str,
    id_template: &str,
    errors: &mut Vec<PipelineError>,
) -> Result<Option<Asset>, PipelineError> {
    let Some(first) = assets.first() else {
        return Ok(None);
    };
    let source = first.source.clone();

    let mut named: Vec<(String, &Asset)> = assets
        .iter()
        .map(|asset| {
            let stem = asset
                .relative
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (id_template.replace(STEM_PLACEHOLDER, &stem), asset)
        })
        .collect();
    named.sort_by(|a, b| a.0.cmp(&b.0));

    let mut seen = FxHashSet::default();
    let mut entries = Vec::with_capacity(named.len());
    for (id, asset) in named {
        if !seen.insert(id.clone()) {
            errors.push(PipelineError::in_file(
                &asset.source,
                format!("duplicate symbol id `{id}`"),
            ));
            continue;
        }
        entries.push((asset, Icon { id, svg: &asset.contents }));
    }

    // Check each icon alone first so the error names the file
    for (asset, icon) in &entries {
        if let Err(err) = icons::build_sprite(std::slice::from_ref(icon)) {
            return Err(PipelineError::in_file(&asset.source, format!("{err:#}")));
        }
    }

    let symbols: Vec<Icon<'_>> = entries.into_iter().map(|(_, icon)| icon).collect();
    let contents = icons::build_sprite(&symbols)
        .map_err(|err| PipelineError::in_file(&source, format!("{err:#}")))?;

    Ok(Some(Asset::new(source, PathBuf::from(sprite), contents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, contents: &str) -> Asset {
        Asset::new(
            PathBuf::from("/site/assets").join(name),
            PathBuf::from(name),
            contents.to_string(),
        )
    }

    #[test]
    fn test_alters_content() {
        assert!(!Stage::SourceMapsInit.alters_content());
        assert!(!Stage::SourceMapsWrite.alters_content());
        assert!(!Stage::Rename { suffix: ".min".into() }.alters_content());
        assert!(Stage::CompileSass.alters_content());
        let target: ScriptTarget = "es5".parse().unwrap();
        assert!(Stage::MinifyJs { target }.alters_content());
    }

    #[test]
    fn test_compile_sass_drops_partials_silently() {
        let mut errors = Vec::new();
        let out = Stage::CompileSass.apply(
            vec![asset("_reset.scss", "a { b: c }"), asset("main.scss", "a { b: c }")],
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative, PathBuf::from("main.css"));
    }

    #[test]
    fn test_source_error_drops_only_that_file() {
        let mut errors = Vec::new();
        let out = Stage::CompileSass.apply(
            vec![asset("bad.scss", "a { color: red"), asset("good.scss", "a { b: c }")],
            &mut errors,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], PipelineError::Source { .. }));
        assert!(errors[0].to_string().contains("bad.scss"));
    }

    #[test]
    fn test_sourcemaps_write_without_init_is_noop() {
        let mut errors = Vec::new();
        let out = Stage::SourceMapsWrite.apply(vec![asset("app.js", "var a;")], &mut errors);
        assert_eq!(out[0].contents, "var a;");
    }

    #[test]
    fn test_sprite_duplicate_ids_reported() {
        let mut errors = Vec::new();
        let stage = Stage::SvgSprite {
            sprite: "symbol-defs.svg".into(),
            id: "icon-%f".into(),
        };
        let out = stage.apply(
            vec![
                asset("home.svg", "<svg viewBox=\"0 0 1 1\"/>"),
                asset("nested/home.svg", "<svg viewBox=\"0 0 2 2\"/>"),
            ],
            &mut errors,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(out[0].contents.matches("<symbol").count(), 1);
    }

    #[test]
    fn test_sprite_malformed_icon_yields_nothing() {
        let mut errors = Vec::new();
        let stage = Stage::SvgSprite {
            sprite: "symbol-defs.svg".into(),
            id: "icon-%f".into(),
        };
        let out = stage.apply(
            vec![
                asset("ok.svg", "<svg viewBox=\"0 0 1 1\"/>"),
                asset("broken.svg", "<svg><g>"),
            ],
            &mut errors,
        );
        assert!(out.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("broken.svg"));
    }

    #[test]
    fn test_sprite_of_nothing_is_nothing() {
        let mut errors = Vec::new();
        let stage = Stage::SvgSprite {
            sprite: "symbol-defs.svg".into(),
            id: "icon-%f".into(),
        };
        assert!(stage.apply(Vec::new(), &mut errors).is_empty());
        assert!(errors.is_empty());
    }
}
