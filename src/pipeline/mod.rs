//! Asset pipelines.
//!
//! One pipeline per asset group, each a fixed chain of stages between a
//! source snapshot and the group's destination directory:
//!
//! ```text
//! styles:  init → sass → minify-css → autoprefix → rename → write
//! scripts: init → transpile → minify-js → rename → write
//! icons:   svg-sprite → svgo
//! ```
//!
//! `init`/`write` are the source-map stages. Files that fail a stage are
//! reported and skipped; the run itself only fails on I/O problems.

mod asset;
mod error;
mod es5;
mod icons;
mod scripts;
mod sourcemap;
mod stage;
mod styles;
mod svgo;


pub use asset::Asset;
pub use error::PipelineError;
pub use scripts::ScriptTarget;
pub use stage::Stage;
pub use svgo::SvgoOptions;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::core::AssetGroup;
use crate::{debug, log, logger};

/// The stage chain of one asset group.
#[derive(Debug, Clone)]
pub struct Pipeline {
    group: AssetGroup,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(group: AssetGroup, stages: Vec<Stage>) -> Self {
        Self { group, stages }
    }

    /// The configured chain for `group`.
    pub fn for_group(group: AssetGroup, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let stages = match group {
            AssetGroup::Styles => {
                let browsers = config
                    .styles
                    .targets()
                    .map_err(|message| PipelineError::Config { group, message })?;
                vec![
                    Stage::SourceMapsInit,
                    Stage::CompileSass,
                    Stage::MinifyCss {
                        restructure: config.styles.restructure,
                    },
                    Stage::Autoprefix {
                        browsers,
                        restructure: config.styles.restructure,
                    },
                    Stage::Rename {
                        suffix: config.styles.suffix.clone(),
                    },
                    Stage::SourceMapsWrite,
                ]
            }
            AssetGroup::Scripts => {
                let target = config
                    .scripts
                    .script_target()
                    .map_err(|message| PipelineError::Config { group, message })?;
                vec![
                    Stage::SourceMapsInit,
                    Stage::Transpile {
                        target: target.clone(),
                    },
                    Stage::MinifyJs { target },
                    Stage::Rename {
                        suffix: config.scripts.suffix.clone(),
                    },
                    Stage::SourceMapsWrite,
                ]
            }
            AssetGroup::Icons => vec![
                Stage::SvgSprite {
                    sprite: config.icons.sprite.clone(),
                    id: config.icons.id.clone(),
                },
                Stage::Svgo(SvgoOptions {
                    remove_title: config.icons.remove_title,
                    remove_view_box: config.icons.remove_view_box,
                    cleanup_ids: config.icons.cleanup_ids,
                }),
            ],
        };
        Ok(Self::new(group, stages))
    }

    /// Check ordering rules of the chain.
    ///
    /// Source-map init and write come as a pair; init precedes every stage
    /// that alters content and write is the last stage.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let order = |message: String| PipelineError::Order {
            group: self.group,
            message,
        };
        let positions = |wanted: fn(&Stage) -> bool| -> Vec<usize> {
            self.stages
                .iter()
                .enumerate()
                .filter(|(_, stage)| wanted(stage))
                .map(|(i, _)| i)
                .collect()
        };
        let inits = positions(|s| matches!(s, Stage::SourceMapsInit));
        let writes = positions(|s| matches!(s, Stage::SourceMapsWrite));

        match (inits.as_slice(), writes.as_slice()) {
            ([], []) => Ok(()),
            ([init], [write]) => {
                if let Some(stage) = self.stages[..*init].iter().find(|s| s.alters_content()) {
                    return Err(order(format!(
                        "`{}` runs before source-map tracking starts",
                        stage.name()
                    )));
                }
                if *write + 1 != self.stages.len() {
                    return Err(order("source-map write must be the last stage".into()));
                }
                Ok(())
            }
            _ => Err(order(
                "source-map init and write must each appear once, as a pair".into(),
            )),
        }
    }

    /// Run once: snapshot the source glob, apply every stage, write outputs.
    pub fn run(&self, config: &PipelineConfig) -> Result<BuildReport, PipelineError> {
        let started = Instant::now();
        let paths = config.paths.group(self.group);
        let glob = paths.source_glob().map_err(|source| PipelineError::Glob {
            pattern: paths.source.clone(),
            source,
        })?;

        let files = glob.snapshot(&config.root);
        if files.is_empty() {
            return Err(PipelineError::NoMatch {
                group: self.group,
                pattern: glob.as_str().to_string(),
            });
        }
        debug!(self.group.label(); "{} source file(s) match `{}`", files.len(), glob.as_str());

        let mut assets = Vec::with_capacity(files.len());
        for path in &files {
            let contents = fs::read_to_string(path).map_err(|source| PipelineError::Read {
                path: path.clone(),
                source,
            })?;
            let relative = glob.relative_to_base(&config.root, path);
            assets.push(Asset::new(path.clone(), relative, contents));
        }

        let mut errors = Vec::new();
        for stage in &self.stages {
            assets = stage.apply(assets, &mut errors);
            debug!(self.group.label(); "{}: {} file(s) left", stage.name(), assets.len());
        }

        let dest = config.root_join(&paths.dest);
        let written = write_outputs(&dest, &assets)?;

        Ok(BuildReport {
            group: self.group,
            matched: files.len(),
            written,
            errors,
            elapsed: started.elapsed(),
        })
    }
}

/// Write every asset below `dest`, creating directories as needed.
fn write_outputs(dest: &Path, assets: &[Asset]) -> Result<Vec<PathBuf>, PipelineError> {
    assets
        .iter()
        .map(|asset| {
            let path = dest.join(&asset.relative);
            let write_error = |source| PipelineError::Write {
                path: path.clone(),
                source,
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
            fs::write(&path, &asset.contents).map_err(write_error)?;
            Ok(path)
        })
        .collect()
}

/// Run the configured pipeline for `group` once.
pub fn run_group(group: AssetGroup, config: &PipelineConfig) -> Result<BuildReport, PipelineError> {
    Pipeline::for_group(group, config)?.run(config)
}

// ============================================================================
// Build report
// ============================================================================

/// Outcome of one pipeline invocation.
#[derive(Debug)]
pub struct BuildReport {
    pub group: AssetGroup,
    /// Files matched by the source glob.
    pub matched: usize,
    /// Absolute paths of written outputs.
    pub written: Vec<PathBuf>,
    /// Per-file source errors.
    pub errors: Vec<PipelineError>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn output_names(&self) -> String {
        self.written
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn error_detail(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Log the outcome of a one-shot run.
    pub fn log(&self) {
        let label = self.group.label();
        for err in &self.errors {
            log!("error"; "{err}");
        }
        log!(label; "wrote {} file(s) in {:?}", self.written.len(), self.elapsed);
        for path in &self.written {
            debug!(label; "{}", path.display());
        }
    }

    /// Show the outcome of a watch-triggered rebuild in the status block.
    pub fn show_status(&self) {
        let label = self.group.label();
        if !self.is_clean() {
            logger::status_error(&format!("{label} failed"), &self.error_detail());
        } else if self.written.is_empty() {
            logger::status_warning(&format!("{label}: no output"));
        } else {
            logger::status_success(&format!("rebuilt {label}: {}", self.output_names()));
        }
    }
}
