//! Script stages: syntax lowering and minification.
//!
//! Uses oxc for both. Each stage parses its input afresh, so the two can be
//! reordered or used alone. oxc stops at ES2015; for an `es5` target the
//! output is passed through [`es5::lower`] as well.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{Engine, EngineTargets, EnvOptions, TransformOptions, Transformer};

use super::es5;
use super::sourcemap;

/// Syntax level scripts are lowered to, parsed from an oxc target query
/// such as `es2015` or `chrome80,safari13`, or `es5`.
#[derive(Debug, Clone)]
pub struct ScriptTarget {
    engines: EngineTargets,
    es5: bool,
}

impl FromStr for ScriptTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("es5") {
            // Below es2015 every ES feature counts as unsupported
            let mut engines = EngineTargets::from_target("es2015")?;
            if let Some(version) = engines.get_mut(&Engine::Es) {
                version.0 = 5;
            }
            return Ok(Self { engines, es5: true });
        }
        Ok(Self {
            engines: EngineTargets::from_target(s)?,
            es5: false,
        })
    }
}

impl ScriptTarget {
    pub fn is_es5(&self) -> bool {
        self.es5
    }

    fn transform_options(&self) -> TransformOptions {
        let mut options = TransformOptions {
            env: EnvOptions::from(self.engines.clone()),
            ..TransformOptions::default()
        };
        options.assumptions.set_public_class_fields = true;
        options
    }

    fn compress_options(&self) -> CompressOptions {
        CompressOptions {
            target: self.engines.clone(),
            ..CompressOptions::smallest()
        }
    }

    /// Run the ES5 pass over `code` for an `es5` target, composing its map
    /// onto `map`.
    fn finish(
        &self,
        code: String,
        map: Option<String>,
        filename: &str,
    ) -> Result<(String, Option<String>), String> {
        if !self.is_es5() {
            return Ok((code, map));
        }
        let (code, lowered) = es5::lower(&code, filename)?;
        let map = map.and_then(|map| sourcemap::compose(&map, &lowered));
        Ok((code, map))
    }
}

/// Lower `source` to `target`, returning the code and a source map for it.
pub fn transpile(
    source: &str,
    path: &Path,
    target: &ScriptTarget,
) -> Result<(String, Option<String>), String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(render_diagnostics(ret.errors, source));
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let options = target.transform_options();
    let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        return Err(render_diagnostics(ret.errors, source));
    }

    let output = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: Some(path.to_path_buf()),
            ..CodegenOptions::default()
        })
        .build(&program);
    let filename = path.to_string_lossy();
    target.finish(
        output.code,
        output.map.map(|map| map.to_json_string()),
        &filename,
    )
}

/// Minify and mangle, returning the code and a source map for it.
///
/// The minifier prints shorthand properties whatever the target, so an
/// `es5` target is lowered again afterwards.
pub fn minify_js(
    source: &str,
    filename: &str,
    target: &ScriptTarget,
) -> Result<(String, Option<String>), String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(render_diagnostics(ret.errors, source));
    }
    let mut program = ret.program;

    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(target.compress_options()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let output = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            source_map_path: Some(PathBuf::from(filename)),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program);

    target.finish(
        output.code,
        output.map.map(|map| map.to_json_string()),
        filename,
    )
}

/// Render parser/transformer diagnostics with source context.
pub(super) fn render_diagnostics(errors: Vec<OxcDiagnostic>, source: &str) -> String {
    errors
        .into_iter()
        .map(|err| format!("{:?}", err.with_source_code(source.to_owned())))
        .collect::<Vec<_>>()
        .join("\n")
}
