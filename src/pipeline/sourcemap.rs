//! Source-map tracking and inline emission.
//!
//! Tracking starts at `SourceMapsInit`, which remembers the original file
//! name and text. Every later stage that rewrites the contents reports the
//! map for its own step, and that map is composed onto the chain so far. A
//! stage without a map breaks the chain: from then on the emitted map keeps
//! the original text but carries no mappings. `SourceMapsWrite` appends the
//! result as a base64 data URL.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parcel_sourcemap::SourceMap;
use serde_json::{Value, json};

/// Root handed to parcel_sourcemap; source names stay relative.
const PROJECT_ROOT: &str = "/";

/// Source-map state carried by one asset.
#[derive(Debug, Clone)]
pub struct SourceMapTrack {
    /// Original file name relative to the source glob base, `/`-separated.
    source_name: String,
    source_content: String,
    chain: Chain,
}

#[derive(Debug, Clone)]
enum Chain {
    /// Contents are still the original text.
    Identity,
    /// Maps the current contents back to the original text.
    Mapped(SourceMap),
    /// A stage rewrote the contents without a map.
    Broken,
}

impl SourceMapTrack {
    pub fn new(source_name: impl Into<String>, source_content: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            source_content: source_content.into(),
            chain: Chain::Identity,
        }
    }

    /// Compose the map of one rewriting step onto the chain.
    ///
    /// `map` describes the new contents in terms of the previous contents.
    /// `None` means the step has no map.
    pub fn record(&mut self, map: Option<&str>) {
        let step = map.and_then(|raw| self.parse_step(raw));
        self.chain = match (std::mem::replace(&mut self.chain, Chain::Broken), step) {
            (Chain::Broken, _) | (_, None) => Chain::Broken,
            (Chain::Identity, Some(step)) => Chain::Mapped(step),
            (Chain::Mapped(mut previous), Some(mut step)) => match step.extends(&mut previous) {
                Ok(()) => Chain::Mapped(step),
                Err(err) => {
                    crate::debug!("sourcemap"; "{}: cannot compose maps: {err}", self.source_name);
                    Chain::Broken
                }
            },
        };
    }

    /// Whether the chain still maps back to the original text.
    pub fn is_mapped(&self) -> bool {
        !matches!(self.chain, Chain::Broken)
    }

    /// Parse a step map, renaming its single input to the tracked source so
    /// composed maps never collect intermediate names.
    fn parse_step(&self, raw: &str) -> Option<SourceMap> {
        parse_renamed(raw, &self.source_name)
    }

    /// Final map JSON for an output named `file`.
    pub fn finalize(&self, file: &str) -> String {
        let mut map = match &self.chain {
            Chain::Mapped(map) => map
                .clone()
                .to_json(None)
                .ok()
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok()),
            Chain::Identity | Chain::Broken => None,
        }
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({ "version": 3, "names": [], "mappings": "" }));

        if let Some(object) = map.as_object_mut() {
            object.insert("file".into(), json!(file));
            object.insert("sources".into(), json!([self.source_name]));
            object.insert("sourcesContent".into(), json!([self.source_content]));
            object.remove("sourceRoot");
        }
        map.to_string()
    }
}

/// Parse `raw` with every source renamed to `source_name`.
fn parse_renamed(raw: &str, source_name: &str) -> Option<SourceMap> {
    let mut value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object_mut()?;
    let sources = object.get("sources").and_then(Value::as_array).map_or(0, Vec::len);
    object.insert("sources".into(), json!(vec![source_name; sources]));
    object.remove("sourcesContent");
    object.entry("names").or_insert_with(|| json!([]));
    SourceMap::from_json(PROJECT_ROOT, &value.to_string()).ok()
}

/// Map from the output of `second` back to the input of `first`, for two
/// steps run one after the other inside a single stage.
pub fn compose(first: &str, second: &str) -> Option<String> {
    let name = serde_json::from_str::<Value>(first)
        .ok()?
        .get("sources")?
        .get(0)?
        .as_str()?
        .to_owned();
    let mut first = parse_renamed(first, &name)?;
    let mut second = parse_renamed(second, &name)?;
    if let Err(err) = second.extends(&mut first) {
        crate::debug!("sourcemap"; "{name}: cannot compose maps: {err}");
        return None;
    }
    second.to_json(None).ok()
}

/// Comment syntax of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/*# sourceMappingURL=... */`
    Block,
    /// `//# sourceMappingURL=...`
    Line,
}

impl CommentStyle {
    pub fn for_extension(ext: Option<&str>) -> Self {
        match ext {
            Some("js" | "mjs" | "cjs") => Self::Line,
            _ => Self::Block,
        }
    }
}

/// Append `map` to `contents` as an inline data URL comment.
pub fn append_inline(contents: &mut String, map: &str, style: CommentStyle) {
    let url = format!(
        "data:application/json;charset=utf8;base64,{}",
        STANDARD.encode(map)
    );
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    match style {
        CommentStyle::Block => contents.push_str(&format!("/*# sourceMappingURL={url} */\n")),
        CommentStyle::Line => contents.push_str(&format!("//# sourceMappingURL={url}\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_sourcemap::OriginalLocation;

    /// One-source map with the given `(gen_line, gen_col, orig_line, orig_col)` points.
    fn step(input: &str, points: &[(u32, u32, u32, u32)]) -> String {
        let mut map = SourceMap::new(PROJECT_ROOT);
        map.add_source(input);
        for &(gen_line, gen_col, orig_line, orig_col) in points {
            map.add_mapping(
                gen_line,
                gen_col,
                Some(OriginalLocation::new(orig_line, orig_col, 0, None)),
            );
        }
        map.to_json(None).unwrap()
    }

    fn mappings_of(json: &str) -> Vec<(u32, u32, u32, u32)> {
        let mut map = SourceMap::from_json(PROJECT_ROOT, json).unwrap();
        map.get_mappings()
            .into_iter()
            .filter_map(|m| {
                m.original.map(|o| {
                    (m.generated_line, m.generated_column, o.original_line, o.original_column)
                })
            })
            .collect()
    }

    #[test]
    fn test_finalize_without_map() {
        let track = SourceMapTrack::new("main.scss", "a { b: c }");
        let map: Value = serde_json::from_str(&track.finalize("main.min.css")).unwrap();

        assert_eq!(map["version"], 3);
        assert_eq!(map["file"], "main.min.css");
        assert_eq!(map["sources"], json!(["main.scss"]));
        assert_eq!(map["sourcesContent"], json!(["a { b: c }"]));
        assert_eq!(map["mappings"], "");
    }

    #[test]
    fn test_single_step_keeps_positions() {
        let mut track = SourceMapTrack::new("app.js", "let a = 1;");
        track.record(Some(&step("<stdin>", &[(0, 0, 0, 0), (0, 4, 0, 8)])));
        let json = track.finalize("app.min.js");
        let map: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(map["sources"], json!(["app.js"]));
        assert!(map.get("sourceRoot").is_none());
        assert_eq!(mappings_of(&json), vec![(0, 0, 0, 0), (0, 4, 0, 8)]);
    }

    #[test]
    fn test_steps_compose_back_to_original() {
        let mut track = SourceMapTrack::new("main.css", ".a{}\n\n\n.b{}\n");
        // Step one: `.b` moved from line 3 to line 1
        track.record(Some(&step("main.css", &[(0, 0, 0, 0), (1, 0, 3, 0)])));
        // Step two: everything on one line, `.b` at column 4
        track.record(Some(&step("intermediate.css", &[(0, 0, 0, 0), (0, 4, 1, 0)])));

        let json = track.finalize("main.min.css");
        assert_eq!(mappings_of(&json), vec![(0, 0, 0, 0), (0, 4, 3, 0)]);
        let map: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(map["sources"], json!(["main.css"]));
    }

    #[test]
    fn test_compose_within_stage() {
        let first = step("app.js", &[(0, 0, 2, 0), (1, 0, 5, 2)]);
        let second = step("app.js", &[(0, 0, 1, 0)]);
        let composed = compose(&first, &second).unwrap();
        assert_eq!(mappings_of(&composed), vec![(0, 0, 5, 2)]);
    }

    #[test]
    fn test_unmapped_step_breaks_chain() {
        let mut track = SourceMapTrack::new("main.scss", "$a: 1;");
        track.record(None);
        track.record(Some(&step("main.css", &[(0, 0, 0, 0)])));

        assert!(!track.is_mapped());
        let map: Value = serde_json::from_str(&track.finalize("main.min.css")).unwrap();
        assert_eq!(map["mappings"], "");
        assert_eq!(map["sourcesContent"], json!(["$a: 1;"]));
    }

    #[test]
    fn test_unparsable_step_breaks_chain() {
        let mut track = SourceMapTrack::new("app.js", "");
        track.record(Some("not json"));
        assert!(!track.is_mapped());
    }

    #[test]
    fn test_append_inline_css() {
        let mut css = String::from("a{color:red}");
        append_inline(&mut css, "{}", CommentStyle::Block);
        assert!(css.starts_with("a{color:red}\n/*# sourceMappingURL=data:application/json"));
        assert!(css.ends_with(" */\n"));
    }

    #[test]
    fn test_append_inline_js_roundtrips() {
        let mut js = String::from("var a=1;\n");
        append_inline(&mut js, r#"{"version":3}"#, CommentStyle::Line);

        let encoded = js
            .lines()
            .last()
            .and_then(|line| line.split("base64,").nth(1))
            .unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, br#"{"version":3}"#);
    }

    #[test]
    fn test_comment_style() {
        assert_eq!(CommentStyle::for_extension(Some("js")), CommentStyle::Line);
        assert_eq!(CommentStyle::for_extension(Some("css")), CommentStyle::Block);
    }
}
