//! Stylesheet stages: Sass compilation, minification and vendor prefixes.
//!
//! Uses grass for Sass and lightningcss for everything after it.

use std::path::Path;

use grass::{Options, OutputStyle};
use lightningcss::rules::CssRuleList;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

/// Sass partials are only compiled through the files importing them.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'))
}

/// Compile Sass to plain CSS.
///
/// Imports resolve relative to the file's own directory.
pub fn compile_sass(source: &str, path: &Path) -> Result<String, String> {
    let mut options = Options::default().style(OutputStyle::Expanded);
    if let Some(dir) = path.parent() {
        options = options.load_path(dir);
    }
    grass::from_string(source.to_owned(), &options).map_err(|err| err.to_string())
}

/// Minify CSS, returning the code and its source map.
///
/// With `restructure` off the rules are printed compactly but never merged or
/// reordered, so hand-written cascade order survives.
pub fn minify_css(
    css: &str,
    filename: &str,
    restructure: bool,
) -> Result<(String, Option<String>), String> {
    let mut sheet = StyleSheet::parse(css, parser_options(filename)).map_err(|e| e.to_string())?;
    if restructure {
        sheet
            .minify(MinifyOptions::default())
            .map_err(|e| e.to_string())?;
    }
    let (code, mut map) = print_minified(&sheet, filename, Targets::default())?;
    Ok((code, map.to_json(None).ok()))
}

/// Add vendor prefixes for `browsers`, returning the CSS and its source map.
///
/// lightningcss only prefixes while minifying, and minifying a whole sheet
/// merges rules. Without `restructure` each top-level rule is minified on
/// its own and printed on its own line.
pub fn autoprefix(
    css: &str,
    filename: &str,
    browsers: Option<Browsers>,
    restructure: bool,
) -> Result<(String, Option<String>), String> {
    let targets = Targets {
        browsers,
        ..Targets::default()
    };
    let prefix_only = || MinifyOptions {
        targets,
        ..MinifyOptions::default()
    };

    let mut sheet = StyleSheet::parse(css, parser_options(filename)).map_err(|e| e.to_string())?;
    if restructure {
        sheet.minify(prefix_only()).map_err(|e| e.to_string())?;
        let (code, mut map) = print_minified(&sheet, filename, targets)?;
        return Ok((code, map.to_json(None).ok()));
    }

    let mut code = String::with_capacity(css.len());
    let mut map = SourceMap::new("/");
    map.add_source(filename);
    let mut line = 0;
    for rule in std::mem::take(&mut sheet.rules.0) {
        let mut single = StyleSheet::new(
            sheet.sources.clone(),
            CssRuleList(vec![rule]),
            parser_options(filename),
        );
        single.minify(prefix_only()).map_err(|e| e.to_string())?;
        let (chunk, mut chunk_map) = print_minified(&single, filename, targets)?;
        if chunk.is_empty() {
            continue;
        }
        if !code.is_empty() {
            code.push('\n');
            line += 1;
        }
        map.add_sourcemap(&mut chunk_map, line)
            .map_err(|e| e.to_string())?;
        line += chunk.matches('\n').count() as i64;
        code.push_str(&chunk);
    }

    Ok((code, map.to_json(None).ok()))
}

/// Print `sheet` minified, recording positions into a fresh map.
fn print_minified(
    sheet: &StyleSheet<'_>,
    filename: &str,
    targets: Targets,
) -> Result<(String, SourceMap), String> {
    let mut map = SourceMap::new("/");
    map.add_source(filename);
    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: Some(&mut map),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok((result.code, map))
}

fn parser_options<'i>(filename: &str) -> ParserOptions<'i> {
    ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn default_browsers() -> Option<Browsers> {
        Browsers::from_browserslist(["last 2 versions", "iOS 7"]).unwrap()
    }

    #[test]
    fn test_is_partial() {
        assert!(is_partial(Path::new("assets/scss/_reset.scss")));
        assert!(!is_partial(Path::new("assets/scss/main.scss")));
    }

    #[test]
    fn test_compile_sass_nesting_and_variables() {
        let css = compile_sass(
            "$pad: 4px;\n.card { padding: $pad; .title { margin: 0; } }",
            Path::new("main.scss"),
        )
        .unwrap();
        assert!(css.contains(".card .title"));
        assert!(css.contains("padding: 4px"));
    }

    #[test]
    fn test_compile_sass_resolves_partials() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("_colors.scss"), "$brand: #ff0000;").unwrap();
        let main = temp.path().join("main.scss");

        let css = compile_sass("@import 'colors';\na { color: $brand; }", &main).unwrap();
        assert!(css.contains("#ff0000") || css.contains("red"));
    }

    #[test]
    fn test_compile_sass_reports_error() {
        let err = compile_sass("a { color: red", Path::new("main.scss")).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_minify_keeps_rule_order_without_restructure() {
        let css = ".a { color: red; }\n.b { color: blue; }\n.a { margin: 0; }\n";
        let (out, map) = minify_css(css, "main.css", false).unwrap();
        assert_eq!(out.matches(".a{").count(), 2);
        assert!(!out.contains('\n'));
        assert!(map.is_some());
    }

    #[test]
    fn test_autoprefix_adds_webkit_prefix() {
        let css = ".box{display:flex;user-select:none}";
        let (out, map) = autoprefix(css, "main.css", default_browsers(), false).unwrap();
        assert!(out.contains("-webkit-"));
        assert!(map.is_some());
    }

    #[test]
    fn test_autoprefix_never_merges_without_restructure() {
        let css = ".a{color:red}.a{margin:0}.b{color:red}";
        let (out, _) = autoprefix(css, "main.css", default_browsers(), false).unwrap();
        assert_eq!(out, ".a{color:red}\n.a{margin:0}\n.b{color:red}");
    }

    #[test]
    fn test_autoprefix_merges_with_restructure() {
        let css = ".a{color:red}.a{margin:0}";
        let (out, _) = autoprefix(css, "main.css", default_browsers(), true).unwrap();
        assert_eq!(out.matches(".a{").count(), 1);
    }

    #[test]
    fn test_autoprefix_maps_each_rule_line() {
        let css = ".a{color:red}\n\n.b{display:flex}\n";
        let (out, map) = autoprefix(css, "main.css", default_browsers(), false).unwrap();
        assert_eq!(out.lines().count(), 2);

        let mut map = SourceMap::from_json("/", &map.unwrap()).unwrap();
        let second = map.find_closest_mapping(1, 0).and_then(|m| m.original).unwrap();
        assert_eq!(second.original_line, 2);
    }

    #[test]
    fn test_autoprefix_rejects_invalid_css() {
        let css = ".a{color:red} !!!{color:blue}";
        assert!(autoprefix(css, "main.css", default_browsers(), false).is_err());
    }
}
