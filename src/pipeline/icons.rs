//! Symbol sprite assembly.
//!
//! Every icon becomes a `<symbol>` inside one hidden `<svg>`, so pages can
//! reference it with `<use href="symbol-defs.svg#icon-home">`.

use std::io::Cursor;

use anyhow::{Context, Result, bail};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const HIDDEN_STYLE: &str = "position:absolute;width:0;height:0;overflow:hidden";

/// One icon ready to become a symbol.
#[derive(Debug, Clone)]
pub struct Icon<'a> {
    pub id: String,
    pub svg: &'a str,
}

/// Assemble icons (in the given order) into a sprite document.
pub fn build_sprite(icons: &[Icon<'_>]) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    root.push_attribute(("xmlns:xlink", XLINK_NS));
    root.push_attribute(("aria-hidden", "true"));
    root.push_attribute(("style", HIDDEN_STYLE));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("defs")))?;

    for icon in icons {
        write_symbol(&mut writer, icon).with_context(|| format!("icon `{}`", icon.id))?;
    }

    writer.write_event(Event::End(BytesEnd::new("defs")))?;
    writer.write_event(Event::End(BytesEnd::new("svg")))?;

    String::from_utf8(writer.into_inner().into_inner()).context("sprite is not valid UTF-8")
}

/// Copy an icon's root children into a `<symbol>` carrying its id and viewBox.
fn write_symbol<W: std::io::Write>(writer: &mut Writer<W>, icon: &Icon<'_>) -> Result<()> {
    let mut reader = Reader::from_str(icon.svg);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    loop {
        let event = reader.read_event().context("malformed SVG")?;
        match event {
            Event::Start(e) if depth == 0 => {
                writer.write_event(Event::Start(symbol_start(&e, &icon.id)?))?;
                depth = 1;
            }
            Event::Empty(e) if depth == 0 => {
                writer.write_event(Event::Start(symbol_start(&e, &icon.id)?))?;
                writer.write_event(Event::End(BytesEnd::new("symbol")))?;
                return Ok(());
            }
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(_) if depth == 1 => {
                writer.write_event(Event::End(BytesEnd::new("symbol")))?;
                return Ok(());
            }
            Event::End(e) => {
                depth -= 1;
                writer.write_event(Event::End(e))?;
            }
            // Prolog and annotations never reach the sprite
            Event::Decl(_) | Event::DocType(_) | Event::PI(_) | Event::Comment(_) => {}
            Event::Eof => bail!("unexpected end of document"),
            // Stray text before the root element
            _ if depth == 0 => {}
            other => writer.write_event(other)?,
        }
    }
}

/// Build `<symbol id=.. viewBox=..>` from an icon's root element.
fn symbol_start(root: &BytesStart<'_>, id: &str) -> Result<BytesStart<'static>> {
    if root.local_name().as_ref() != b"svg" {
        bail!("root element is not <svg>");
    }

    let mut view_box = None;
    let mut width = None;
    let mut height = None;
    for attr in root.attributes() {
        let attr = attr.context("malformed attribute")?;
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"viewBox" => view_box = Some(value),
            b"width" => width = Some(value),
            b"height" => height = Some(value),
            _ => {}
        }
    }

    let view_box = view_box.or_else(|| {
        let (w, h) = (parse_length(width.as_deref()?)?, parse_length(height.as_deref()?)?);
        Some(format!("0 0 {w} {h}"))
    });

    let mut symbol = BytesStart::new("symbol");
    symbol.push_attribute(("id", id));
    if let Some(view_box) = view_box {
        symbol.push_attribute(("viewBox", view_box.as_str()));
    }
    Ok(symbol)
}

/// Numeric part of a length such as `24`, `24px` or `1.5`.
fn parse_length(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches("px").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- Generator: Sketch -->
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 32 32" width="32" height="32">
  <title>home</title>
  <path d="M16 2 L30 16 H26 V30 H6 V16 H2 Z"/>
</svg>"#;

    const USER: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24px" height="24px"><g id="head"><circle cx="12" cy="8" r="4"/></g></svg>"#;

    #[test]
    fn test_build_sprite_symbols() {
        let icons = [
            Icon { id: "icon-home".into(), svg: HOME },
            Icon { id: "icon-user".into(), svg: USER },
        ];
        let sprite = build_sprite(&icons).unwrap();

        assert!(sprite.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(sprite.contains("<defs><symbol id=\"icon-home\" viewBox=\"0 0 32 32\">"));
        assert!(sprite.contains("<symbol id=\"icon-user\" viewBox=\"0 0 24 24\">"));
        assert_eq!(sprite.matches("<symbol").count(), 2);
        // Prolog and comments are dropped, nested ids survive
        assert!(!sprite.contains("<?xml"));
        assert!(!sprite.contains("Sketch"));
        assert!(sprite.contains("<g id=\"head\">"));
        assert!(sprite.ends_with("</defs></svg>"));
    }

    #[test]
    fn test_empty_root_becomes_empty_symbol() {
        let icons = [Icon { id: "icon-blank".into(), svg: r#"<svg viewBox="0 0 1 1"/>"# }];
        let sprite = build_sprite(&icons).unwrap();
        assert!(sprite.contains("<symbol id=\"icon-blank\" viewBox=\"0 0 1 1\"></symbol>"));
    }

    #[test]
    fn test_non_svg_root_rejected() {
        let icons = [Icon { id: "icon-x".into(), svg: "<html></html>" }];
        assert!(build_sprite(&icons).is_err());
    }

    #[test]
    fn test_truncated_document_rejected() {
        let icons = [Icon { id: "icon-x".into(), svg: "<svg><g>" }];
        assert!(build_sprite(&icons).is_err());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("24px"), Some(24.0));
        assert_eq!(parse_length(" 1.5 "), Some(1.5));
        assert_eq!(parse_length("100%"), None);
    }
}
