//! SVG cleanup pass.
//!
//! Removes markup browsers never render (comments, XML prolog, processing
//! instructions, `<metadata>`) plus whatever the options ask for.

use std::io::Cursor;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use rustc_hash::FxHashSet;

/// Optional removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgoOptions {
    pub remove_title: bool,
    pub remove_view_box: bool,
    /// Drop `id` attributes nothing references as `#id`.
    pub cleanup_ids: bool,
}

/// Optimize an SVG document.
pub fn optimize(svg: &str, options: SvgoOptions) -> Result<String> {
    let referenced = if options.cleanup_ids {
        collect_references(svg)?
    } else {
        FxHashSet::default()
    };

    let mut reader = Reader::from_str(svg);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    // Depth inside an element being dropped along with its children
    let mut skipping = 0usize;
    loop {
        let event = reader.read_event().context("malformed SVG")?;
        if skipping > 0 {
            match event {
                Event::Start(_) => skipping += 1,
                Event::End(_) => skipping -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) if drops_element(&e, options) => skipping = 1,
            Event::Empty(e) if drops_element(&e, options) => {}
            Event::Start(e) => {
                writer.write_event(Event::Start(filter_attributes(&e, options, &referenced)?))?;
            }
            Event::Empty(e) => {
                writer.write_event(Event::Empty(filter_attributes(&e, options, &referenced)?))?;
            }
            Event::Comment(_) | Event::Decl(_) | Event::DocType(_) | Event::PI(_) => {}
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner().into_inner()).context("output is not valid UTF-8")
}

fn drops_element(e: &BytesStart<'_>, options: SvgoOptions) -> bool {
    match e.local_name().as_ref() {
        b"metadata" => true,
        b"title" => options.remove_title,
        _ => false,
    }
}

/// Copy an element, leaving out removed attributes.
fn filter_attributes(
    e: &BytesStart<'_>,
    options: SvgoOptions,
    referenced: &FxHashSet<String>,
) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);

    for attr in e.attributes() {
        let attr = attr.context("malformed attribute")?;
        let keep = match attr.key.as_ref() {
            b"viewBox" => !options.remove_view_box,
            b"id" if options.cleanup_ids => {
                referenced.contains(String::from_utf8_lossy(&attr.value).as_ref())
            }
            _ => true,
        };
        if keep {
            // Values stay escaped exactly as read
            out.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    Ok(out)
}

/// Every id referenced as `#id` from attributes (`href`, `url(#id)`) or text.
fn collect_references(svg: &str) -> Result<FxHashSet<String>> {
    let mut reader = Reader::from_str(svg);
    let mut referenced = FxHashSet::default();

    loop {
        match reader.read_event().context("malformed SVG")? {
            Event::Start(e) | Event::Empty(e) => {
                for attr in e.attributes() {
                    let attr = attr.context("malformed attribute")?;
                    if attr.key.as_ref() != b"id" {
                        extend_references(&mut referenced, &String::from_utf8_lossy(&attr.value));
                    }
                }
            }
            Event::Text(text) => {
                extend_references(&mut referenced, &String::from_utf8_lossy(&text));
            }
            Event::CData(data) => {
                extend_references(&mut referenced, &String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(referenced)
}

fn extend_references(referenced: &mut FxHashSet<String>, text: &str) {
    let is_id_char = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':');
    for (pos, _) in text.match_indices('#') {
        let id: String = text[pos + 1..].chars().take_while(|&c| is_id_char(c)).collect();
        if !id.is_empty() {
            referenced.insert(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: SvgoOptions = SvgoOptions {
        remove_title: true,
        remove_view_box: false,
        cleanup_ids: false,
    };

    const SPRITE: &str = r##"<?xml version="1.0"?><!DOCTYPE svg><svg xmlns="http://www.w3.org/2000/svg"><metadata><rdf/></metadata><defs><symbol id="icon-home" viewBox="0 0 32 32"><title>home</title><linearGradient id="grad"/><path fill="url(#grad)" d="M0 0h32v32z"/></symbol></defs></svg>"##;

    #[test]
    fn test_default_options() {
        let out = optimize(SPRITE, DEFAULTS).unwrap();
        assert!(!out.contains("<?xml"));
        assert!(!out.contains("DOCTYPE"));
        assert!(!out.contains("metadata"));
        assert!(!out.contains("<title"));
        assert!(out.contains("viewBox=\"0 0 32 32\""));
        assert!(out.contains("id=\"icon-home\""));
        assert!(out.contains("fill=\"url(#grad)\""));
    }

    #[test]
    fn test_keep_title() {
        let options = SvgoOptions {
            remove_title: false,
            ..DEFAULTS
        };
        let out = optimize(SPRITE, options).unwrap();
        assert!(out.contains("<title>home</title>"));
    }

    #[test]
    fn test_remove_view_box() {
        let options = SvgoOptions {
            remove_view_box: true,
            ..DEFAULTS
        };
        let out = optimize(SPRITE, options).unwrap();
        assert!(!out.contains("viewBox"));
    }

    #[test]
    fn test_cleanup_ids_keeps_referenced() {
        let options = SvgoOptions {
            cleanup_ids: true,
            ..DEFAULTS
        };
        let out = optimize(SPRITE, options).unwrap();
        assert!(out.contains("id=\"grad\""));
        assert!(!out.contains("id=\"icon-home\""));
    }

    #[test]
    fn test_extend_references() {
        let mut refs = FxHashSet::default();
        extend_references(&mut refs, "url(#a-1) #b; color: #fff");
        assert!(refs.contains("a-1"));
        assert!(refs.contains("b"));
    }

    #[test]
    fn test_malformed_svg_rejected() {
        assert!(optimize("<svg><g></svg>", DEFAULTS).is_err());
    }
}
